//! # Vitrine Forms
//!
//! Composite forms: several independent sub-forms presented, validated and saved as
//! one unit.
//!
//! ## Features
//!
//! - **Namespacing**: every member reads only the fields under its own prefix
//!   (`user-first_name`, `profile-gender`)
//! - **Aggregated validation**: every member is validated, then cross-form clean
//!   hooks run; their errors land under [`ALL_FIELDS_KEY`]
//! - **Atomic saves**: member entities are committed in declaration order inside one
//!   [`Atomic`] scope, with declared relations wired on the way
//! - **Deferred writes**: many-to-many work comes back as a [`SaveFinisher`]
//!
//! ## Example
//!
//! ```
//! use vitrine_forms::{
//!     CompositeFormConfig, CompositeInput, FieldSpec, InMemoryStore, Record, RecordSchema,
//! };
//! use serde_json::json;
//!
//! let config = CompositeFormConfig::<Record>::new("PersonalInfoForm")
//!     .member("user", RecordSchema::new("user").field(FieldSpec::char("first_name")).factory())
//!     .member("profile", RecordSchema::new("profile").field(FieldSpec::char("gender")).factory())
//!     .relate("profile", "user_id", "user");
//!
//! let data = [
//!     ("user-first_name".to_string(), json!("Ana")),
//!     ("profile-gender".to_string(), json!("F")),
//! ];
//! let mut form = config.bind(CompositeInput::bound(data.into_iter().collect())).unwrap();
//! assert!(form.is_valid());
//!
//! let store = InMemoryStore::new();
//! let saved = form.save(&store).unwrap().finish().unwrap();
//! assert_eq!(saved["profile"].get("user_id"), Some(&json!(saved["user"].pk().unwrap())));
//! ```

pub mod composite;
pub mod error;
pub mod persistence;
pub mod prefix;
pub mod record;
pub mod record_form;
pub mod sub_form;
pub mod validation;

pub use composite::{
	CompositeForm, CompositeFormConfig, CompositeInput, Relation, SaveFinisher, SavedForms,
	SubFormEntry,
};
pub use error::{FormError, FormResult};
pub use persistence::{
	Atomic, Entity, EntityStore, InMemoryStore, MemoryScope, PersistenceError, Tables,
};
pub use prefix::{NESTED_SEPARATOR, PREFIX_SEPARATOR, Prefix};
pub use record::Record;
pub use record_form::{FieldKind, FieldSpec, RecordForm, RecordSchema};
pub use sub_form::{
	FileData, Finisher, FormBinding, FormData, SubForm, SubFormSave, UploadedFile, form_data,
};
pub use validation::{ALL_FIELDS_KEY, CleanedData, ErrorMap, Validation, ValidationError};
