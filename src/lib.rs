//! # Vitrine
//!
//! Building blocks for server-rendered shops that answer both full-page browser
//! requests and htmx fragment requests.
//!
//! ## Feature Flags
//!
//! - `forms` - Composite forms: prefixed sub-forms, aggregated validation, atomic saves
//! - `views` - Request mode routing, htmx client redirects, search and navigation helpers
//! - `full` (default) - Everything above
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "full")]
//! # {
//! use vitrine::prelude::*;
//!
//! let router = PartialRouter::builder("AccountView")
//!     .param("tab")
//!     .route("orders", "account/_orders.html")
//!     .default_route("orders")
//!     .build()
//!     .unwrap();
//!
//! let request = Request::builder().uri("/account/").htmx(false).build().unwrap();
//! let resolution = router.resolve(&request).unwrap();
//! assert_eq!(resolution.template_names(&["account/index.html"]), vec!["account/_orders.html"]);
//! # }
//! ```

#[cfg(feature = "forms")]
pub mod forms;
pub mod http;
#[cfg(feature = "views")]
pub mod views;

pub use vitrine_http::{Error, Request, Response, Result};

#[cfg(feature = "forms")]
pub use vitrine_forms::{
	CompositeForm, CompositeFormConfig, CompositeInput, FormError, FormResult, InMemoryStore,
	Record, RecordSchema, SubForm,
};

#[cfg(feature = "views")]
pub use vitrine_views::{PartialRouter, RedirectAdapter, RequestMode, ViewError, ViewResult};

/// Everything a typical handler needs.
pub mod prelude {
	pub use vitrine_http::{Method, Request, RequestBuilder, Response};

	#[cfg(feature = "forms")]
	pub use vitrine_forms::{
		ALL_FIELDS_KEY, Atomic, CompositeForm, CompositeFormConfig, CompositeInput, Entity,
		EntityStore, FieldSpec, FormBinding, FormData, FormError, FormResult, InMemoryStore,
		Record, RecordSchema, SavedForms, SubForm, SubFormSave, Validation, ValidationError,
	};

	#[cfg(feature = "views")]
	pub use vitrine_views::{
		Context, HTMX_KEY, PartialRouter, RedirectAdapter, RequestMode, RouteOutcome,
		RouterSettings, SearchQuery, TemplateSpec, ViewError, ViewResult, active_class,
	};
}
