//! The contract every member of a composite form implements.

use crate::error::FormResult;
use crate::prefix::Prefix;
use crate::validation::{ALL_FIELDS_KEY, ErrorMap};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use vitrine_http::Request;

/// Raw or cleaned form values keyed by field name.
pub type FormData = HashMap<String, serde_json::Value>;

/// Uploaded files keyed by (prefixed) field name.
pub type FileData = HashMap<String, UploadedFile>;

/// A file received with the request. Storing it is someone else's job.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
	pub name: String,
	pub content_type: Option<String>,
	pub content: Bytes,
}

impl UploadedFile {
	pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
		Self {
			name: name.into(),
			content_type: None,
			content: content.into(),
		}
	}

	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}
}

/// Submitted form parameters of a request as form data.
///
/// # Examples
///
/// ```
/// use vitrine_forms::form_data;
/// use vitrine_http::Request;
/// use serde_json::json;
///
/// let request = Request::builder()
///     .uri("/accounts/")
///     .form_body("user-first_name=Ana&profile-gender=F")
///     .build()
///     .unwrap();
///
/// let data = form_data(&request);
/// assert_eq!(data.get("user-first_name"), Some(&json!("Ana")));
/// ```
pub fn form_data(request: &Request) -> FormData {
	request
		.form_params()
		.iter()
		.map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
		.collect()
}

/// Everything a sub-form is constructed from.
///
/// `data` and `files` are the whole request payload, shared between all members.
/// A sub-form must only read the entries namespaced by its own `prefix`.
pub struct FormBinding<E> {
	/// `None` for an unbound form.
	pub data: Option<Arc<FormData>>,
	pub files: Arc<FileData>,
	pub initial: FormData,
	pub prefix: Prefix,
	pub instance: Option<E>,
}

impl<E> FormBinding<E> {
	/// Binding for a standalone form without a prefix.
	pub fn standalone(data: Option<FormData>) -> Self {
		Self {
			data: data.map(Arc::new),
			files: Arc::new(FileData::new()),
			initial: FormData::new(),
			prefix: Prefix::default(),
			instance: None,
		}
	}

	pub fn is_bound(&self) -> bool {
		self.data.is_some()
	}
}

/// Deferred many-to-many write, run against the committed entity.
pub type Finisher<E> = Box<dyn FnOnce(&E) -> FormResult<()> + Send>;

/// Result of asking a sub-form for its entity.
pub struct SubFormSave<E> {
	pub entity: E,
	/// Present when the sub-form has writes that need the committed entity.
	pub finisher: Option<Finisher<E>>,
}

impl<E> SubFormSave<E> {
	pub fn new(entity: E) -> Self {
		Self {
			entity,
			finisher: None,
		}
	}

	pub fn with_finisher<F>(mut self, finisher: F) -> Self
	where
		F: FnOnce(&E) -> FormResult<()> + Send + 'static,
	{
		self.finisher = Some(Box::new(finisher));
		self
	}
}

/// A form that can take part in a [`CompositeForm`](crate::CompositeForm).
///
/// Field names, error keys and cleaned data keys are bare names; the composite adds
/// the prefix when it exposes them.
pub trait SubForm<E>: Send {
	fn prefix(&self) -> &Prefix;

	fn is_bound(&self) -> bool;

	/// Declared field names, in declaration order.
	fn fields(&self) -> Vec<String>;

	/// Validate the bound data. Unbound forms are never valid.
	fn is_valid(&mut self) -> bool;

	/// Errors from the last validation, keyed by bare field name or [`ALL_FIELDS_KEY`].
	fn errors(&self) -> &ErrorMap;

	/// Cleaned values from the last successful validation.
	fn cleaned_data(&self) -> &FormData;

	/// Build the entity from the cleaned data without committing it.
	///
	/// Committing belongs to whoever owns the atomic scope; a sub-form that has
	/// many-to-many writes returns them as a finisher.
	fn save(&mut self) -> FormResult<SubFormSave<E>>;

	/// Called with the committed entity once the owning scope succeeded, so that
	/// a later save updates it instead of inserting again.
	fn committed(&mut self, _entity: &E) {}

	fn non_field_errors(&self) -> Vec<String> {
		self.errors()
			.get(ALL_FIELDS_KEY)
			.cloned()
			.unwrap_or_default()
	}

	/// Whether the form takes file uploads.
	fn is_multipart(&self) -> bool {
		false
	}

	fn has_changed(&self) -> bool {
		false
	}
}
