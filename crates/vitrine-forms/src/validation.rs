use crate::sub_form::FormData;
use indexmap::IndexMap;

/// Key for errors that belong to no single field.
///
/// A composite files its cross-form errors here; a sub-form's own non-field errors
/// appear as `<prefix>-_all`.
pub const ALL_FIELDS_KEY: &str = "_all";

/// Field name to error messages, in field order.
pub type ErrorMap = IndexMap<String, Vec<String>>;

/// Cleaned data of every member, keyed by member key in declaration order.
pub type CleanedData = IndexMap<String, FormData>;

/// Failure raised by a cross-form clean hook.
///
/// It is never attached to a field: the composite files its messages under
/// [`ALL_FIELDS_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationError {
	messages: Vec<String>,
}

impl ValidationError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			messages: vec![message.into()],
		}
	}

	pub fn with_messages(messages: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			messages: messages.into_iter().map(Into::into).collect(),
		}
	}

	pub fn messages(&self) -> &[String] {
		&self.messages
	}

	pub fn into_messages(self) -> Vec<String> {
		self.messages
	}
}

impl From<&str> for ValidationError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

impl From<String> for ValidationError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

/// Outcome of validating a composite form.
///
/// Produced once per [`CompositeForm::validate`](crate::CompositeForm::validate) call
/// and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
	pub(crate) errors: ErrorMap,
	pub(crate) crossform_errors: Vec<String>,
	pub(crate) cleaned_data: CleanedData,
	pub(crate) invalid_members: Vec<String>,
}

impl Validation {
	pub fn is_valid(&self) -> bool {
		self.invalid_members.is_empty() && self.crossform_errors.is_empty()
	}

	/// Errors keyed by prefixed field name, plus [`ALL_FIELDS_KEY`] for cross-form errors.
	pub fn errors(&self) -> &ErrorMap {
		&self.errors
	}

	pub fn field_errors(&self, prefixed_name: &str) -> &[String] {
		self.errors
			.get(prefixed_name)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	pub fn crossform_errors(&self) -> &[String] {
		&self.crossform_errors
	}

	/// Cleaned data of every member; only available when the whole composite is valid.
	pub fn cleaned_data(&self) -> Option<&CleanedData> {
		self.is_valid().then_some(&self.cleaned_data)
	}

	/// Cleaned data of the members that validated on their own, whatever the outcome.
	pub fn partial_cleaned_data(&self) -> &CleanedData {
		&self.cleaned_data
	}

	/// Keys of the members that reported themselves invalid, in declaration order.
	pub fn invalid_members(&self) -> &[String] {
		&self.invalid_members
	}
}
