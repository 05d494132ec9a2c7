use crate::persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
	/// The composite (or one of its sub-forms) was declared incorrectly.
	#[error("Improperly configured form: {0}")]
	Configuration(String),
	#[error("Form must be validated successfully before it can be saved")]
	NotValidated,
	#[error("Field error in {field}: {message}")]
	Field { field: String, message: String },
	#[error("Validation error: {0}")]
	Validation(String),
	#[error(transparent)]
	Persistence(#[from] PersistenceError),
}

pub type FormResult<T> = Result<T, FormError>;
