use hyper::StatusCode;

/// Errors raised while building requests or responses.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid URI: {0}")]
	InvalidUri(String),
	#[error("Invalid header {name}: {reason}")]
	InvalidHeader { name: String, reason: String },
	#[error("Invalid form body: {0}")]
	InvalidForm(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// HTTP status code that best describes this error.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_http::Error;
	///
	/// assert_eq!(Error::NotFound("route".to_string()).status_code(), 404);
	/// assert_eq!(Error::InvalidForm("bad".to_string()).status_code(), 400);
	/// ```
	pub fn status_code(&self) -> u16 {
		let status = match self {
			Error::InvalidUri(_) | Error::InvalidHeader { .. } | Error::InvalidForm(_) => {
				StatusCode::BAD_REQUEST
			}
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::ImproperlyConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		status.as_u16()
	}
}
