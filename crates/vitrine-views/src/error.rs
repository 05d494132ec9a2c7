use vitrine_http::Response;

/// Errors raised while resolving what a view should render.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
	/// The view was declared incorrectly. Never the client's fault.
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Invalid router settings: {0}")]
	Settings(#[from] toml::de::Error),
	#[error("Failed to encode query string: {0}")]
	QueryString(#[from] serde_urlencoded::ser::Error),
	#[error(transparent)]
	Http(#[from] vitrine_http::Error),
}

pub type ViewResult<T> = Result<T, ViewError>;

impl From<ViewError> for vitrine_http::Error {
	fn from(error: ViewError) -> Self {
		match error {
			ViewError::NotFound(message) => vitrine_http::Error::NotFound(message),
			ViewError::Http(inner) => inner,
			other => vitrine_http::Error::ImproperlyConfigured(other.to_string()),
		}
	}
}

impl From<ViewError> for Response {
	fn from(error: ViewError) -> Self {
		if !matches!(error, ViewError::NotFound(_)) {
			tracing::error!(error = %error, "view failed to resolve");
		}
		Response::from(vitrine_http::Error::from(error))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	#[rstest]
	#[case(ViewError::NotFound("Unknown route 'z'".to_string()), StatusCode::NOT_FOUND)]
	#[case(ViewError::ImproperlyConfigured("no template".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
	#[case(
		ViewError::Http(vitrine_http::Error::InvalidForm("bad".to_string())),
		StatusCode::BAD_REQUEST
	)]
	fn test_error_status(#[case] error: ViewError, #[case] expected: StatusCode) {
		assert_eq!(Response::from(error).status, expected);
	}

	#[test]
	fn test_configuration_details_stay_on_the_server() {
		let response = Response::from(ViewError::ImproperlyConfigured(
			"OrderListView: route table needs a parameter name".to_string(),
		));

		let body = String::from_utf8(response.body.to_vec()).unwrap();
		assert!(!body.contains("OrderListView"));
	}
}
