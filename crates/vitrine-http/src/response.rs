use crate::HX_REDIRECT;
use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Create a Response with HTTP 301 Moved Permanently
	pub fn permanent_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::MOVED_PERMANENTLY).with_location(location.as_ref())
	}

	/// Create a Response with HTTP 302 Found (temporary redirect)
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::temporary_redirect("/accounts/address/");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.location(), Some("/accounts/address/"));
	/// assert!(response.is_redirect());
	/// ```
	pub fn temporary_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_location(location.as_ref())
	}

	/// Create a Response with HTTP 303 See Other, the usual answer to a POST
	pub fn see_other(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::SEE_OTHER).with_location(location.as_ref())
	}

	/// Create a client-side redirect for htmx.
	///
	/// The status stays `200 OK` so htmx processes the response, and the target is
	/// carried by the `HX-Redirect` header. The client then performs a full
	/// navigation to the target.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::client_redirect("/accounts/");
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert_eq!(response.client_redirect_target(), Some("/accounts/"));
	/// assert!(!response.is_redirect());
	/// ```
	pub fn client_redirect(location: impl AsRef<str>) -> Self {
		Self::ok().with_header(HX_REDIRECT, location.as_ref())
	}

	/// Create an HTML response
	pub fn html(body: impl Into<String>) -> Self {
		let mut response = Self::ok().with_body(body.into());
		response.headers.insert(
			CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		);
		response
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response. Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Add a Location header to the response (typically used for redirects)
	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(LOCATION, value);
		}
		self
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self, serde_json::Error> {
		self.body = Bytes::from(serde_json::to_vec(data)?);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	/// Value of the `Location` header, if it is valid UTF-8
	pub fn location(&self) -> Option<&str> {
		self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
	}

	/// Returns true for a server-side redirect: a 3xx status carrying a `Location`.
	pub fn is_redirect(&self) -> bool {
		self.status.is_redirection() && self.location().is_some()
	}

	/// Target of an htmx client-side redirect, if this response is one
	pub fn client_redirect_target(&self) -> Option<&str> {
		self.headers.get(HX_REDIRECT).and_then(|v| v.to_str().ok())
	}
}

impl From<crate::Error> for Response {
	fn from(error: crate::Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		// Configuration details are for developers, not for the client.
		let message = if status.is_server_error() {
			"Internal server error".to_string()
		} else {
			error.to_string()
		};
		let body = serde_json::json!({ "error": message });

		Response::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error())
	}
}
