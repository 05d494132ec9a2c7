use crate::error::{Error, Result};
use crate::{HX_BOOSTED, HX_REQUEST};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri};

/// Incoming HTTP request as seen by view and form code.
///
/// Query parameters and submitted form parameters are kept in arrival order and
/// already URL-decoded. Lookups return the last value for a repeated key.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub headers: HeaderMap,
	query_params: Vec<(String, String)>,
	form_params: Vec<(String, String)>,
	view_name: Option<String>,
}

impl Request {
	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/orders/?page=2&q=shoes")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/orders/");
	/// assert_eq!(request.query_param("q"), Some("shoes"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Last value of a query string parameter
	pub fn query_param(&self, name: &str) -> Option<&str> {
		last_value(&self.query_params, name)
	}

	pub fn query_params(&self) -> &[(String, String)] {
		&self.query_params
	}

	/// Last value of a submitted form parameter
	pub fn form_param(&self, name: &str) -> Option<&str> {
		last_value(&self.form_params, name)
	}

	pub fn form_params(&self) -> &[(String, String)] {
		&self.form_params
	}

	/// Returns true when the request was issued by htmx (`HX-Request: true`).
	///
	/// Such a client can swap a fragment into the current page instead of
	/// loading a full document.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/")
	///     .header("HX-Request", "true")
	///     .build()
	///     .unwrap();
	/// assert!(request.is_htmx());
	/// assert!(!request.is_boosted());
	/// ```
	pub fn is_htmx(&self) -> bool {
		self.header_is_true(HX_REQUEST)
	}

	/// Returns true for a boosted htmx navigation (`HX-Boosted: true`).
	///
	/// A boosted request replaces the whole page, so it is only meaningful together
	/// with `HX-Request`.
	pub fn is_boosted(&self) -> bool {
		self.is_htmx() && self.header_is_true(HX_BOOSTED)
	}

	/// Name of the view that matched this request, if the URL resolver recorded one.
	pub fn view_name(&self) -> Option<&str> {
		self.view_name.as_deref()
	}

	pub fn set_view_name(&mut self, name: impl Into<String>) {
		self.view_name = Some(name.into());
	}

	fn header_is_true(&self, name: &str) -> bool {
		self.headers
			.get(name)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
	}
}

fn last_value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
	params
		.iter()
		.rev()
		.find(|(key, _)| key == name)
		.map(|(_, value)| value.as_str())
}

fn parse_urlencoded(input: &str) -> Result<Vec<(String, String)>> {
	serde_urlencoded::from_str(input).map_err(|e| Error::InvalidForm(e.to_string()))
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	headers: HeaderMap,
	header_errors: Vec<Error>,
	form_params: Vec<(String, String)>,
	form_body: Option<String>,
	view_name: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Add a single header. Invalid names or values surface from [`RequestBuilder::build`].
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);
			}
			(Err(e), _) => self.header_errors.push(Error::InvalidHeader {
				name: name.to_string(),
				reason: e.to_string(),
			}),
			(_, Err(e)) => self.header_errors.push(Error::InvalidHeader {
				name: name.to_string(),
				reason: e.to_string(),
			}),
		}
		self
	}

	/// Mark the request as coming from htmx, optionally boosted.
	pub fn htmx(self, boosted: bool) -> Self {
		let builder = self.header(HX_REQUEST, "true");
		if boosted {
			builder.header(HX_BOOSTED, "true")
		} else {
			builder
		}
	}

	/// Add a submitted form parameter
	pub fn form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.form_params.push((name.into(), value.into()));
		self
	}

	/// Use an `application/x-www-form-urlencoded` body as submitted data.
	pub fn form_body(mut self, body: impl Into<String>) -> Self {
		self.form_body = Some(body.into());
		self
	}

	pub fn view_name(mut self, name: impl Into<String>) -> Self {
		self.view_name = Some(name.into());
		self
	}

	pub fn build(mut self) -> Result<Request> {
		if let Some(error) = self.header_errors.into_iter().next() {
			return Err(error);
		}

		let uri: Uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse::<Uri>()
			.map_err(|e| Error::InvalidUri(e.to_string()))?;

		let query_params = match uri.query() {
			Some(query) => parse_urlencoded(query)?,
			None => Vec::new(),
		};

		let mut form_params = match self.form_body.as_deref() {
			Some(body) => parse_urlencoded(body)?,
			None => Vec::new(),
		};
		form_params.append(&mut self.form_params);

		Ok(Request {
			method: self.method.unwrap_or(Method::GET),
			uri,
			headers: self.headers,
			query_params,
			form_params,
			view_name: self.view_name,
		})
	}
}
