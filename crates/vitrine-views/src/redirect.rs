use vitrine_http::{Request, Response};

/// Turns server redirects into htmx client redirects.
///
/// An htmx client follows a `302` transparently and swaps the target page into
/// the current fragment. Answering `200` with `HX-Redirect` makes it navigate
/// instead. Everything else passes through untouched.
///
/// # Examples
///
/// ```
/// use vitrine_http::{Request, Response};
/// use vitrine_views::RedirectAdapter;
///
/// let request = Request::builder().uri("/cart/").htmx(false).build().unwrap();
/// let response = RedirectAdapter::new().adapt(&request, Response::see_other("/checkout/"));
///
/// assert_eq!(response.client_redirect_target(), Some("/checkout/"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RedirectAdapter {
	redirect_url: Option<String>,
}

impl RedirectAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Send htmx clients to `url` instead of the redirect's own target.
	pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
		self.redirect_url = Some(url.into());
		self
	}

	pub fn adapt(&self, request: &Request, response: Response) -> Response {
		if !request.is_htmx() || !response.is_redirect() {
			return response;
		}

		let target = match (&self.redirect_url, response.location()) {
			(Some(url), _) => url.clone(),
			(None, Some(location)) => location.to_string(),
			(None, None) => return response,
		};
		tracing::debug!(path = %request.path(), location = %target, "converted redirect to client redirect");
		Response::client_redirect(target)
	}

	/// [`adapt`](Self::adapt) the success value of a handler result; errors pass
	/// through.
	pub fn adapt_result<E>(
		&self,
		request: &Request,
		result: Result<Response, E>,
	) -> Result<Response, E> {
		result.map(|response| self.adapt(request, response))
	}
}
