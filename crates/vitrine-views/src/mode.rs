use serde::Serialize;
use vitrine_http::Request;

/// How the client wants the response rendered.
///
/// | `HX-Request` | `HX-Boosted` | mode             |
/// |--------------|--------------|------------------|
/// | absent       | any          | `Full`           |
/// | `true`       | absent       | `Partial`        |
/// | `true`       | `true`       | `PartialBoosted` |
///
/// A boosted request swaps the whole body, so it is rendered like `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
	Full,
	PartialBoosted,
	Partial,
}

impl RequestMode {
	pub fn from_flags(is_htmx: bool, is_boosted: bool) -> Self {
		match (is_htmx, is_boosted) {
			(true, false) => RequestMode::Partial,
			(true, true) => RequestMode::PartialBoosted,
			(false, _) => RequestMode::Full,
		}
	}

	/// # Examples
	///
	/// ```
	/// use vitrine_http::Request;
	/// use vitrine_views::RequestMode;
	///
	/// let request = Request::builder().uri("/").htmx(false).build().unwrap();
	/// assert_eq!(RequestMode::from_request(&request), RequestMode::Partial);
	///
	/// let boosted = Request::builder().uri("/").htmx(true).build().unwrap();
	/// assert_eq!(RequestMode::from_request(&boosted), RequestMode::PartialBoosted);
	/// ```
	pub fn from_request(request: &Request) -> Self {
		Self::from_flags(request.is_htmx(), request.is_boosted())
	}

	/// Only a non-boosted fragment request takes the partial path.
	pub fn is_partial(self) -> bool {
		self == RequestMode::Partial
	}
}
