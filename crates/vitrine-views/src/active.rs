use vitrine_http::Request;

/// Class emitted for the active navigation entry by default.
pub const DEFAULT_ACTIVE_CLASS: &str = "active";

/// CSS class for a navigation entry covering `view_names`.
///
/// Returns `css_class` when the view that handled `request` is one of `view_names`
/// (or starts with one of them, with `prefix_match`), and an empty string
/// otherwise. A request without a resolved view name is never active.
///
/// # Examples
///
/// ```
/// use vitrine_http::Request;
/// use vitrine_views::{DEFAULT_ACTIVE_CLASS, active_class};
///
/// let request = Request::builder()
///     .uri("/accounts/orders/12/")
///     .view_name("accounts:order_detail")
///     .build()
///     .unwrap();
///
/// assert_eq!(active_class(&request, &["accounts:order_list"], DEFAULT_ACTIVE_CLASS, false), "");
/// assert_eq!(active_class(&request, &["accounts:order"], "is-current", true), "is-current");
/// ```
pub fn active_class<'a>(
	request: &Request,
	view_names: &[&str],
	css_class: &'a str,
	prefix_match: bool,
) -> &'a str {
	let Some(current) = request.view_name().filter(|name| !name.is_empty()) else {
		return "";
	};

	let matches = if prefix_match {
		view_names.iter().any(|name| current.starts_with(name))
	} else {
		view_names.contains(&current)
	};

	if matches { css_class } else { "" }
}
