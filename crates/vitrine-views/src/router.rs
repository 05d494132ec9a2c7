//! Template selection for full-page and fragment requests.
//!
//! A view declares the fragment templates it can render for htmx requests, either
//! as one template or as a route table keyed by a request parameter. The router
//! only picks names; rendering belongs to the template engine.

use crate::error::{ViewError, ViewResult};
use crate::mode::RequestMode;
use crate::settings::RouterSettings;
use crate::template::TemplateSpec;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use vitrine_http::Request;

/// Render context contributions, keyed by variable name.
pub type Context = HashMap<String, Value>;

/// Context variable holding the resolved route key.
pub const HTMX_KEY: &str = "htmx_key";

/// Which templates a request should be rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
	/// The view's ordinary full-page templates.
	FullPage,
	/// Templates of a route table entry.
	Routed { key: String, templates: Vec<String> },
	/// The view's single fragment template.
	Single { templates: Vec<String> },
}

impl RouteOutcome {
	/// Fragment templates, or `None` for a full-page render.
	pub fn partial_templates(&self) -> Option<&[String]> {
		match self {
			RouteOutcome::FullPage => None,
			RouteOutcome::Routed { templates, .. } | RouteOutcome::Single { templates } => {
				Some(templates)
			}
		}
	}

	pub fn route_key(&self) -> Option<&str> {
		match self {
			RouteOutcome::Routed { key, .. } => Some(key),
			_ => None,
		}
	}
}

/// Result of [`PartialRouter::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
	pub mode: RequestMode,
	pub outcome: RouteOutcome,
	/// Variables to merge into the render context.
	pub context: Context,
}

impl Resolution {
	/// Candidate names to render: the fragment templates, or `full_page` when the
	/// outcome is a full-page render.
	pub fn template_names(&self, full_page: &[&str]) -> Vec<String> {
		match self.outcome.partial_templates() {
			Some(templates) => templates.to_vec(),
			None => full_page.iter().map(|name| name.to_string()).collect(),
		}
	}
}

/// Validated template routing of one view.
///
/// # Examples
///
/// ```
/// use vitrine_http::Request;
/// use vitrine_views::{PartialRouter, RouteOutcome};
///
/// let router = PartialRouter::builder("OrderListView")
///     .param("tab")
///     .route("open", "orders/_open.html")
///     .route("closed", ["orders/_closed.html", "orders/_list.html"])
///     .default_route("open")
///     .build()
///     .unwrap();
///
/// let request = Request::builder().uri("/orders/?tab=closed").htmx(false).build().unwrap();
/// let resolution = router.resolve(&request).unwrap();
///
/// assert_eq!(resolution.outcome.route_key(), Some("closed"));
/// assert_eq!(
///     resolution.template_names(&["orders/list.html"]),
///     vec!["orders/_closed.html", "orders/_list.html"]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PartialRouter {
	name: String,
	template: Option<TemplateSpec>,
	param: Option<String>,
	routes: Option<IndexMap<String, TemplateSpec>>,
	default_route: Option<String>,
	not_found_on_unknown: bool,
}

impl PartialRouter {
	/// `name` identifies the view in errors and logs.
	pub fn builder(name: impl Into<String>) -> PartialRouterBuilder {
		PartialRouterBuilder {
			name: name.into(),
			template: None,
			param: None,
			routes: None,
			default_route: None,
			not_found_on_unknown: true,
		}
	}

	/// Build a router from deserialized settings, with the same checks as the builder.
	pub fn from_settings(settings: RouterSettings) -> ViewResult<Self> {
		PartialRouterBuilder {
			name: settings.name,
			template: settings.template,
			param: settings.param,
			routes: settings.routes,
			default_route: settings.default_route,
			not_found_on_unknown: settings.not_found_on_unknown,
		}
		.build()
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn param(&self) -> Option<&str> {
		self.param.as_deref()
	}

	pub fn default_route(&self) -> Option<&str> {
		self.default_route.as_deref()
	}

	pub fn has_routes(&self) -> bool {
		self.routes.is_some()
	}

	/// The route key a request asks for: query string first, then submitted data.
	/// Empty values count as absent.
	pub fn route_key<'a>(&self, request: &'a Request) -> Option<&'a str> {
		let param = self.param.as_deref()?;
		request
			.query_param(param)
			.filter(|key| !key.is_empty())
			.or_else(|| request.form_param(param).filter(|key| !key.is_empty()))
	}

	/// Decide what `request` should be rendered with.
	pub fn resolve(&self, request: &Request) -> ViewResult<Resolution> {
		let mode = RequestMode::from_request(request);
		let requested = self.route_key(request);
		let mut context = Context::new();

		if !mode.is_partial() {
			if self.param.is_some() {
				let key = requested.or(self.default_route.as_deref());
				context.insert(HTMX_KEY.to_string(), key.map_or(Value::Null, Value::from));
			}
			return Ok(Resolution {
				mode,
				outcome: RouteOutcome::FullPage,
				context,
			});
		}

		if self.routes.is_none() && self.template.is_none() {
			return Err(self.improperly_configured(
				"fragment request received but neither a route table nor a fragment template is configured"
					.to_string(),
			));
		}

		let outcome = self.resolve_partial(requested)?;
		tracing::debug!(
			view = %self.name,
			requested = ?requested,
			outcome = ?outcome,
			"resolved fragment templates"
		);
		context.insert(
			HTMX_KEY.to_string(),
			outcome.route_key().map_or(Value::Null, Value::from),
		);

		Ok(Resolution {
			mode,
			outcome,
			context,
		})
	}

	fn resolve_partial(&self, requested: Option<&str>) -> ViewResult<RouteOutcome> {
		let Some(routes) = &self.routes else {
			return self.single();
		};

		match requested {
			Some(key) => match routes.get(key) {
				Some(spec) => self.routed(key, spec),
				None if self.not_found_on_unknown => Err(ViewError::NotFound(format!(
					"Unknown route '{}' for {}",
					key, self.name
				))),
				None => self.fallback(routes, key),
			},
			None => match &self.default_route {
				Some(default) => {
					let spec = routes.get(default).ok_or_else(|| self.missing_default(default))?;
					self.routed(default, spec)
				}
				None => Ok(RouteOutcome::FullPage),
			},
		}
	}

	fn fallback(
		&self,
		routes: &IndexMap<String, TemplateSpec>,
		requested: &str,
	) -> ViewResult<RouteOutcome> {
		if let Some(default) = &self.default_route
			&& let Some(spec) = routes.get(default)
			&& !spec.is_empty()
		{
			tracing::warn!(view = %self.name, requested, fallback = %default, "unknown route, using default route");
			return self.routed(default, spec);
		}

		if self.template.as_ref().is_some_and(|spec| !spec.is_empty()) {
			tracing::warn!(view = %self.name, requested, "unknown route, using fragment template");
			return self.single();
		}

		Err(self.improperly_configured(format!(
			"unknown route '{}' and no usable fallback (default route or fragment template)",
			requested
		)))
	}

	fn routed(&self, key: &str, spec: &TemplateSpec) -> ViewResult<RouteOutcome> {
		let templates = spec.candidates();
		if templates.is_empty() {
			return Err(self.improperly_configured(format!(
				"route '{}' did not map to a template",
				key
			)));
		}
		Ok(RouteOutcome::Routed {
			key: key.to_string(),
			templates,
		})
	}

	fn single(&self) -> ViewResult<RouteOutcome> {
		let templates = self
			.template
			.as_ref()
			.map(TemplateSpec::candidates)
			.unwrap_or_default();
		if templates.is_empty() {
			return Err(self.improperly_configured(
				"fragment request received but no fragment template is configured".to_string(),
			));
		}
		Ok(RouteOutcome::Single { templates })
	}

	fn missing_default(&self, default: &str) -> ViewError {
		self.improperly_configured(format!("default route '{}' is not in the route table", default))
	}

	fn improperly_configured(&self, message: String) -> ViewError {
		ViewError::ImproperlyConfigured(format!("{}: {}", self.name, message))
	}
}

/// Builder for [`PartialRouter`]. Configuration is checked by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct PartialRouterBuilder {
	name: String,
	template: Option<TemplateSpec>,
	param: Option<String>,
	routes: Option<IndexMap<String, TemplateSpec>>,
	default_route: Option<String>,
	not_found_on_unknown: bool,
}

impl PartialRouterBuilder {
	/// Fragment template used without a route table, or as the lenient fallback.
	pub fn template(mut self, template: impl Into<TemplateSpec>) -> Self {
		self.template = Some(template.into());
		self
	}

	/// Request parameter carrying the route key.
	pub fn param(mut self, param: impl Into<String>) -> Self {
		self.param = Some(param.into());
		self
	}

	/// Add a route; declaration order is kept.
	pub fn route(mut self, key: impl Into<String>, template: impl Into<TemplateSpec>) -> Self {
		self.routes
			.get_or_insert_with(IndexMap::new)
			.insert(key.into(), template.into());
		self
	}

	/// Replace the whole route table. An empty table is a configuration error.
	pub fn routes<I, K, T>(mut self, routes: I) -> Self
	where
		I: IntoIterator<Item = (K, T)>,
		K: Into<String>,
		T: Into<TemplateSpec>,
	{
		self.routes = Some(
			routes
				.into_iter()
				.map(|(key, template)| (key.into(), template.into()))
				.collect(),
		);
		self
	}

	/// Route used when the request carries no key.
	pub fn default_route(mut self, key: impl Into<String>) -> Self {
		self.default_route = Some(key.into());
		self
	}

	/// Fall back instead of answering not found when the key is unknown.
	pub fn lenient(mut self) -> Self {
		self.not_found_on_unknown = false;
		self
	}

	pub fn not_found_on_unknown(mut self, not_found: bool) -> Self {
		self.not_found_on_unknown = not_found;
		self
	}

	pub fn build(self) -> ViewResult<PartialRouter> {
		let router = PartialRouter {
			name: self.name,
			template: self.template,
			param: self.param.filter(|param| !param.is_empty()),
			routes: self.routes,
			default_route: self.default_route,
			not_found_on_unknown: self.not_found_on_unknown,
		};

		if let Some(routes) = &router.routes {
			if router.param.is_none() {
				return Err(router.improperly_configured(
					"a route table requires a route parameter name".to_string(),
				));
			}
			if routes.is_empty() {
				return Err(router.improperly_configured("the route table is empty".to_string()));
			}
		}

		if let Some(default) = &router.default_route {
			let known = router
				.routes
				.as_ref()
				.is_some_and(|routes| routes.contains_key(default));
			if !known {
				return Err(router.missing_default(default));
			}
		}

		Ok(router)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn partial(uri: &str) -> Request {
		Request::builder().uri(uri).htmx(false).build().unwrap()
	}

	fn full(uri: &str) -> Request {
		Request::builder().uri(uri).build().unwrap()
	}

	#[fixture]
	fn tabs() -> PartialRouterBuilder {
		PartialRouter::builder("AccountView")
			.param("tab")
			.route("a", "tpl_a")
			.route("b", "tpl_b")
	}

	#[rstest]
	fn test_routes_without_param_are_rejected() {
		let result = PartialRouter::builder("AccountView").route("a", "tpl_a").build();

		assert!(
			matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.contains("route parameter"))
		);
	}

	#[rstest]
	fn test_empty_route_table_is_rejected() {
		let result = PartialRouter::builder("AccountView")
			.param("tab")
			.routes(Vec::<(String, TemplateSpec)>::new())
			.build();

		assert!(matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.contains("empty")));
	}

	#[rstest]
	fn test_unknown_default_is_rejected(tabs: PartialRouterBuilder) {
		let result = tabs.default_route("z").build();

		assert!(
			matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.contains("'z' is not in the route table"))
		);
	}

	#[rstest]
	fn test_default_without_routes_is_rejected() {
		let result = PartialRouter::builder("AccountView")
			.template("tpl")
			.default_route("a")
			.build();

		assert!(result.is_err());
	}

	#[rstest]
	fn test_partial_request_without_templates_is_rejected() {
		let router = PartialRouter::builder("AccountView").build().unwrap();

		let result = router.resolve(&partial("/"));

		assert!(matches!(result, Err(ViewError::ImproperlyConfigured(_))));
		assert!(router.resolve(&full("/")).is_ok());
	}

	#[rstest]
	fn test_full_request_gets_default_key_in_context(tabs: PartialRouterBuilder) {
		let router = tabs.default_route("a").build().unwrap();

		let resolution = router.resolve(&full("/account/")).unwrap();

		assert_eq!(resolution.outcome, RouteOutcome::FullPage);
		assert_eq!(resolution.context.get(HTMX_KEY), Some(&json!("a")));
		assert_eq!(resolution.template_names(&["account.html"]), vec!["account.html"]);
	}

	#[rstest]
	fn test_boosted_request_renders_full_page(tabs: PartialRouterBuilder) {
		let router = tabs.build().unwrap();
		let request = Request::builder()
			.uri("/account/?tab=b")
			.htmx(true)
			.build()
			.unwrap();

		let resolution = router.resolve(&request).unwrap();

		assert_eq!(resolution.mode, RequestMode::PartialBoosted);
		assert_eq!(resolution.outcome, RouteOutcome::FullPage);
		assert_eq!(resolution.context.get(HTMX_KEY), Some(&json!("b")));
	}

	#[rstest]
	fn test_full_request_without_param_adds_nothing() {
		let router = PartialRouter::builder("AccountView").template("tpl").build().unwrap();

		let resolution = router.resolve(&full("/")).unwrap();

		assert!(resolution.context.is_empty());
	}

	#[rstest]
	#[case("/account/?tab=b", "tpl_b")]
	#[case("/account/", "tpl_a")]
	#[case("/account/?tab=", "tpl_a")]
	fn test_partial_resolution(tabs: PartialRouterBuilder, #[case] uri: &str, #[case] expected: &str) {
		let router = tabs.default_route("a").build().unwrap();

		let resolution = router.resolve(&partial(uri)).unwrap();

		assert_eq!(resolution.template_names(&[]), vec![expected]);
	}

	#[rstest]
	fn test_route_key_falls_back_to_form_data(tabs: PartialRouterBuilder) {
		let router = tabs.build().unwrap();
		let request = Request::builder()
			.method(vitrine_http::Method::POST)
			.uri("/account/")
			.htmx(false)
			.form_param("tab", "b")
			.build()
			.unwrap();

		assert_eq!(router.route_key(&request), Some("b"));
		assert_eq!(
			router.resolve(&request).unwrap().outcome.route_key(),
			Some("b")
		);
	}

	#[rstest]
	fn test_unknown_key_is_not_found_when_strict(tabs: PartialRouterBuilder) {
		let router = tabs.build().unwrap();

		let result = router.resolve(&partial("/account/?tab=z"));

		assert!(matches!(result, Err(ViewError::NotFound(msg)) if msg.contains("'z'")));
	}

	#[rstest]
	fn test_lenient_prefers_default_route(tabs: PartialRouterBuilder) {
		let router = tabs.template("tpl_single").default_route("b").lenient().build().unwrap();

		let resolution = router.resolve(&partial("/account/?tab=z")).unwrap();

		assert_eq!(
			resolution.outcome,
			RouteOutcome::Routed {
				key: "b".to_string(),
				templates: vec!["tpl_b".to_string()]
			}
		);
		assert_eq!(resolution.context.get(HTMX_KEY), Some(&json!("b")));
	}

	#[rstest]
	fn test_lenient_uses_single_template_without_default(tabs: PartialRouterBuilder) {
		let router = tabs.template("tpl_single").lenient().build().unwrap();

		let resolution = router.resolve(&partial("/account/?tab=z")).unwrap();

		assert_eq!(resolution.template_names(&[]), vec!["tpl_single"]);
		assert_eq!(resolution.context.get(HTMX_KEY), Some(&Value::Null));
	}

	#[rstest]
	fn test_lenient_without_fallback_is_misconfigured(tabs: PartialRouterBuilder) {
		let router = tabs.lenient().build().unwrap();

		let result = router.resolve(&partial("/account/?tab=z"));

		assert!(
			matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.contains("no usable fallback"))
		);
	}

	#[rstest]
	fn test_empty_route_templates_are_misconfigured(tabs: PartialRouterBuilder) {
		let router = tabs.route("c", TemplateSpec::Candidates(vec![])).build().unwrap();

		let result = router.resolve(&partial("/account/?tab=c"));

		assert!(
			matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.contains("'c' did not map"))
		);
	}

	#[rstest]
	fn test_empty_default_route_templates_are_misconfigured(tabs: PartialRouterBuilder) {
		let router = tabs
			.route("c", TemplateSpec::Candidates(vec![]))
			.default_route("c")
			.build()
			.unwrap();

		let result = router.resolve(&partial("/account/"));

		assert!(
			matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.contains("'c' did not map"))
		);
	}

	#[rstest]
	fn test_no_key_and_no_default_renders_full_page(tabs: PartialRouterBuilder) {
		let router = tabs.build().unwrap();

		let resolution = router.resolve(&partial("/account/")).unwrap();

		assert_eq!(resolution.mode, RequestMode::Partial);
		assert_eq!(resolution.outcome, RouteOutcome::FullPage);
		assert_eq!(resolution.context.get(HTMX_KEY), Some(&Value::Null));
	}

	#[rstest]
	fn test_single_template_ignores_route_key() {
		let router = PartialRouter::builder("CartView")
			.template(["cart/_items.html", "cart/_empty.html"])
			.build()
			.unwrap();

		let resolution = router.resolve(&partial("/cart/?tab=anything")).unwrap();

		assert_eq!(
			resolution.outcome,
			RouteOutcome::Single {
				templates: vec!["cart/_items.html".to_string(), "cart/_empty.html".to_string()]
			}
		);
	}
}
