use crate::error::ViewResult;
use crate::template::TemplateSpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Router configuration as plain data, typically one table of a TOML file.
///
/// Turn it into a checked router with
/// [`PartialRouter::from_settings`](crate::PartialRouter::from_settings).
///
/// # Examples
///
/// ```
/// use vitrine_views::{PartialRouter, RouterSettings};
///
/// let settings = RouterSettings::from_toml(r#"
///     name = "AccountView"
///     param = "tab"
///     default_route = "orders"
///
///     [routes]
///     orders = "account/_orders.html"
///     addresses = ["account/_addresses.html", "account/_empty.html"]
/// "#).unwrap();
///
/// let router = PartialRouter::from_settings(settings).unwrap();
/// assert_eq!(router.default_route(), Some("orders"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterSettings {
	#[serde(default)]
	pub name: String,

	/// Single fragment template.
	#[serde(default)]
	pub template: Option<TemplateSpec>,

	/// Request parameter carrying the route key.
	#[serde(default)]
	pub param: Option<String>,

	/// Route table, in declaration order.
	#[serde(default)]
	pub routes: Option<IndexMap<String, TemplateSpec>>,

	#[serde(default)]
	pub default_route: Option<String>,

	/// Answer not found for unknown route keys instead of falling back.
	#[serde(default = "default_not_found_on_unknown")]
	pub not_found_on_unknown: bool,
}

fn default_not_found_on_unknown() -> bool {
	true
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			name: String::new(),
			template: None,
			param: None,
			routes: None,
			default_route: None,
			not_found_on_unknown: default_not_found_on_unknown(),
		}
	}
}

impl RouterSettings {
	pub fn from_toml(source: &str) -> ViewResult<Self> {
		Ok(toml::from_str(source)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ViewError;
	use crate::router::PartialRouter;

	#[test]
	fn test_defaults() {
		let settings = RouterSettings::from_toml(r#"template = "cart/_items.html""#).unwrap();

		assert!(settings.not_found_on_unknown);
		assert_eq!(settings.template, Some(TemplateSpec::from("cart/_items.html")));
		assert!(settings.routes.is_none());
	}

	#[test]
	fn test_route_order_is_kept() {
		let settings = RouterSettings::from_toml(
			r#"
			param = "tab"

			[routes]
			zeta = "z.html"
			alpha = "a.html"
			mid = "m.html"
			"#,
		)
		.unwrap();

		let keys: Vec<_> = settings.routes.unwrap().into_keys().collect();
		assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
	}

	#[test]
	fn test_unknown_field_is_rejected() {
		let result = RouterSettings::from_toml(r#"tempalte = "a.html""#);

		assert!(matches!(result, Err(ViewError::Settings(_))));
	}

	#[test]
	fn test_from_settings_runs_the_builder_checks() {
		let settings = RouterSettings::from_toml(
			r#"
			name = "AccountView"

			[routes]
			orders = "account/_orders.html"
			"#,
		)
		.unwrap();

		let result = PartialRouter::from_settings(settings);

		assert!(matches!(result, Err(ViewError::ImproperlyConfigured(msg)) if msg.starts_with("AccountView:")));
	}
}
