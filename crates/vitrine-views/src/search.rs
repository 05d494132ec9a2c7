//! Free-text search over list views.

use crate::error::ViewResult;
use crate::router::Context;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use vitrine_http::Request;

/// Query parameter read when none is configured.
pub const DEFAULT_SEARCH_PARAM: &str = "q";

/// Query parameter dropped from `query_string`, so pagination links can append it.
const PAGE_PARAM: &str = "page";

/// Something whose named fields can be searched.
pub trait Searchable {
	/// Text of `field`, or `None` when the item has no such field.
	fn field_text(&self, field: &str) -> Option<Cow<'_, str>>;
}

impl Searchable for Map<String, Value> {
	fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
		match self.get(field)? {
			Value::Null => None,
			Value::String(text) => Some(Cow::Borrowed(text.as_str())),
			other => Some(Cow::Owned(other.to_string())),
		}
	}
}

impl Searchable for Value {
	fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
		self.as_object()?.field_text(field)
	}
}

impl Searchable for HashMap<String, String> {
	fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
		self.get(field).map(|text| Cow::Borrowed(text.as_str()))
	}
}

/// Search configuration of a list view.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vitrine_http::Request;
/// use vitrine_views::SearchQuery;
///
/// let search = SearchQuery::new(["name", "sku"]);
/// let request = Request::builder().uri("/products/?q=Boot+red&page=3").build().unwrap();
///
/// let products = vec![
///     json!({"name": "Leather boot", "sku": "B-1"}),
///     json!({"name": "Sandal", "sku": "S-RED-2"}),
///     json!({"name": "Scarf", "sku": "C-3"}),
/// ];
/// let found = search.apply(&request, products);
/// assert_eq!(found.len(), 2);
///
/// let context = search.context(&request).unwrap();
/// assert_eq!(context["q"], json!("Boot red"));
/// assert_eq!(context["query_string"], json!("q=Boot+red"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
	param: String,
	fields: Vec<String>,
}

impl SearchQuery {
	pub fn new<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			param: DEFAULT_SEARCH_PARAM.to_string(),
			fields: fields.into_iter().map(Into::into).collect(),
		}
	}

	pub fn with_param(mut self, param: impl Into<String>) -> Self {
		self.param = param.into();
		self
	}

	pub fn param(&self) -> &str {
		&self.param
	}

	pub fn fields(&self) -> &[String] {
		&self.fields
	}

	/// The trimmed query, empty when absent.
	pub fn query<'a>(&self, request: &'a Request) -> &'a str {
		request.query_param(&self.param).unwrap_or_default().trim()
	}

	pub fn filter(&self, request: &Request) -> SearchFilter {
		SearchFilter::new(self.query(request), self.fields.clone())
	}

	/// Keep the items matching the request's query.
	pub fn apply<T, I>(&self, request: &Request, items: I) -> Vec<T>
	where
		T: Searchable,
		I: IntoIterator<Item = T>,
	{
		let filter = self.filter(request);
		items
			.into_iter()
			.filter(|item| filter.matches(item))
			.collect()
	}

	/// The query under the search parameter's name, and the current query string
	/// without the page number under `query_string`.
	pub fn context(&self, request: &Request) -> ViewResult<Context> {
		let remaining: Vec<(&str, &str)> = request
			.query_params()
			.iter()
			.filter(|(name, _)| name != PAGE_PARAM)
			.map(|(name, value)| (name.as_str(), value.as_str()))
			.collect();

		let mut context = Context::new();
		context.insert(self.param.clone(), Value::from(self.query(request)));
		context.insert(
			"query_string".to_string(),
			Value::from(serde_urlencoded::to_string(remaining)?),
		);
		Ok(context)
	}
}

/// Matches an item when any term occurs, case-insensitively, in any field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
	terms: Vec<String>,
	fields: Vec<String>,
}

impl SearchFilter {
	pub fn new(query: &str, fields: Vec<String>) -> Self {
		Self {
			terms: query.split_whitespace().map(str::to_lowercase).collect(),
			fields,
		}
	}

	pub fn terms(&self) -> &[String] {
		&self.terms
	}

	/// An empty query or an empty field list filters nothing out.
	pub fn is_noop(&self) -> bool {
		self.terms.is_empty() || self.fields.is_empty()
	}

	pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
		if self.is_noop() {
			return true;
		}
		self.fields
			.iter()
			.filter_map(|field| item.field_text(field))
			.any(|text| {
				let text = text.to_lowercase();
				self.terms.iter().any(|term| text.contains(term.as_str()))
			})
	}
}
