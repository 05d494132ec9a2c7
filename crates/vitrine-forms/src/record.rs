use crate::persistence::Entity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of some model, with dynamically named fields.
///
/// # Examples
///
/// ```
/// use vitrine_forms::{Entity, Record};
/// use serde_json::json;
///
/// let mut profile = Record::new("profile").with_field("gender", json!("F"));
/// profile.set_relation("user_id", &7);
///
/// assert_eq!(profile.get("user_id"), Some(&json!(7)));
/// assert!(profile.pk().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	model: String,
	pk: Option<i64>,
	fields: Map<String, Value>,
}

impl Record {
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			pk: None,
			fields: Map::new(),
		}
	}

	pub fn with_pk(mut self, pk: i64) -> Self {
		self.pk = Some(pk);
		self
	}

	pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
		self.fields.insert(name.into(), value);
		self
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	pub fn pk(&self) -> Option<i64> {
		self.pk
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.fields.get(name)
	}

	pub fn set(&mut self, name: impl Into<String>, value: Value) {
		self.fields.insert(name.into(), value);
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}
}

impl Entity for Record {
	type PrimaryKey = i64;

	fn primary_key(&self) -> Option<&i64> {
		self.pk.as_ref()
	}

	fn set_primary_key(&mut self, value: i64) {
		self.pk = Some(value);
	}

	fn set_relation(&mut self, field: &str, target: &i64) {
		self.fields.insert(field.to_string(), Value::from(*target));
	}
}
