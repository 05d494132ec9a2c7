//! Declarative sub-form producing [`Record`] entities.

use crate::error::{FormError, FormResult};
use crate::prefix::Prefix;
use crate::record::Record;
use crate::sub_form::{FileData, FormBinding, FormData, SubForm, SubFormSave, UploadedFile};
use crate::validation::{ALL_FIELDS_KEY, ErrorMap};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};

const REQUIRED: &str = "This field is required.";

// One `@`, no whitespace, and a dotted domain without empty labels.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("EMAIL_REGEX: invalid regex pattern")
});

type CleanFunction = Arc<dyn Fn(&FormData) -> FormResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	Char,
	Email,
	Integer,
	Boolean,
	/// ISO `YYYY-MM-DD`
	Date,
	File,
}

/// One declared field of a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
	pub name: String,
	pub kind: FieldKind,
	pub required: bool,
	pub max_length: Option<usize>,
	pub choices: Option<Vec<String>>,
}

impl FieldSpec {
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
			required: !matches!(kind, FieldKind::Boolean),
			max_length: None,
			choices: None,
		}
	}

	pub fn char(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Char)
	}

	pub fn email(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Email)
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Integer)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Boolean)
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Date)
	}

	pub fn file(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::File)
	}

	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn choices<I, S>(mut self, choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.choices = Some(choices.into_iter().map(Into::into).collect());
		self
	}

	/// Clean one raw value into its stored JSON form.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_forms::FieldSpec;
	/// use serde_json::json;
	///
	/// let field = FieldSpec::char("city").max_length(5);
	/// assert_eq!(field.clean(Some(&json!(" Natal ")), None), Ok(json!("Natal")));
	/// assert!(field.clean(Some(&json!("Fortaleza")), None).is_err());
	/// assert!(field.clean(None, None).is_err());
	/// ```
	pub fn clean(&self, value: Option<&Value>, file: Option<&UploadedFile>) -> Result<Value, String> {
		match self.kind {
			FieldKind::File => {
				return match file {
					Some(file) => Ok(Value::String(file.name.clone())),
					None if self.required => Err(REQUIRED.to_string()),
					None => Ok(Value::Null),
				};
			}
			FieldKind::Boolean => {
				let checked = match value {
					Some(Value::Bool(b)) => *b,
					Some(Value::String(s)) => {
						matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes")
					}
					_ => false,
				};
				return if self.required && !checked {
					Err(REQUIRED.to_string())
				} else {
					Ok(Value::Bool(checked))
				};
			}
			_ => {}
		}

		let text = match value {
			None | Some(Value::Null) => String::new(),
			Some(Value::String(s)) => s.trim().to_string(),
			Some(other) => other.to_string(),
		};

		if text.is_empty() {
			if self.required {
				return Err(REQUIRED.to_string());
			}
			return Ok(match self.kind {
				FieldKind::Char => Value::String(String::new()),
				_ => Value::Null,
			});
		}

		if let Some(max) = self.max_length {
			let length = text.chars().count();
			if length > max {
				return Err(format!(
					"Ensure this value has at most {} characters (it has {}).",
					max, length
				));
			}
		}

		if let Some(choices) = &self.choices
			&& !choices.contains(&text)
		{
			return Err(format!(
				"Select a valid choice. {} is not one of the available choices.",
				text
			));
		}

		match self.kind {
			FieldKind::Email if !EMAIL_REGEX.is_match(&text) => {
				Err("Enter a valid email address.".to_string())
			}
			FieldKind::Integer => text
				.parse::<i64>()
				.map(Value::from)
				.map_err(|_| "Enter a whole number.".to_string()),
			FieldKind::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
				.map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
				.map_err(|_| "Enter a valid date.".to_string()),
			_ => Ok(Value::String(text)),
		}
	}
}

/// Field declarations and clean hooks shared by every [`RecordForm`] of one model.
///
/// # Examples
///
/// ```
/// use vitrine_forms::{FieldSpec, FormBinding, RecordSchema, SubForm};
/// use serde_json::json;
///
/// let schema = RecordSchema::new("user")
///     .field(FieldSpec::char("first_name").max_length(50))
///     .field(FieldSpec::email("email"));
///
/// let data = [
///     ("first_name".to_string(), json!("Ana")),
///     ("email".to_string(), json!("ana@example.com")),
/// ];
/// let mut form = schema.bind(FormBinding::standalone(Some(data.into_iter().collect())));
///
/// assert!(form.is_valid());
/// assert_eq!(form.cleaned_data().get("email"), Some(&json!("ana@example.com")));
/// ```
#[derive(Clone)]
pub struct RecordSchema {
	model: String,
	fields: Vec<FieldSpec>,
	clean_functions: Vec<CleanFunction>,
}

impl RecordSchema {
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			fields: vec![],
			clean_functions: vec![],
		}
	}

	pub fn field(mut self, field: FieldSpec) -> Self {
		self.fields.push(field);
		self
	}

	/// Add a form-level clean hook.
	///
	/// Returning [`FormError::Field`] files the message under that field, anything
	/// else under [`ALL_FIELDS_KEY`].
	pub fn clean<F>(mut self, f: F) -> Self
	where
		F: Fn(&FormData) -> FormResult<()> + Send + Sync + 'static,
	{
		self.clean_functions.push(Arc::new(f));
		self
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	pub fn fields(&self) -> &[FieldSpec] {
		&self.fields
	}

	pub fn bind(&self, binding: FormBinding<Record>) -> RecordForm {
		let mut initial = FormData::new();
		if let Some(instance) = &binding.instance {
			for field in &self.fields {
				if let Some(value) = instance.get(&field.name) {
					initial.insert(field.name.clone(), value.clone());
				}
			}
		}
		initial.extend(binding.initial);

		RecordForm {
			schema: self.clone(),
			prefix: binding.prefix,
			data: binding.data,
			files: binding.files,
			initial,
			instance: binding.instance,
			errors: ErrorMap::new(),
			cleaned: FormData::new(),
			validated: false,
		}
	}

	/// Factory for composite membership.
	pub fn factory(
		&self,
	) -> impl Fn(FormBinding<Record>) -> Box<dyn SubForm<Record>> + Send + Sync + use<> {
		let schema = self.clone();
		move |binding| -> Box<dyn SubForm<Record>> { Box::new(schema.bind(binding)) }
	}
}

/// Sub-form over the fields of one [`Record`] model.
pub struct RecordForm {
	schema: RecordSchema,
	prefix: Prefix,
	data: Option<Arc<FormData>>,
	files: Arc<FileData>,
	initial: FormData,
	instance: Option<Record>,
	errors: ErrorMap,
	cleaned: FormData,
	validated: bool,
}

impl RecordForm {
	pub fn initial(&self) -> &FormData {
		&self.initial
	}

	pub fn instance(&self) -> Option<&Record> {
		self.instance.as_ref()
	}

	/// Raw submitted value of a bare field name.
	pub fn value(&self, field_name: &str) -> Option<&Value> {
		self.data
			.as_ref()
			.and_then(|data| data.get(&self.prefix.add(field_name)))
	}
}

impl SubForm<Record> for RecordForm {
	fn prefix(&self) -> &Prefix {
		&self.prefix
	}

	fn is_bound(&self) -> bool {
		self.data.is_some()
	}

	fn fields(&self) -> Vec<String> {
		self.schema.fields.iter().map(|f| f.name.clone()).collect()
	}

	fn is_valid(&mut self) -> bool {
		self.errors.clear();
		self.cleaned.clear();
		self.validated = false;

		let Some(data) = self.data.clone() else {
			return false;
		};

		for field in &self.schema.fields {
			let key = self.prefix.add(&field.name);
			match field.clean(data.get(&key), self.files.get(&key)) {
				Ok(cleaned) => {
					self.cleaned.insert(field.name.clone(), cleaned);
				}
				Err(message) => {
					self.errors
						.entry(field.name.clone())
						.or_default()
						.push(message);
				}
			}
		}

		for clean_fn in &self.schema.clean_functions {
			if let Err(e) = clean_fn(&self.cleaned) {
				match e {
					FormError::Field { field, message } => {
						self.errors.entry(field).or_default().push(message);
					}
					FormError::Validation(message) => {
						self.errors
							.entry(ALL_FIELDS_KEY.to_string())
							.or_default()
							.push(message);
					}
					other => {
						self.errors
							.entry(ALL_FIELDS_KEY.to_string())
							.or_default()
							.push(other.to_string());
					}
				}
			}
		}

		self.validated = self.errors.is_empty();
		self.validated
	}

	fn errors(&self) -> &ErrorMap {
		&self.errors
	}

	fn cleaned_data(&self) -> &FormData {
		&self.cleaned
	}

	fn save(&mut self) -> FormResult<SubFormSave<Record>> {
		if !self.validated {
			return Err(FormError::NotValidated);
		}

		let mut record = self
			.instance
			.clone()
			.unwrap_or_else(|| Record::new(self.schema.model.clone()));
		for field in &self.schema.fields {
			if let Some(value) = self.cleaned.get(&field.name) {
				record.set(field.name.clone(), value.clone());
			}
		}
		Ok(SubFormSave::new(record))
	}

	fn committed(&mut self, entity: &Record) {
		self.instance = Some(entity.clone());
	}

	fn is_multipart(&self) -> bool {
		self.schema
			.fields
			.iter()
			.any(|f| f.kind == FieldKind::File)
	}

	fn has_changed(&self) -> bool {
		if self.data.is_none() {
			return false;
		}
		self.schema.fields.iter().any(|field| {
			let submitted = self.value(&field.name).filter(|v| !v.is_null());
			let initial = self.initial.get(&field.name).filter(|v| !v.is_null());
			match (submitted, initial) {
				(None, None) => false,
				(Some(a), Some(b)) => value_text(a) != value_text(b),
				_ => true,
			}
		})
	}
}

fn value_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.trim().to_string(),
		other => other.to_string(),
	}
}
