//! Composite forms: a fixed set of named sub-forms sharing one request payload.
//!
//! Each member reads its own fields through a prefix derived from its key, so the
//! members never see each other's values. Validation evaluates every member and then
//! the cross-form clean hooks; saving commits every member entity inside one atomic
//! scope, in declaration order, wiring declared relations on the way.

use crate::error::{FormError, FormResult};
use crate::persistence::{Atomic, Entity, EntityStore, PersistenceError};
use crate::prefix::{NESTED_SEPARATOR, PREFIX_SEPARATOR, Prefix};
use crate::sub_form::{FileData, Finisher, FormBinding, FormData, SubForm, SubFormSave, form_data};
use crate::validation::{ALL_FIELDS_KEY, CleanedData, ErrorMap, Validation, ValidationError};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;
use vitrine_http::{Method, Request};

type SubFormFactory<E> = Arc<dyn Fn(FormBinding<E>) -> Box<dyn SubForm<E>> + Send + Sync>;
type CrossFormClean = Arc<dyn Fn(&CleanedData) -> Result<(), ValidationError> + Send + Sync>;

/// Relation wired while committing: `from.field = to.primary_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
	pub from: String,
	pub field: String,
	pub to: String,
}

/// Declaration of a composite form, reusable across requests.
///
/// # Examples
///
/// ```
/// use vitrine_forms::{CompositeFormConfig, CompositeInput, FieldSpec, Record, RecordSchema};
///
/// let user = RecordSchema::new("user").field(FieldSpec::char("first_name"));
/// let profile = RecordSchema::new("profile").field(FieldSpec::char("first_name"));
///
/// let config = CompositeFormConfig::<Record>::new("PersonalInfoForm")
///     .member("user", user.factory())
///     .member("profile", profile.factory())
///     .relate("profile", "user_id", "user");
///
/// let form = config.bind(CompositeInput::unbound()).unwrap();
/// assert_eq!(form.fields(), vec!["user-first_name", "profile-first_name"]);
/// assert!(!form.is_bound());
/// ```
pub struct CompositeFormConfig<E> {
	name: String,
	members: Vec<(String, SubFormFactory<E>)>,
	relations: Vec<Relation>,
	clean_functions: Vec<CrossFormClean>,
	parent_prefix: Option<Prefix>,
}

impl<E> Clone for CompositeFormConfig<E> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			members: self.members.clone(),
			relations: self.relations.clone(),
			clean_functions: self.clean_functions.clone(),
			parent_prefix: self.parent_prefix.clone(),
		}
	}
}

impl<E> fmt::Debug for CompositeFormConfig<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompositeFormConfig")
			.field("name", &self.name)
			.field(
				"members",
				&self.members.iter().map(|(key, _)| key).collect::<Vec<_>>(),
			)
			.field("relations", &self.relations)
			.field("clean_functions", &self.clean_functions.len())
			.field("parent_prefix", &self.parent_prefix)
			.finish()
	}
}

impl<E: Entity> CompositeFormConfig<E> {
	/// `name` identifies the composite in errors and logs.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			members: vec![],
			relations: vec![],
			clean_functions: vec![],
			parent_prefix: None,
		}
	}

	/// Declare a member. Declaration order is the field order and the save order.
	pub fn member<F>(mut self, key: impl Into<String>, factory: F) -> Self
	where
		F: Fn(FormBinding<E>) -> Box<dyn SubForm<E>> + Send + Sync + 'static,
	{
		self.members.push((key.into(), Arc::new(factory)));
		self
	}

	/// Before `from` is committed, set its `field` to the primary key of the
	/// already committed `to`.
	pub fn relate(
		mut self,
		from: impl Into<String>,
		field: impl Into<String>,
		to: impl Into<String>,
	) -> Self {
		self.relations.push(Relation {
			from: from.into(),
			field: field.into(),
			to: to.into(),
		});
		self
	}

	/// Add a cross-form clean hook.
	///
	/// Hooks run after every member was validated and receive the cleaned data of
	/// the members that validated. Their failures become cross-form errors.
	pub fn clean<F>(mut self, f: F) -> Self
	where
		F: Fn(&CleanedData) -> Result<(), ValidationError> + Send + Sync + 'static,
	{
		self.clean_functions.push(Arc::new(f));
		self
	}

	/// Nest the composite under the prefix of an enclosing form.
	pub fn nested_in(mut self, prefix: Prefix) -> Self {
		self.parent_prefix = Some(prefix);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.members.iter().map(|(key, _)| key.as_str())
	}

	pub fn relations(&self) -> &[Relation] {
		&self.relations
	}

	/// Check the declaration without binding anything.
	pub fn check(&self) -> FormResult<()> {
		if self.members.is_empty() {
			return Err(self.improperly_configured("declares no sub-forms".to_string()));
		}

		let mut seen = HashSet::new();
		for (key, _) in &self.members {
			if key.is_empty() {
				return Err(self.improperly_configured("sub-form keys must not be empty".to_string()));
			}
			if key.contains(PREFIX_SEPARATOR) || key.contains(NESTED_SEPARATOR) {
				return Err(self.improperly_configured(format!(
					"sub-form key '{}' must not contain '{}' or '{}'",
					key, PREFIX_SEPARATOR, NESTED_SEPARATOR
				)));
			}
			if !seen.insert(key.as_str()) {
				return Err(self.improperly_configured(format!(
					"sub-form key '{}' is declared more than once",
					key
				)));
			}
		}

		for relation in &self.relations {
			let from = self.position(&relation.from);
			let to = self.position(&relation.to);
			match (from, to) {
				(None, _) | (_, None) => {
					return Err(self.improperly_configured(format!(
						"relation {}.{} -> {} refers to an undeclared sub-form",
						relation.from, relation.field, relation.to
					)));
				}
				(Some(from), Some(to)) if to >= from => {
					return Err(self.improperly_configured(format!(
						"relation {}.{} -> {} requires '{}' to be declared before '{}'",
						relation.from, relation.field, relation.to, relation.to, relation.from
					)));
				}
				_ => {}
			}
		}

		Ok(())
	}

	/// Build one sub-form per declared key from the request input.
	pub fn bind(&self, input: CompositeInput<E>) -> FormResult<CompositeForm<E>> {
		self.check()?;

		let CompositeInput {
			data,
			files,
			mut initial,
			mut instances,
		} = input;

		if let Some(unknown) = initial
			.keys()
			.chain(instances.keys())
			.find(|key| self.position(key).is_none())
		{
			return Err(self.improperly_configured(format!(
				"input refers to undeclared sub-form '{}'",
				unknown
			)));
		}

		let data = data.map(Arc::new);
		let files = Arc::new(files);
		let mut entries = IndexMap::with_capacity(self.members.len());

		for (key, factory) in &self.members {
			let prefix = Prefix::for_member(key, self.parent_prefix.as_ref());
			let instance = instances.remove(key);
			let has_instance = instance.is_some();
			let form = factory(FormBinding {
				data: data.clone(),
				files: Arc::clone(&files),
				initial: initial.remove(key).unwrap_or_default(),
				prefix: prefix.clone(),
				instance,
			});

			if form.prefix() != &prefix {
				return Err(self.improperly_configured(format!(
					"sub-form '{}' uses prefix '{}' instead of '{}'",
					key,
					form.prefix(),
					prefix
				)));
			}

			entries.insert(
				key.clone(),
				SubFormEntry {
					key: key.clone(),
					prefix,
					form,
					has_instance,
				},
			);
		}

		Ok(CompositeForm {
			name: self.name.clone(),
			entries,
			relations: self.relations.clone(),
			clean_functions: self.clean_functions.clone(),
			validation: None,
		})
	}

	fn position(&self, key: &str) -> Option<usize> {
		self.members.iter().position(|(k, _)| k == key)
	}

	fn improperly_configured(&self, message: String) -> FormError {
		FormError::Configuration(format!("{}: {}", self.name, message))
	}
}

/// Request input of a composite: the shared payload plus per-member extras.
pub struct CompositeInput<E> {
	/// `None` leaves every member unbound.
	pub data: Option<FormData>,
	pub files: FileData,
	pub initial: HashMap<String, FormData>,
	pub instances: HashMap<String, E>,
}

impl<E> Default for CompositeInput<E> {
	fn default() -> Self {
		Self {
			data: None,
			files: FileData::new(),
			initial: HashMap::new(),
			instances: HashMap::new(),
		}
	}
}

impl<E> CompositeInput<E> {
	pub fn unbound() -> Self {
		Self::default()
	}

	pub fn bound(data: FormData) -> Self {
		Self {
			data: Some(data),
			..Self::default()
		}
	}

	/// Bound to the submitted parameters of a POST, PUT or PATCH request, unbound
	/// otherwise.
	pub fn from_request(request: &Request) -> Self {
		if [Method::POST, Method::PUT, Method::PATCH].contains(&request.method) {
			Self::bound(form_data(request))
		} else {
			Self::unbound()
		}
	}

	pub fn with_files(mut self, files: FileData) -> Self {
		self.files = files;
		self
	}

	pub fn with_initial(mut self, key: impl Into<String>, initial: FormData) -> Self {
		self.initial.insert(key.into(), initial);
		self
	}

	pub fn with_instance(mut self, key: impl Into<String>, instance: E) -> Self {
		self.instances.insert(key.into(), instance);
		self
	}
}

/// One named member of a composite.
pub struct SubFormEntry<E> {
	key: String,
	prefix: Prefix,
	form: Box<dyn SubForm<E>>,
	has_instance: bool,
}

impl<E> SubFormEntry<E> {
	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn prefix(&self) -> &Prefix {
		&self.prefix
	}

	pub fn form(&self) -> &dyn SubForm<E> {
		self.form.as_ref()
	}

	/// Whether the caller supplied an existing entity for this member.
	pub fn has_instance(&self) -> bool {
		self.has_instance
	}
}

/// Deferred writes of every member, run once the primary commit is done.
pub struct SaveFinisher<E> {
	steps: Vec<(String, Finisher<E>)>,
}

impl<E> SaveFinisher<E> {
	/// Keys of the members that deferred work, in declaration order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.steps.iter().map(|(key, _)| key.as_str())
	}

	pub fn run(self, entities: &IndexMap<String, E>) -> FormResult<()> {
		for (key, step) in self.steps {
			let entity = entities.get(&key).ok_or_else(|| {
				FormError::Configuration(format!("no saved entity for sub-form '{}'", key))
			})?;
			step(entity)?;
		}
		Ok(())
	}
}

impl<E> fmt::Debug for SaveFinisher<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SaveFinisher")
			.field("keys", &self.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Entities produced by a composite save, keyed by member key in save order.
pub struct SavedForms<E> {
	pub entities: IndexMap<String, E>,
	/// Present when a member deferred many-to-many writes; run it after the commit.
	pub finisher: Option<SaveFinisher<E>>,
}

impl<E> SavedForms<E> {
	pub fn get(&self, key: &str) -> Option<&E> {
		self.entities.get(key)
	}

	/// Run the finisher, if any, against the saved entities and return them.
	pub fn finish(self) -> FormResult<IndexMap<String, E>> {
		if let Some(finisher) = self.finisher {
			finisher.run(&self.entities)?;
		}
		Ok(self.entities)
	}
}

/// A bound composite form.
pub struct CompositeForm<E> {
	name: String,
	entries: IndexMap<String, SubFormEntry<E>>,
	relations: Vec<Relation>,
	clean_functions: Vec<CrossFormClean>,
	validation: Option<Validation>,
}

impl<E: Entity> CompositeForm<E> {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn entries(&self) -> impl Iterator<Item = &SubFormEntry<E>> {
		self.entries.values()
	}

	pub fn get(&self, key: &str) -> Option<&(dyn SubForm<E> + 'static)> {
		self.entries.get(key).map(|entry| entry.form.as_ref())
	}

	pub fn get_mut(&mut self, key: &str) -> Option<&mut (dyn SubForm<E> + 'static)> {
		self.entries.get_mut(key).map(|entry| entry.form.as_mut())
	}

	pub fn prefix(&self, key: &str) -> Option<&Prefix> {
		self.entries.get(key).map(|entry| &entry.prefix)
	}

	/// True when any member is bound to submitted data.
	pub fn is_bound(&self) -> bool {
		self.entries.values().any(|entry| entry.form.is_bound())
	}

	pub fn is_multipart(&self) -> bool {
		self.entries.values().any(|entry| entry.form.is_multipart())
	}

	pub fn has_changed(&self) -> bool {
		self.entries.values().any(|entry| entry.form.has_changed())
	}

	/// Every member field under its prefixed name, members in declaration order.
	pub fn fields(&self) -> Vec<String> {
		self.entries
			.values()
			.flat_map(|entry| {
				entry
					.form
					.fields()
					.into_iter()
					.map(|field| entry.prefix.add(&field))
			})
			.collect()
	}

	/// Member errors under prefixed field names, plus cross-form errors from the
	/// last validation under [`ALL_FIELDS_KEY`].
	pub fn errors(&self) -> ErrorMap {
		let crossform = self
			.validation
			.as_ref()
			.map(|v| v.crossform_errors.as_slice())
			.unwrap_or(&[]);
		self.merged_errors(crossform)
	}

	/// Cross-form errors followed by each member's own non-field errors.
	pub fn non_field_errors(&self) -> Vec<String> {
		let mut errors = self
			.validation
			.as_ref()
			.map(|v| v.crossform_errors.clone())
			.unwrap_or_default();
		for entry in self.entries.values() {
			errors.extend(entry.form.non_field_errors());
		}
		errors
	}

	/// Outcome of the last validation, if any.
	pub fn validation(&self) -> Option<&Validation> {
		self.validation.as_ref()
	}

	/// Cleaned data per member; only after a successful validation.
	pub fn cleaned_data(&self) -> Option<&CleanedData> {
		self.validation.as_ref().and_then(Validation::cleaned_data)
	}

	pub fn is_valid(&mut self) -> bool {
		self.validate().is_valid()
	}

	/// Validate every member, then run the cross-form clean hooks.
	pub fn validate(&mut self) -> Validation {
		let mut invalid_members = Vec::new();
		// No short-circuit: every member must populate its errors for display.
		for (key, entry) in self.entries.iter_mut() {
			if !entry.form.is_valid() {
				invalid_members.push(key.clone());
			}
		}

		let cleaned_data: CleanedData = self
			.entries
			.iter()
			.filter(|(key, _)| !invalid_members.contains(key))
			.map(|(key, entry)| (key.clone(), entry.form.cleaned_data().clone()))
			.collect();

		let mut crossform_errors = Vec::new();
		for clean_fn in &self.clean_functions {
			if let Err(e) = clean_fn(&cleaned_data) {
				crossform_errors.extend(e.into_messages());
			}
		}

		let validation = Validation {
			errors: self.merged_errors(&crossform_errors),
			crossform_errors,
			cleaned_data,
			invalid_members,
		};
		tracing::debug!(
			form = %self.name,
			valid = validation.is_valid(),
			invalid_members = ?validation.invalid_members,
			crossform_errors = validation.crossform_errors.len(),
			"validated composite form"
		);

		self.validation = Some(validation.clone());
		validation
	}

	/// Build every member entity without committing anything.
	///
	/// Relations are not wired: the referenced entities have no identity yet.
	pub fn prepare(&mut self) -> FormResult<SavedForms<E>> {
		let (entities, finisher) = self.build_entities()?;
		Ok(SavedForms { entities, finisher })
	}

	/// Build, wire and commit every member entity inside one atomic scope.
	///
	/// Entities are committed in declaration order. Before an entity is committed,
	/// each relation it declares is pointed at the primary key of its target,
	/// which was committed earlier in the same scope. Any failure discards the
	/// whole scope. After a commit each member keeps its entity, so saving the
	/// same form again updates those rows.
	pub fn save<S>(&mut self, store: &S) -> FormResult<SavedForms<E>>
	where
		S: Atomic<E>,
	{
		let (entities, finisher) = self.build_entities()?;
		let relations = &self.relations;

		let entities = store
			.atomic(move |scope| {
				let mut entities = entities;
				let keys: Vec<String> = entities.keys().cloned().collect();
				for key in &keys {
					for relation in relations.iter().filter(|r| &r.from == key) {
						let target = entities
							.get(&relation.to)
							.and_then(|target| target.primary_key())
							.cloned()
							.ok_or_else(|| PersistenceError::MissingIdentity(relation.to.clone()))?;
						if let Some(entity) = entities.get_mut(key) {
							entity.set_relation(&relation.field, &target);
						}
					}
					if let Some(entity) = entities.get_mut(key) {
						scope.save(entity)?;
					}
				}
				Ok(entities)
			})
			.inspect_err(|e| {
				tracing::error!(form = %self.name, error = %e, "composite save rolled back");
			})?;

		for (key, entity) in &entities {
			if let Some(entry) = self.entries.get_mut(key) {
				entry.form.committed(entity);
			}
		}

		tracing::debug!(
			form = %self.name,
			members = entities.len(),
			deferred = finisher.is_some(),
			"committed composite form"
		);
		Ok(SavedForms { entities, finisher })
	}

	fn build_entities(&mut self) -> FormResult<(IndexMap<String, E>, Option<SaveFinisher<E>>)> {
		if !self.validation.as_ref().is_some_and(Validation::is_valid) {
			return Err(FormError::NotValidated);
		}

		let mut entities = IndexMap::with_capacity(self.entries.len());
		let mut steps = Vec::new();
		for (key, entry) in self.entries.iter_mut() {
			let SubFormSave { entity, finisher } = entry.form.save()?;
			entities.insert(key.clone(), entity);
			if let Some(finisher) = finisher {
				steps.push((key.clone(), finisher));
			}
		}

		let finisher = (!steps.is_empty()).then_some(SaveFinisher { steps });
		Ok((entities, finisher))
	}

	fn merged_errors(&self, crossform_errors: &[String]) -> ErrorMap {
		let mut errors = ErrorMap::new();
		for entry in self.entries.values() {
			for (field, messages) in entry.form.errors() {
				errors.insert(entry.prefix.add(field), messages.clone());
			}
		}
		if !crossform_errors.is_empty() {
			errors.insert(ALL_FIELDS_KEY.to_string(), crossform_errors.to_vec());
		}
		errors
	}
}

impl<E: Entity> Index<&str> for CompositeForm<E> {
	type Output = dyn SubForm<E>;

	fn index(&self, key: &str) -> &Self::Output {
		self.get(key)
			.unwrap_or_else(|| panic!("Sub-form '{}' not found in {}", key, self.name))
	}
}
