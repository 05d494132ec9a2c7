//! Persistence contract used by composite saves, and an in-memory store.

use crate::error::FormResult;
use crate::record::Record;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
	#[error("Constraint violated on {model}: {message}")]
	Constraint { model: String, message: String },
	#[error("Entity '{0}' has no identity yet")]
	MissingIdentity(String),
}

/// A domain object the composite can wire and commit.
pub trait Entity: Send {
	type PrimaryKey: Clone + fmt::Debug + Send;

	fn primary_key(&self) -> Option<&Self::PrimaryKey>;

	fn set_primary_key(&mut self, value: Self::PrimaryKey);

	/// Point the relation `field` at the entity identified by `target`.
	fn set_relation(&mut self, field: &str, target: &Self::PrimaryKey);
}

/// Writes available inside an atomic scope.
pub trait EntityStore<E: Entity> {
	/// Insert or update `entity`, assigning its primary key when it has none.
	fn save(&mut self, entity: &mut E) -> Result<(), PersistenceError>;
}

/// Scoped atomic execution: every write made through the scope is kept if `f`
/// returns `Ok`, and discarded otherwise.
pub trait Atomic<E: Entity> {
	type Scope: EntityStore<E>;

	fn atomic<T, F>(&self, f: F) -> FormResult<T>
	where
		F: FnOnce(&mut Self::Scope) -> FormResult<T>;
}

type Constraint = Arc<dyn Fn(&Record, &Tables) -> Result<(), String> + Send + Sync>;

/// Records of every model, by primary key.
#[derive(Debug, Clone, Default)]
pub struct Tables {
	rows: HashMap<String, BTreeMap<i64, Record>>,
	next_id: i64,
}

impl Tables {
	pub fn records<'a>(&'a self, model: &str) -> impl Iterator<Item = &'a Record> + use<'a> {
		self.rows.get(model).into_iter().flat_map(|rows| rows.values())
	}

	pub fn get(&self, model: &str, pk: i64) -> Option<&Record> {
		self.rows.get(model).and_then(|rows| rows.get(&pk))
	}
}

#[derive(Default)]
struct StoreState {
	tables: Tables,
	constraints: Vec<(String, Constraint)>,
}

/// In-memory record store
///
/// The lock is held for the whole atomic scope and staged writes replace the live
/// tables only when the scope succeeds, so readers never observe a half-applied
/// save. For the same reason a scope that panicked leaves the tables intact, and
/// the store keeps serving them after the lock was poisoned.
#[derive(Clone, Default)]
pub struct InMemoryStore {
	state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reject saves of `model` records for which `check` returns an error.
	pub fn with_constraint<F>(self, model: impl Into<String>, check: F) -> Self
	where
		F: Fn(&Record, &Tables) -> Result<(), String> + Send + Sync + 'static,
	{
		self.lock().constraints.push((model.into(), Arc::new(check)));
		self
	}

	/// Reject two `model` records sharing a non-null value for `field`.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_forms::{Atomic, EntityStore, InMemoryStore, Record};
	/// use serde_json::json;
	///
	/// let store = InMemoryStore::new().with_unique("profile", "phone_number");
	///
	/// let first = store.atomic(|scope| {
	///     let mut profile = Record::new("profile").with_field("phone_number", json!("+5511999990000"));
	///     scope.save(&mut profile)?;
	///     Ok(profile)
	/// });
	/// assert!(first.is_ok());
	///
	/// let second = store.atomic(|scope| {
	///     let mut profile = Record::new("profile").with_field("phone_number", json!("+5511999990000"));
	///     scope.save(&mut profile)?;
	///     Ok(profile)
	/// });
	/// assert!(second.is_err());
	/// assert_eq!(store.count("profile"), 1);
	/// ```
	pub fn with_unique(self, model: impl Into<String>, field: impl Into<String>) -> Self {
		let model = model.into();
		let field = field.into();
		let table = model.clone();
		self.with_constraint(model, move |record, tables| {
			let Some(value) = record.get(&field).filter(|v| !v.is_null()) else {
				return Ok(());
			};
			let taken = tables
				.records(&table)
				.any(|other| other.pk() != record.pk() && other.get(&field) == Some(value));
			if taken {
				Err(format!("{} must be unique", field))
			} else {
				Ok(())
			}
		})
	}

	pub fn count(&self, model: &str) -> usize {
		self.lock().tables.records(model).count()
	}

	pub fn get(&self, model: &str, pk: i64) -> Option<Record> {
		self.lock().tables.get(model, pk).cloned()
	}

	pub fn all(&self, model: &str) -> Vec<Record> {
		self.lock().tables.records(model).cloned().collect()
	}

	fn lock(&self) -> MutexGuard<'_, StoreState> {
		self.state.lock().unwrap_or_else(|poisoned| {
			tracing::warn!("in-memory store lock was poisoned, recovering committed tables");
			PoisonError::into_inner(poisoned)
		})
	}
}

impl fmt::Debug for InMemoryStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InMemoryStore").finish_non_exhaustive()
	}
}

/// Staged writes of one atomic scope.
pub struct MemoryScope {
	tables: Tables,
	constraints: Vec<(String, Constraint)>,
}

impl EntityStore<Record> for MemoryScope {
	fn save(&mut self, record: &mut Record) -> Result<(), PersistenceError> {
		for (model, check) in &self.constraints {
			if model == record.model() {
				check(record, &self.tables).map_err(|message| PersistenceError::Constraint {
					model: model.clone(),
					message,
				})?;
			}
		}

		let pk = match record.pk() {
			Some(pk) => pk,
			None => {
				self.tables.next_id += 1;
				let pk = self.tables.next_id;
				record.set_primary_key(pk);
				pk
			}
		};
		self.tables
			.rows
			.entry(record.model().to_string())
			.or_default()
			.insert(pk, record.clone());
		Ok(())
	}
}

impl Atomic<Record> for InMemoryStore {
	type Scope = MemoryScope;

	fn atomic<T, F>(&self, f: F) -> FormResult<T>
	where
		F: FnOnce(&mut Self::Scope) -> FormResult<T>,
	{
		let mut state = self.lock();

		let mut scope = MemoryScope {
			tables: state.tables.clone(),
			constraints: state.constraints.clone(),
		};
		let value = f(&mut scope)?;
		state.tables = scope.tables;
		Ok(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::FormError;
	use serde_json::json;

	#[test]
	fn test_atomic_commits_on_success() {
		let store = InMemoryStore::new();

		let pk = store
			.atomic(|scope| {
				let mut user = Record::new("user").with_field("email", json!("ana@example.com"));
				scope.save(&mut user)?;
				Ok(user.pk())
			})
			.unwrap();

		assert_eq!(pk, Some(1));
		assert_eq!(store.count("user"), 1);
		assert_eq!(
			store.get("user", 1).unwrap().get("email"),
			Some(&json!("ana@example.com"))
		);
	}

	#[test]
	fn test_atomic_discards_on_error() {
		let store = InMemoryStore::new();

		let result: FormResult<()> = store.atomic(|scope| {
			let mut user = Record::new("user");
			scope.save(&mut user)?;
			Err(FormError::Validation("abort".to_string()))
		});

		assert!(result.is_err());
		assert_eq!(store.count("user"), 0);
	}

	#[test]
	fn test_rollback_discards_staged_identities() {
		let store = InMemoryStore::new().with_constraint("profile", |_, _| {
			Err("always fails".to_string())
		});

		let failed: FormResult<()> = store.atomic(|scope| {
			scope.save(&mut Record::new("user"))?;
			scope.save(&mut Record::new("profile"))?;
			Ok(())
		});
		assert!(matches!(
			failed,
			Err(FormError::Persistence(PersistenceError::Constraint { .. }))
		));

		let pk = store
			.atomic(|scope| {
				let mut user = Record::new("user");
				scope.save(&mut user)?;
				Ok(user.pk())
			})
			.unwrap();
		// The staged counter was thrown away with the rest of the scope.
		assert_eq!(pk, Some(1));
	}

	#[test]
	fn test_panicking_scope_keeps_committed_rows() {
		let store = InMemoryStore::new();
		store
			.atomic(|scope| {
				scope.save(&mut Record::new("user").with_field("email", json!("ana@example.com")))?;
				Ok(())
			})
			.unwrap();

		let panicking = store.clone();
		let outcome = std::thread::spawn(move || {
			let _: FormResult<()> = panicking.atomic(|scope| {
				scope.save(&mut Record::new("user"))?;
				panic!("scope aborted");
			});
		})
		.join();
		assert!(outcome.is_err());

		let store = store.with_unique("user", "email");
		assert_eq!(store.count("user"), 1);
		assert_eq!(store.all("user").len(), 1);
		assert_eq!(
			store.get("user", 1).unwrap().get("email"),
			Some(&json!("ana@example.com"))
		);

		let duplicate: FormResult<()> = store.atomic(|scope| {
			scope.save(&mut Record::new("user").with_field("email", json!("ana@example.com")))?;
			Ok(())
		});
		assert!(matches!(
			duplicate,
			Err(FormError::Persistence(PersistenceError::Constraint { .. }))
		));
	}

	#[test]
	fn test_update_keeps_primary_key() {
		let store = InMemoryStore::new();
		let mut user = store
			.atomic(|scope| {
				let mut user = Record::new("user").with_field("first_name", json!("Ana"));
				scope.save(&mut user)?;
				Ok(user)
			})
			.unwrap();

		user.set("first_name", json!("Ana Maria"));
		store
			.atomic(|scope| {
				scope.save(&mut user)?;
				Ok(())
			})
			.unwrap();

		assert_eq!(store.count("user"), 1);
		assert_eq!(
			store.get("user", 1).unwrap().get("first_name"),
			Some(&json!("Ana Maria"))
		);
	}
}
