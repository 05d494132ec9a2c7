//! Field-name namespacing for forms that share one request payload.
//!
//! A sub-form with prefix `user` reads the field `email` from the payload key
//! `user-email`. When the composite is itself nested under a prefix `signup`, the
//! member prefix becomes `user__signup`.

use std::collections::HashMap;
use std::fmt;

/// Separator between a prefix and a field name.
pub const PREFIX_SEPARATOR: char = '-';

/// Separator between a member key and the prefix of the enclosing composite.
pub const NESTED_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Prefix(String);

impl Prefix {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self(prefix.into())
	}

	/// Prefix of a composite member.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_forms::Prefix;
	///
	/// assert_eq!(Prefix::for_member("user", None).as_str(), "user");
	///
	/// let parent = Prefix::new("signup");
	/// assert_eq!(Prefix::for_member("user", Some(&parent)).as_str(), "user__signup");
	/// ```
	pub fn for_member(key: &str, parent: Option<&Prefix>) -> Self {
		match parent {
			Some(parent) if !parent.is_empty() => {
				Self(format!("{}{}{}", key, NESTED_SEPARATOR, parent.0))
			}
			_ => Self(key.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Namespaced name of a field.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_forms::Prefix;
	///
	/// assert_eq!(Prefix::new("profile").add("gender"), "profile-gender");
	/// assert_eq!(Prefix::default().add("gender"), "gender");
	/// ```
	pub fn add(&self, field_name: &str) -> String {
		if self.0.is_empty() {
			field_name.to_string()
		} else {
			format!("{}{}{}", self.0, PREFIX_SEPARATOR, field_name)
		}
	}

	/// Inverse of [`Prefix::add`]: the bare field name if `name` belongs to this prefix.
	pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
		if self.0.is_empty() {
			return Some(name);
		}
		name.strip_prefix(self.0.as_str())?
			.strip_prefix(PREFIX_SEPARATOR)
	}

	/// Entries of a shared payload that belong to this prefix, keyed by bare field name.
	///
	/// # Examples
	///
	/// ```
	/// use vitrine_forms::Prefix;
	/// use std::collections::HashMap;
	///
	/// let mut payload = HashMap::new();
	/// payload.insert("user-email".to_string(), 1);
	/// payload.insert("profile-email".to_string(), 2);
	///
	/// let own = Prefix::new("user").extract(&payload);
	/// assert_eq!(own.len(), 1);
	/// assert_eq!(own.get("email"), Some(&1));
	/// ```
	pub fn extract<V: Clone>(&self, payload: &HashMap<String, V>) -> HashMap<String, V> {
		payload
			.iter()
			.filter_map(|(name, value)| {
				self.strip(name)
					.map(|field| (field.to_string(), value.clone()))
			})
			.collect()
	}
}

impl fmt::Display for Prefix {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("user", "user-email", Some("email"))]
	#[case("user", "profile-email", None)]
	#[case("user", "username", None)]
	#[case("user", "user-", Some(""))]
	#[case("user__signup", "user__signup-first_name", Some("first_name"))]
	#[case("user", "user__signup-first_name", None)]
	#[case("", "email", Some("email"))]
	fn test_strip(#[case] prefix: &str, #[case] name: &str, #[case] expected: Option<&str>) {
		assert_eq!(Prefix::new(prefix).strip(name), expected);
	}

	#[test]
	fn test_empty_parent_is_ignored() {
		let parent = Prefix::default();
		assert_eq!(Prefix::for_member("address", Some(&parent)).as_str(), "address");
	}

	#[test]
	fn test_extract_does_not_leak_between_members() {
		let mut payload = HashMap::new();
		payload.insert("user-name".to_string(), "Ana");
		payload.insert("user__signup-name".to_string(), "Bia");
		payload.insert("name".to_string(), "Caio");

		let user = Prefix::new("user").extract(&payload);
		let nested = Prefix::for_member("user", Some(&Prefix::new("signup"))).extract(&payload);

		assert_eq!(user.len(), 1);
		assert_eq!(user.get("name"), Some(&"Ana"));
		assert_eq!(nested.len(), 1);
		assert_eq!(nested.get("name"), Some(&"Bia"));
	}
}
