use serde::{Deserialize, Serialize};

/// One template name, or an ordered list of candidates where the renderer picks
/// the first one that exists.
///
/// Deserializes from either a string or an array of strings.
///
/// # Examples
///
/// ```
/// use vitrine_views::TemplateSpec;
///
/// let single = TemplateSpec::from("orders/_list.html");
/// assert_eq!(single.candidates(), vec!["orders/_list.html"]);
///
/// let candidates = TemplateSpec::from(["orders/_table.html", "orders/_list.html"]);
/// assert_eq!(candidates.candidates().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateSpec {
	Single(String),
	Candidates(Vec<String>),
}

impl TemplateSpec {
	/// Candidate names in order. An empty single name yields no candidate.
	pub fn candidates(&self) -> Vec<String> {
		match self {
			TemplateSpec::Single(name) if name.is_empty() => vec![],
			TemplateSpec::Single(name) => vec![name.clone()],
			TemplateSpec::Candidates(names) => names.clone(),
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			TemplateSpec::Single(name) => name.is_empty(),
			TemplateSpec::Candidates(names) => names.is_empty(),
		}
	}
}

impl From<&str> for TemplateSpec {
	fn from(name: &str) -> Self {
		TemplateSpec::Single(name.to_string())
	}
}

impl From<String> for TemplateSpec {
	fn from(name: String) -> Self {
		TemplateSpec::Single(name)
	}
}

impl From<Vec<String>> for TemplateSpec {
	fn from(names: Vec<String>) -> Self {
		TemplateSpec::Candidates(names)
	}
}

impl<const N: usize> From<[&str; N]> for TemplateSpec {
	fn from(names: [&str; N]) -> Self {
		TemplateSpec::Candidates(names.iter().map(|name| name.to_string()).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(TemplateSpec::from(""), true)]
	#[case(TemplateSpec::from("a.html"), false)]
	#[case(TemplateSpec::Candidates(vec![]), true)]
	#[case(TemplateSpec::from(["a.html"]), false)]
	fn test_is_empty(#[case] spec: TemplateSpec, #[case] expected: bool) {
		assert_eq!(spec.is_empty(), expected);
		assert_eq!(spec.candidates().is_empty(), expected);
	}

	#[test]
	fn test_deserialize_either_shape() {
		let single: TemplateSpec = serde_json::from_str(r#""a.html""#).unwrap();
		let many: TemplateSpec = serde_json::from_str(r#"["a.html", "b.html"]"#).unwrap();

		assert_eq!(single, TemplateSpec::from("a.html"));
		assert_eq!(many.candidates(), vec!["a.html", "b.html"]);
	}
}
