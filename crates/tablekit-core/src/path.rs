//! Dotted attribute paths
//!
//! A column, filter or sort identifier may traverse relations, e.g.
//! `category.name` or `assignments.user.email`. The same string is used as
//! the state key, the client filter id and, flattened, as a SQL alias. All
//! splitting and alias generation goes through [`DottedPath`].

use std::fmt;

/// A possibly relation-traversing attribute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedPath {
	raw: String,
}

impl DottedPath {
	/// Wraps a raw path such as `category.name`
	pub fn new(raw: impl Into<String>) -> Self {
		Self { raw: raw.into() }
	}

	/// The path as written, used as the state key
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Returns whether the path traverses at least one relation
	pub fn is_relation(&self) -> bool {
		self.raw.contains('.')
	}

	/// All segments of the path
	pub fn segments(&self) -> Vec<&str> {
		self.raw.split('.').collect()
	}

	/// The relation segments, i.e. everything but the final attribute
	pub fn relations(&self) -> Vec<&str> {
		let mut segments = self.segments();
		segments.pop();
		segments
	}

	/// The relation prefix (`assignments.user` for `assignments.user.email`)
	pub fn relation_prefix(&self) -> Option<&str> {
		self.raw.rsplit_once('.').map(|(prefix, _)| prefix)
	}

	/// The terminal attribute (`email` for `assignments.user.email`)
	pub fn attribute(&self) -> &str {
		self.raw
			.rsplit_once('.')
			.map(|(_, attribute)| attribute)
			.unwrap_or(&self.raw)
	}

	/// SQL-safe alias with dots flattened to underscores
	///
	/// # Examples
	///
	/// ```
	/// use tablekit_core::DottedPath;
	///
	/// assert_eq!(DottedPath::new("assignments.user").alias(), "assignments_user");
	/// ```
	pub fn alias(&self) -> String {
		flatten_alias(&self.raw)
	}

	/// Alias of the relation prefix, if any
	pub fn relation_alias(&self) -> Option<String> {
		self.relation_prefix().map(flatten_alias)
	}
}

impl fmt::Display for DottedPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl From<&str> for DottedPath {
	fn from(raw: &str) -> Self {
		Self::new(raw)
	}
}

impl From<String> for DottedPath {
	fn from(raw: String) -> Self {
		Self::new(raw)
	}
}

/// Flattens a dotted path into an alias (`a.b` → `a_b`)
pub fn flatten_alias(path: &str) -> String {
	path.replace('.', "_")
}

/// Turns an attribute path into display text
///
/// `category.name` becomes `Category Name`, `created_at` becomes `Created At`.
pub fn humanize(path: &str) -> String {
	path.split(['.', '_'])
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}
