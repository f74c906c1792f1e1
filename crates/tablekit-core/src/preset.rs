//! Named filter presets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A saved combination of filters and sort a user can switch to in one step
///
/// Filter entries use the same shapes as an inbound `filter[...]`
/// parameter and are parsed by the owning filter descriptor.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tablekit_core::Preset;
///
/// let preset = Preset::new("unassigned")
///     .with_label("Unassigned laptops")
///     .with_filter("assigned_to", json!({"op": "is_not_set"}))
///     .with_sort(["-created_at"]);
///
/// assert_eq!(preset.label(), "Unassigned laptops");
/// assert_eq!(preset.sort(), Some(&["-created_at".to_string()][..]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
	name: String,
	label: Option<String>,
	filters: BTreeMap<String, Value>,
	sort: Option<Vec<String>>,
}

impl Preset {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			filters: BTreeMap::new(),
			sort: None,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Adds one raw filter entry
	pub fn with_filter(mut self, attribute: impl Into<String>, raw: Value) -> Self {
		self.filters.insert(attribute.into(), raw);
		self
	}

	/// Replaces the sort when the preset is applied
	pub fn with_sort<I, S>(mut self, sort: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.sort = Some(sort.into_iter().map(Into::into).collect());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn label(&self) -> String {
		self.label
			.clone()
			.unwrap_or_else(|| crate::path::humanize(&self.name))
	}

	pub fn filters(&self) -> &BTreeMap<String, Value> {
		&self.filters
	}

	pub fn sort(&self) -> Option<&[String]> {
		self.sort.as_deref()
	}
}
