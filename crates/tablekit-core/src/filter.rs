//! Filter descriptors and the canonical filter state

use crate::operator::{FilterType, Operator};
use crate::path::humanize;
use crate::value::is_value_valid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One choice offered by a select filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
	/// Value sent back in the filter
	pub value: String,
	/// Text shown to the user
	pub label: String,
}

impl FilterOption {
	/// Creates a select choice
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
		}
	}
}

/// Declares one user-facing filter
///
/// # Examples
///
/// ```
/// use tablekit_core::{FilterDescriptor, FilterType, Operator};
///
/// let status = FilterDescriptor::new("status", FilterType::Select)
///     .with_option("in_use", "In use")
///     .with_option("in_stock", "In stock")
///     .with_default(serde_json::json!(["in_use"]));
///
/// assert_eq!(status.label(), "Status");
/// assert_eq!(status.default_clause(), Operator::In);
/// assert!(status.allows(Operator::NotIn));
/// assert!(!status.allows(Operator::Contains));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
	attribute: String,
	label: Option<String>,
	filter_type: FilterType,
	operators: Vec<Operator>,
	default_value: Option<Value>,
	default_clause: Option<Operator>,
	options: Vec<FilterOption>,
}

impl FilterDescriptor {
	/// Declares a filter with the operator menu of its type
	pub fn new(attribute: impl Into<String>, filter_type: FilterType) -> Self {
		Self {
			attribute: attribute.into(),
			label: None,
			filter_type,
			operators: filter_type.operators(),
			default_value: None,
			default_clause: None,
			options: Vec::new(),
		}
	}

	/// Sets the display label
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Restricts the allowed operators
	pub fn with_operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
		self.operators = operators.into_iter().collect();
		self
	}

	/// Sets the value applied when the request does not mention this filter
	pub fn with_default(mut self, value: Value) -> Self {
		self.default_value = Some(value);
		self
	}

	/// Sets the clause used for bare values and defaults
	pub fn with_default_clause(mut self, clause: Operator) -> Self {
		self.default_clause = Some(clause);
		self
	}

	/// Adds a select choice
	pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
		self.options.push(FilterOption::new(value, label));
		self
	}

	pub fn attribute(&self) -> &str {
		&self.attribute
	}

	pub fn label(&self) -> String {
		self.label
			.clone()
			.unwrap_or_else(|| humanize(&self.attribute))
	}

	pub fn filter_type(&self) -> FilterType {
		self.filter_type
	}

	pub fn allowed_operators(&self) -> &[Operator] {
		&self.operators
	}

	pub fn options(&self) -> &[FilterOption] {
		&self.options
	}

	pub fn default(&self) -> Option<&Value> {
		self.default_value.as_ref()
	}

	/// Clause used when none is supplied
	///
	/// Falls back to the filter type's default clause, or to the first
	/// allowed operator when the type default was excluded.
	pub fn default_clause(&self) -> Operator {
		if let Some(clause) = self.default_clause {
			return clause;
		}
		let preferred = self.filter_type.default_clause();
		if self.allows(preferred) {
			preferred
		} else {
			self.operators.first().copied().unwrap_or(preferred)
		}
	}

	/// Returns whether the operator belongs to this filter's menu
	pub fn allows(&self, operator: Operator) -> bool {
		self.operators.contains(&operator)
	}

	/// State used when the request does not mention this filter
	pub fn default_state(&self) -> FilterState {
		match &self.default_value {
			Some(value) => self.evaluate(self.default_clause(), value.clone(), true),
			None => FilterState::disabled(Value::Null, Some(self.default_clause())),
		}
	}

	/// Parses one inbound filter entry into its canonical state
	///
	/// Accepted shapes are `{op, value}`, `{clause, value}`, `{op}`,
	/// `{value}` and a bare scalar or array. Malformed input never errors;
	/// it produces a disabled filter.
	pub fn parse(&self, raw: &Value) -> FilterState {
		let (explicit, value) = match raw {
			Value::Object(map) if map.contains_key("op") || map.contains_key("clause") => {
				let op = map.get("op").or_else(|| map.get("clause"));
				(Some(op.cloned().unwrap_or(Value::Null)), map.get("value").cloned())
			}
			Value::Object(map) if map.len() == 1 && map.contains_key("value") => {
				(None, map.get("value").cloned())
			}
			other => (None, Some(other.clone())),
		};
		let value = value.unwrap_or(Value::Null);

		let Some(raw_clause) = explicit else {
			return self.evaluate(self.default_clause(), value, true);
		};

		let clause = raw_clause
			.as_str()
			.and_then(|name| name.parse::<Operator>().ok());
		match clause {
			Some(clause) => self.evaluate(clause, value, false),
			None => {
				tracing::debug!(
					attribute = %self.attribute,
					clause = %raw_clause,
					"ignoring filter with unknown operator"
				);
				FilterState::disabled(value, Some(self.default_clause()))
			}
		}
	}

	/// Applies the arity and validity rules for a resolved clause
	fn evaluate(&self, clause: Operator, value: Value, bare: bool) -> FilterState {
		if !self.allows(clause) {
			tracing::debug!(
				attribute = %self.attribute,
				clause = %clause,
				"ignoring filter with disallowed operator"
			);
			return FilterState::disabled(value, Some(clause));
		}

		if !clause.requires_value() {
			return FilterState::enabled(Value::Null, clause);
		}

		if clause.requires_array_value() {
			let value = match value {
				Value::Array(_) => value,
				// A bare scalar under an array default clause is a one element set.
				Value::String(_) | Value::Number(_) | Value::Bool(_) if bare => {
					Value::Array(vec![value])
				}
				other => return FilterState::disabled(other, Some(clause)),
			};
			let enabled = match (&value, clause) {
				(Value::Array(items), Operator::Between | Operator::NotBetween) => {
					items.len() == 2 && items.iter().all(crate::value::is_present)
				}
				_ => is_value_valid(&value),
			};
			return FilterState {
				enabled,
				value,
				clause: Some(clause),
			};
		}

		match value {
			Value::Null | Value::Array(_) | Value::Object(_) => FilterState::disabled(value, Some(clause)),
			scalar => FilterState {
				enabled: is_value_valid(&scalar),
				value: scalar,
				clause: Some(clause),
			},
		}
	}
}

/// Canonical per-attribute filter record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
	pub enabled: bool,
	pub value: Value,
	pub clause: Option<Operator>,
}

impl FilterState {
	/// An active filter
	pub fn enabled(value: Value, clause: Operator) -> Self {
		Self {
			enabled: true,
			value,
			clause: Some(clause),
		}
	}

	/// A filter that is kept for the schema but not applied
	pub fn disabled(value: Value, clause: Option<Operator>) -> Self {
		Self {
			enabled: false,
			value,
			clause,
		}
	}
}
