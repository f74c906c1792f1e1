//! Filter operator vocabulary
//!
//! The closed set of comparison operators a filter may use, together with
//! the metadata the state parser and the query resolver need: whether an
//! operator takes a value, whether that value must be an array, and the
//! direct SQL comparison operator when one exists.

use crate::error::{OperatorError, OperatorResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named comparison semantic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
	Equals,
	NotEquals,
	Contains,
	NotContains,
	StartsWith,
	EndsWith,
	GreaterThan,
	GreaterThanOrEqual,
	LessThan,
	LessThanOrEqual,
	Between,
	NotBetween,
	In,
	NotIn,
	IsNull,
	IsNotNull,
	IsTrue,
	IsFalse,
	Before,
	After,
	EqualOrBefore,
	EqualOrAfter,
	IsSet,
	IsNotSet,
}

impl Operator {
	/// Every operator in declaration order
	pub const ALL: [Operator; 24] = [
		Operator::Equals,
		Operator::NotEquals,
		Operator::Contains,
		Operator::NotContains,
		Operator::StartsWith,
		Operator::EndsWith,
		Operator::GreaterThan,
		Operator::GreaterThanOrEqual,
		Operator::LessThan,
		Operator::LessThanOrEqual,
		Operator::Between,
		Operator::NotBetween,
		Operator::In,
		Operator::NotIn,
		Operator::IsNull,
		Operator::IsNotNull,
		Operator::IsTrue,
		Operator::IsFalse,
		Operator::Before,
		Operator::After,
		Operator::EqualOrBefore,
		Operator::EqualOrAfter,
		Operator::IsSet,
		Operator::IsNotSet,
	];

	/// Wire name of the operator
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Equals => "equals",
			Self::NotEquals => "not_equals",
			Self::Contains => "contains",
			Self::NotContains => "not_contains",
			Self::StartsWith => "starts_with",
			Self::EndsWith => "ends_with",
			Self::GreaterThan => "greater_than",
			Self::GreaterThanOrEqual => "greater_than_or_equal",
			Self::LessThan => "less_than",
			Self::LessThanOrEqual => "less_than_or_equal",
			Self::Between => "between",
			Self::NotBetween => "not_between",
			Self::In => "in",
			Self::NotIn => "not_in",
			Self::IsNull => "is_null",
			Self::IsNotNull => "is_not_null",
			Self::IsTrue => "is_true",
			Self::IsFalse => "is_false",
			Self::Before => "before",
			Self::After => "after",
			Self::EqualOrBefore => "equal_or_before",
			Self::EqualOrAfter => "equal_or_after",
			Self::IsSet => "is_set",
			Self::IsNotSet => "is_not_set",
		}
	}

	/// Human readable label used in operator menus and filter summaries
	pub fn label(&self) -> &'static str {
		match self {
			Self::Equals => "Equals",
			Self::NotEquals => "Does not equal",
			Self::Contains => "Contains",
			Self::NotContains => "Does not contain",
			Self::StartsWith => "Starts with",
			Self::EndsWith => "Ends with",
			Self::GreaterThan => "Greater than",
			Self::GreaterThanOrEqual => "Greater than or equal",
			Self::LessThan => "Less than",
			Self::LessThanOrEqual => "Less than or equal",
			Self::Between => "Between",
			Self::NotBetween => "Not between",
			Self::In => "Is any of",
			Self::NotIn => "Is none of",
			Self::IsNull => "Is empty",
			Self::IsNotNull => "Is not empty",
			Self::IsTrue => "Is true",
			Self::IsFalse => "Is false",
			Self::Before => "Before",
			Self::After => "After",
			Self::EqualOrBefore => "On or before",
			Self::EqualOrAfter => "On or after",
			Self::IsSet => "Is set",
			Self::IsNotSet => "Is not set",
		}
	}

	/// Returns whether the operator needs a value to be meaningful
	///
	/// Null checks and boolean checks carry their whole meaning in the
	/// operator itself.
	pub fn requires_value(&self) -> bool {
		!matches!(
			self,
			Self::IsNull | Self::IsNotNull | Self::IsTrue | Self::IsFalse | Self::IsSet | Self::IsNotSet
		)
	}

	/// Returns whether the operator's value must be an array
	pub fn requires_array_value(&self) -> bool {
		matches!(self, Self::Between | Self::NotBetween | Self::In | Self::NotIn)
	}

	/// Returns the direct SQL comparison operator
	///
	/// Pattern matches, set membership, ranges, null checks and boolean checks
	/// have no 1:1 mapping and must be translated by the caller.
	///
	/// # Examples
	///
	/// ```
	/// use tablekit_core::Operator;
	///
	/// assert_eq!(Operator::Before.to_sql_operator().unwrap(), "<");
	/// assert!(Operator::Contains.to_sql_operator().is_err());
	/// ```
	pub fn to_sql_operator(&self) -> OperatorResult<&'static str> {
		match self {
			Self::Equals => Ok("="),
			Self::NotEquals => Ok("!="),
			Self::GreaterThan | Self::After => Ok(">"),
			Self::GreaterThanOrEqual | Self::EqualOrAfter => Ok(">="),
			Self::LessThan | Self::Before => Ok("<"),
			Self::LessThanOrEqual | Self::EqualOrBefore => Ok("<="),
			other => Err(OperatorError::NoDirectSqlMapping(other.as_str().to_string())),
		}
	}

	/// Operators offered for free text columns
	pub fn text_operators() -> Vec<Operator> {
		vec![
			Self::Equals,
			Self::NotEquals,
			Self::Contains,
			Self::NotContains,
			Self::StartsWith,
			Self::EndsWith,
			Self::IsSet,
			Self::IsNotSet,
		]
	}

	/// Operators offered for numeric columns
	pub fn numeric_operators() -> Vec<Operator> {
		vec![
			Self::Equals,
			Self::NotEquals,
			Self::GreaterThan,
			Self::GreaterThanOrEqual,
			Self::LessThan,
			Self::LessThanOrEqual,
			Self::Between,
			Self::NotBetween,
			Self::IsSet,
			Self::IsNotSet,
		]
	}

	/// Operators offered for date columns
	pub fn date_operators() -> Vec<Operator> {
		vec![
			Self::Equals,
			Self::Before,
			Self::After,
			Self::EqualOrBefore,
			Self::EqualOrAfter,
			Self::Between,
			Self::NotBetween,
			Self::IsSet,
			Self::IsNotSet,
		]
	}

	/// Operators offered for columns with a fixed set of choices
	pub fn select_operators() -> Vec<Operator> {
		vec![
			Self::Equals,
			Self::NotEquals,
			Self::In,
			Self::NotIn,
			Self::IsSet,
			Self::IsNotSet,
		]
	}

	/// Operators offered for boolean columns
	pub fn boolean_operators() -> Vec<Operator> {
		vec![Self::IsTrue, Self::IsFalse, Self::IsSet, Self::IsNotSet]
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Operator {
	type Err = OperatorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|op| op.as_str() == s)
			.ok_or_else(|| OperatorError::Unknown(s.to_string()))
	}
}

/// Value type of a filter, which decides its operator menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
	Text,
	Numeric,
	Date,
	Select,
	Boolean,
	/// Translated by a caller-supplied filter implementation
	Custom,
}

impl FilterType {
	/// Operators allowed for this filter type unless a descriptor overrides them
	pub fn operators(&self) -> Vec<Operator> {
		match self {
			Self::Text => Operator::text_operators(),
			Self::Numeric => Operator::numeric_operators(),
			Self::Date => Operator::date_operators(),
			Self::Select => Operator::select_operators(),
			Self::Boolean => Operator::boolean_operators(),
			Self::Custom => Operator::ALL.to_vec(),
		}
	}

	/// Clause used when a request supplies a bare value
	pub fn default_clause(&self) -> Operator {
		match self {
			Self::Text => Operator::Contains,
			Self::Numeric | Self::Date | Self::Custom => Operator::Equals,
			Self::Select => Operator::In,
			Self::Boolean => Operator::IsTrue,
		}
	}
}
