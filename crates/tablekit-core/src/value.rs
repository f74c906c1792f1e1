//! Filter value helpers

use serde_json::Value;

/// Decides whether a filter value makes the filter active
///
/// - `null` is valid and defers to the operator's semantics
/// - the empty string is invalid
/// - arrays are valid when at least one element is neither `null` nor `""`
/// - every other value is valid
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tablekit_core::is_value_valid;
///
/// assert!(is_value_valid(&json!(null)));
/// assert!(!is_value_valid(&json!("")));
/// assert!(is_value_valid(&json!(["", "laptop"])));
/// assert!(!is_value_valid(&json!([null, ""])));
/// ```
pub fn is_value_valid(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => !s.is_empty(),
		Value::Array(items) => items.iter().any(is_present),
		_ => true,
	}
}

/// Returns whether a single element carries content
pub fn is_present(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::String(s) => !s.is_empty(),
		_ => true,
	}
}

/// Renders a scalar value the way it appears in a query string
///
/// Arrays and objects have no scalar form and return `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Null => Some(String::new()),
		Value::Array(_) | Value::Object(_) => None,
	}
}

/// Reads a positive integer out of a parameter value
pub fn positive_integer(value: &Value) -> Option<u64> {
	let parsed = match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse::<u64>().ok(),
		_ => None,
	};
	parsed.filter(|n| *n >= 1)
}
