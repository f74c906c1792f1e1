//! Wire shape of table state
//!
//! This is the flat parameter set a client sends with each request:
//!
//! | Parameter | Meaning |
//! |---|---|
//! | `sort` | CSV of sort keys, `-` marks descending |
//! | `filter[search]` | global search term |
//! | `filter[<attr>][op]` | explicit operator |
//! | `filter[<attr>][value]` | scalar or array value |
//! | `page` | 1-based page number |
//! | `per_page` | page size |
//! | `fields` | CSV of toggleable columns, `-` hides one |

use crate::params::RequestParams;
use crate::value::positive_integer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved filter slot carrying the global search term
pub const SEARCH_FILTER_KEY: &str = "search";

/// One entry under `filter[...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireFilter {
	/// `filter[attr][op]=...&filter[attr][value]=...`
	Clause {
		#[serde(alias = "clause")]
		op: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		value: Option<Value>,
	},
	/// `filter[attr]=...` or `filter[attr][]=...`
	Value(Value),
}

impl WireFilter {
	/// An explicit operator with a value
	pub fn clause(op: impl Into<String>, value: Value) -> Self {
		Self::Clause {
			op: op.into(),
			value: Some(value),
		}
	}

	/// An explicit operator without a value
	pub fn op_only(op: impl Into<String>) -> Self {
		Self::Clause {
			op: op.into(),
			value: None,
		}
	}

	fn from_json(raw: &Value) -> Self {
		if let Value::Object(map) = raw
			&& let Some(op) = map.get("op").or_else(|| map.get("clause")).and_then(Value::as_str)
		{
			return Self::Clause {
				op: op.to_string(),
				value: map.get("value").cloned(),
			};
		}
		Self::Value(raw.clone())
	}

	fn to_json(&self) -> Value {
		match self {
			Self::Clause { op, value } => {
				let mut map = Map::new();
				map.insert("op".to_string(), Value::String(op.clone()));
				if let Some(value) = value {
					map.insert("value".to_string(), value.clone());
				}
				Value::Object(map)
			}
			Self::Value(value) => value.clone(),
		}
	}
}

/// Flat request parameters for one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireParams {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sort: Option<String>,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub filter: BTreeMap<String, WireFilter>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub page: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub per_page: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fields: Option<String>,
}

impl WireParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads the wire shape out of a parameter tree
	///
	/// Unparseable `page`/`per_page` values are dropped here and replaced by
	/// defaults once the state store parses them.
	pub fn from_request_params(params: &RequestParams) -> Self {
		let filter = match params.get("filter") {
			Some(Value::Object(map)) => map
				.iter()
				.map(|(attribute, raw)| (attribute.clone(), WireFilter::from_json(raw)))
				.collect(),
			_ => BTreeMap::new(),
		};

		Self {
			sort: params.get_string("sort").filter(|s| !s.is_empty()),
			filter,
			page: params.get("page").and_then(positive_integer),
			per_page: params.get("per_page").and_then(positive_integer),
			fields: params.get_string("fields"),
		}
	}

	/// Builds the nested parameter tree
	pub fn to_request_params(&self) -> RequestParams {
		let mut params = RequestParams::new();
		if let Some(sort) = &self.sort {
			params.insert("sort", Value::String(sort.clone()));
		}
		if !self.filter.is_empty() {
			let filter: Map<String, Value> = self
				.filter
				.iter()
				.map(|(attribute, entry)| (attribute.clone(), entry.to_json()))
				.collect();
			params.insert("filter", Value::Object(filter));
		}
		if let Some(page) = self.page {
			params.insert("page", Value::String(page.to_string()));
		}
		if let Some(per_page) = self.per_page {
			params.insert("per_page", Value::String(per_page.to_string()));
		}
		if let Some(fields) = &self.fields {
			params.insert("fields", Value::String(fields.clone()));
		}
		params
	}

	/// Encodes the parameters as a query string, optionally under a table namespace
	///
	/// # Examples
	///
	/// ```
	/// use tablekit_core::{WireFilter, WireParams};
	///
	/// let mut wire = WireParams::new();
	/// wire.filter.insert("name".to_string(), WireFilter::op_only("is_not_set"));
	///
	/// assert_eq!(
	///     wire.to_query_string(Some("assets")),
	///     "assets%5Bfilter%5D%5Bname%5D%5Bop%5D=is_not_set"
	/// );
	/// ```
	pub fn to_query_string(&self, namespace: Option<&str>) -> String {
		self.to_request_params().namespaced(namespace).to_query_string()
	}

	/// The global search term, if one is set
	pub fn search(&self) -> Option<&str> {
		match self.filter.get(SEARCH_FILTER_KEY) {
			Some(WireFilter::Value(Value::String(term))) if !term.is_empty() => Some(term),
			_ => None,
		}
	}

	/// Sets or clears the global search term
	pub fn set_search(&mut self, term: Option<&str>) {
		match term {
			Some(term) if !term.is_empty() => {
				self.filter.insert(
					SEARCH_FILTER_KEY.to_string(),
					WireFilter::Value(Value::String(term.to_string())),
				);
			}
			_ => {
				self.filter.remove(SEARCH_FILTER_KEY);
			}
		}
	}
}
