//! Grid state and its conversions
//!
//! The grid speaks its own vocabulary: a list of `{id, desc}` sorts, a list
//! of `{id, value}` column filters, a global filter string and a 0-based
//! page index. [`GridState`] converts from the server's [`TableState`] and
//! from the wire parameters, and back to [`WireParams`] for the next
//! request.
//!
//! A column filter with an explicit operator carries its value as
//! `{"clause": <operator>, "value": <value>}`; any other value is sent as a
//! bare `filter[<id>]` value and parsed with the filter's default operator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tablekit_core::{
	SEARCH_FILTER_KEY, SortKey, TableState, WireFilter, WireParams, is_field_visible, parse_sort,
};

/// One sort entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortingEntry {
	pub id: String,
	pub desc: bool,
}

impl SortingEntry {
	pub fn asc(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			desc: false,
		}
	}

	pub fn desc(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			desc: true,
		}
	}

	/// Sort token with a leading `-` when descending
	pub fn to_token(&self) -> String {
		if self.desc {
			format!("-{}", self.id)
		} else {
			self.id.clone()
		}
	}
}

impl From<SortKey> for SortingEntry {
	fn from(key: SortKey) -> Self {
		Self {
			id: key.name,
			desc: key.descending,
		}
	}
}

/// One column filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
	pub id: String,
	pub value: Value,
}

impl ColumnFilter {
	pub fn new(id: impl Into<String>, value: Value) -> Self {
		Self {
			id: id.into(),
			value,
		}
	}

	/// A filter with an explicit operator
	pub fn clause(id: impl Into<String>, clause: impl Into<String>, value: Value) -> Self {
		let mut map = Map::new();
		map.insert("clause".to_string(), Value::String(clause.into()));
		map.insert("value".to_string(), value);
		Self::new(id, Value::Object(map))
	}

	/// The wire entry, or `None` for a cleared filter
	fn to_wire(&self) -> Option<WireFilter> {
		match &self.value {
			Value::Null => None,
			Value::String(s) if s.is_empty() => None,
			Value::Object(map) => {
				let op = map
					.get("clause")
					.or_else(|| map.get("op"))
					.and_then(Value::as_str);
				match op {
					Some(op) => {
						let value = map.get("value").filter(|value| !value.is_null()).cloned();
						Some(WireFilter::Clause {
							op: op.to_string(),
							value,
						})
					}
					None => Some(WireFilter::Value(self.value.clone())),
				}
			}
			value => Some(WireFilter::Value(value.clone())),
		}
	}
}

/// 0-based pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
	pub page_index: u64,
	pub page_size: u64,
}

impl Default for PaginationState {
	fn default() -> Self {
		Self {
			page_index: 0,
			page_size: 15,
		}
	}
}

/// State of a grid in the grid's own vocabulary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridState {
	pub sorting: Vec<SortingEntry>,
	pub column_filters: Vec<ColumnFilter>,
	pub global_filter: String,
	pub pagination: PaginationState,
	pub row_selection: BTreeMap<String, bool>,
	pub column_visibility: BTreeMap<String, bool>,
}

impl GridState {
	/// Converts the server's canonical state
	///
	/// Only enabled filters become column filters.
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use tablekit_core::{FilterDescriptor, FilterType, RequestParams, StateDefaults, StateStore};
	/// use tablekit_grid::GridState;
	///
	/// let params = RequestParams::from_query_string("sort=-created_at&page=3&filter[search]=dell").unwrap();
	/// let store = StateStore::from_params(
	///     None,
	///     vec![FilterDescriptor::new("name", FilterType::Text)],
	///     StateDefaults::default(),
	///     &params,
	/// );
	///
	/// let grid = GridState::from_table_state(store.state());
	/// assert_eq!(grid.pagination.page_index, 2);
	/// assert!(grid.sorting[0].desc);
	/// assert_eq!(grid.global_filter, "dell");
	/// ```
	pub fn from_table_state(state: &TableState) -> Self {
		let column_filters = state
			.active_filters()
			.filter_map(|(attribute, filter)| {
				let clause = filter.clause?;
				Some(ColumnFilter::clause(
					attribute.clone(),
					clause.as_str(),
					filter.value.clone(),
				))
			})
			.collect();

		Self {
			sorting: state.sort_keys().into_iter().map(SortingEntry::from).collect(),
			column_filters,
			global_filter: state.search.clone().unwrap_or_default(),
			pagination: PaginationState {
				page_index: state.page.saturating_sub(1),
				page_size: state.per_page,
			},
			row_selection: BTreeMap::new(),
			column_visibility: visibility(state.fields.as_deref()),
		}
	}

	/// Converts wire parameters, e.g. the query string of the current URL
	pub fn from_wire(wire: &WireParams, default_page_size: u64) -> Self {
		let sorting = wire
			.sort
			.as_deref()
			.map(parse_sort)
			.unwrap_or_default()
			.iter()
			.map(|token| SortingEntry::from(SortKey::parse(token)))
			.collect();

		let column_filters = wire
			.filter
			.iter()
			.filter(|(attribute, _)| attribute.as_str() != SEARCH_FILTER_KEY)
			.map(|(attribute, entry)| match entry {
				WireFilter::Clause { op, value } => ColumnFilter::clause(
					attribute.clone(),
					op.clone(),
					value.clone().unwrap_or(Value::Null),
				),
				WireFilter::Value(value) => ColumnFilter::new(attribute.clone(), value.clone()),
			})
			.collect();

		let fields = wire.fields.as_deref().map(|raw| {
			raw.split(',')
				.map(str::trim)
				.filter(|field| !field.is_empty())
				.map(str::to_string)
				.collect::<Vec<_>>()
		});

		Self {
			sorting,
			column_filters,
			global_filter: wire.search().unwrap_or_default().to_string(),
			pagination: PaginationState {
				page_index: wire.page.unwrap_or(1).saturating_sub(1),
				page_size: wire.per_page.unwrap_or(default_page_size),
			},
			row_selection: BTreeMap::new(),
			column_visibility: visibility(fields.as_deref()),
		}
	}

	/// Wire parameters for the next request
	///
	/// Cleared column filters (`null` or `""`) are omitted. `fields` is only
	/// sent when the visibility map is not empty: columns switched on by
	/// name, columns switched off with a leading `-`.
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use tablekit_grid::{ColumnFilter, GridState, PaginationState, SortingEntry};
	///
	/// let grid = GridState {
	///     sorting: vec![SortingEntry::desc("created_at"), SortingEntry::asc("name")],
	///     column_filters: vec![ColumnFilter::clause("price", "between", json!(["10", "20"]))],
	///     global_filter: "dell".to_string(),
	///     pagination: PaginationState { page_index: 1, page_size: 25 },
	///     ..Default::default()
	/// };
	///
	/// let wire = grid.to_wire_params();
	/// assert_eq!(wire.sort.as_deref(), Some("-created_at,name"));
	/// assert_eq!(wire.page, Some(2));
	/// assert_eq!(wire.per_page, Some(25));
	/// assert_eq!(wire.search(), Some("dell"));
	/// ```
	pub fn to_wire_params(&self) -> WireParams {
		let mut wire = WireParams {
			sort: (!self.sorting.is_empty()).then(|| self.sort_string()),
			page: Some(self.pagination.page_index.saturating_add(1)),
			per_page: Some(self.pagination.page_size),
			..Default::default()
		};
		for filter in &self.column_filters {
			if filter.id == SEARCH_FILTER_KEY {
				continue;
			}
			if let Some(entry) = filter.to_wire() {
				wire.filter.insert(filter.id.clone(), entry);
			}
		}
		wire.set_search(Some(self.global_filter.trim()));
		if !self.column_visibility.is_empty() {
			wire.fields = Some(self.field_tokens().join(","));
		}
		wire
	}

	/// Returns whether a toggleable column is shown
	///
	/// Follows the server's reading of `fields`: columns switched off are
	/// hidden, and once any column is switched on explicitly only those
	/// columns are shown.
	pub fn is_column_visible(&self, id: &str) -> bool {
		if self.column_visibility.is_empty() {
			return true;
		}
		let tokens = self.field_tokens();
		is_field_visible(Some(tokens.as_slice()), id)
	}

	/// `fields` tokens: visible columns by name, hidden ones with a `-`
	fn field_tokens(&self) -> Vec<String> {
		self.column_visibility
			.iter()
			.map(|(id, visible)| if *visible { id.clone() } else { format!("-{id}") })
			.collect()
	}

	/// Sort entries as a CSV of sign-annotated tokens
	pub fn sort_string(&self) -> String {
		self.sorting
			.iter()
			.map(SortingEntry::to_token)
			.collect::<Vec<_>>()
			.join(",")
	}

	/// Selected row ids
	pub fn selected_rows(&self) -> Vec<&str> {
		self.row_selection
			.iter()
			.filter(|(_, selected)| **selected)
			.map(|(id, _)| id.as_str())
			.collect()
	}
}

fn visibility(fields: Option<&[String]>) -> BTreeMap<String, bool> {
	fields
		.unwrap_or_default()
		.iter()
		.map(|field| match field.strip_prefix('-') {
			Some(hidden) => (hidden.to_string(), false),
			None => (field.clone(), true),
		})
		.collect()
}
