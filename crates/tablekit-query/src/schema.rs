//! Table schema sent to the client
//!
//! The schema bundles everything a grid needs to render a table: column
//! definitions in the grid's vocabulary, every declared filter with its
//! operator menu and current state, the canonical table state, the current
//! page of results and a metadata summary.

use crate::column::Column;
use crate::pagination::Paginated;
use serde::Serialize;
use serde_json::Value;
use tablekit_core::{
	FilterDescriptor, FilterOption, FilterState, FilterType, Operator, Preset, TableState,
	scalar_to_string,
};

/// Column definition in the grid's vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
	pub id: String,
	pub accessor_key: String,
	pub header: String,
	pub enable_sorting: bool,
	pub enable_global_filter: bool,
	pub enable_hiding: bool,
}

impl From<&Column> for ColumnSchema {
	fn from(column: &Column) -> Self {
		Self {
			id: column.name().to_string(),
			accessor_key: column.name().to_string(),
			header: column.label(),
			enable_sorting: column.is_sortable(),
			enable_global_filter: column.is_searchable(),
			enable_hiding: column.is_toggleable(),
		}
	}
}

/// One entry of a filter's operator menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorSchema {
	pub value: Operator,
	pub label: &'static str,
}

impl From<Operator> for OperatorSchema {
	fn from(operator: Operator) -> Self {
		Self {
			value: operator,
			label: operator.label(),
		}
	}
}

/// A declared filter with its current state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSchema {
	pub attribute: String,
	pub label: String,
	#[serde(rename = "type")]
	pub filter_type: FilterType,
	pub operators: Vec<OperatorSchema>,
	pub options: Vec<FilterOption>,
	pub enabled: bool,
	pub value: Value,
	pub clause: Option<Operator>,
}

impl FilterSchema {
	pub fn new(descriptor: &FilterDescriptor, state: Option<&FilterState>) -> Self {
		let fallback = descriptor.default_state();
		let state = state.unwrap_or(&fallback);
		Self {
			attribute: descriptor.attribute().to_string(),
			label: descriptor.label(),
			filter_type: descriptor.filter_type(),
			operators: descriptor
				.allowed_operators()
				.iter()
				.copied()
				.map(OperatorSchema::from)
				.collect(),
			options: descriptor.options().to_vec(),
			enabled: state.enabled,
			value: state.value.clone(),
			clause: state.clause,
		}
	}
}

/// A preset the client can switch to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSchema {
	pub name: String,
	pub label: String,
}

impl From<&Preset> for PresetSchema {
	fn from(preset: &Preset) -> Self {
		Self {
			name: preset.name().to_string(),
			label: preset.label(),
		}
	}
}

/// Summary of the table's configuration and state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaMeta {
	pub has_filters: bool,
	/// One readable line per active filter, e.g. `Name contains "lap"`
	pub filter_summary: Vec<String>,
	pub filter_count: usize,
	pub sortable_columns: Vec<String>,
	pub toggleable_columns: Vec<String>,
	pub default_sort: Vec<String>,
	pub searchable_columns: Vec<String>,
	/// Page sizes offered to the client
	pub per_page_options: Vec<u64>,
}

/// Everything a client needs to render one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
	pub name: Option<String>,
	pub columns: Vec<ColumnSchema>,
	pub filters: Vec<FilterSchema>,
	pub presets: Vec<PresetSchema>,
	pub state: TableState,
	pub results: Paginated,
	pub meta: SchemaMeta,
}

/// Describes the active filters and search term of a state
///
/// # Examples
///
/// ```
/// use tablekit_core::{FilterDescriptor, FilterType, StateDefaults, StateStore, RequestParams};
/// use tablekit_query::filter_summary;
///
/// let params = RequestParams::from_query_string(
///     "filter[price][op]=between&filter[price][value][]=10&filter[price][value][]=20&filter[search]=dell",
/// ).unwrap();
/// let descriptors = vec![FilterDescriptor::new("price", FilterType::Numeric)];
/// let store = StateStore::from_params(None, descriptors.clone(), StateDefaults::default(), &params);
///
/// assert_eq!(
///     filter_summary(&descriptors, store.state()),
///     vec!["Price between 10 and 20".to_string(), "Search \"dell\"".to_string()],
/// );
/// ```
pub fn filter_summary(descriptors: &[FilterDescriptor], state: &TableState) -> Vec<String> {
	let mut summary = Vec::new();
	for descriptor in descriptors {
		let Some(filter) = state.filters.get(descriptor.attribute()) else {
			continue;
		};
		let (true, Some(clause)) = (filter.enabled, filter.clause) else {
			continue;
		};
		let label = descriptor.label();
		let operator = clause.label().to_lowercase();
		let line = match (&filter.value, clause) {
			(_, clause) if !clause.requires_value() => format!("{label} {operator}"),
			(Value::Array(bounds), Operator::Between | Operator::NotBetween) => {
				let bounds: Vec<String> = bounds.iter().filter_map(scalar_to_string).collect();
				format!("{label} {operator} {}", bounds.join(" and "))
			}
			(Value::Array(items), _) => {
				let items: Vec<String> = items
					.iter()
					.filter_map(scalar_to_string)
					.filter(|item| !item.is_empty())
					.collect();
				format!("{label} {operator} {}", items.join(", "))
			}
			(value, _) => {
				let value = scalar_to_string(value).unwrap_or_default();
				format!("{label} {operator} \"{value}\"")
			}
		};
		summary.push(line);
	}
	if let Some(term) = state.search.as_deref().filter(|term| !term.is_empty()) {
		summary.push(format!("Search \"{term}\""));
	}
	summary
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use serde_json::json;
	use std::collections::BTreeMap;

	fn state(filters: Vec<(&str, FilterState)>) -> TableState {
		TableState {
			filters: filters
				.into_iter()
				.map(|(attribute, filter)| (attribute.to_string(), filter))
				.collect::<BTreeMap<_, _>>(),
			sort: vec![],
			page: 1,
			per_page: 15,
			search: None,
			fields: None,
		}
	}

	#[rstest]
	fn test_column_schema_uses_grid_vocabulary() {
		let column = Column::new("category.name").sortable().toggleable();
		let schema = serde_json::to_value(ColumnSchema::from(&column)).unwrap();
		assert_eq!(
			schema,
			json!({
				"id": "category.name",
				"accessorKey": "category.name",
				"header": "Category Name",
				"enableSorting": true,
				"enableGlobalFilter": false,
				"enableHiding": true,
			})
		);
	}

	#[rstest]
	fn test_filter_schema_lists_operator_menu() {
		let descriptor = FilterDescriptor::new("status", FilterType::Select)
			.with_operators([Operator::In, Operator::NotIn])
			.with_option("in_use", "In use");
		let schema = serde_json::to_value(FilterSchema::new(&descriptor, None)).unwrap();

		assert_eq!(schema["type"], json!("select"));
		assert_eq!(
			schema["operators"],
			json!([
				{"value": "in", "label": "Is any of"},
				{"value": "not_in", "label": "Is none of"},
			])
		);
		assert_eq!(schema["options"], json!([{"value": "in_use", "label": "In use"}]));
		assert_eq!(schema["enabled"], json!(false));
		assert_eq!(schema["clause"], json!("in"));
	}

	#[rstest]
	fn test_summary_skips_disabled_filters() {
		let descriptors = vec![
			FilterDescriptor::new("name", FilterType::Text),
			FilterDescriptor::new("status", FilterType::Select),
			FilterDescriptor::new("assigned_to", FilterType::Text),
		];
		let state = state(vec![
			("name", FilterState::disabled(json!(""), Some(Operator::Contains))),
			("status", FilterState::enabled(json!(["in_use", "", "broken"]), Operator::In)),
			("assigned_to", FilterState::enabled(Value::Null, Operator::IsNotSet)),
		]);

		assert_eq!(
			filter_summary(&descriptors, &state),
			vec![
				"Status is any of in_use, broken".to_string(),
				"Assigned To is not set".to_string(),
			]
		);
	}
}
