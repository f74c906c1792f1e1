//! Table State and the State Store
//!
//! [`StateStore`] turns the parameters of one request into a canonical
//! [`TableState`]. Every declared filter appears in the state, active or
//! not, so a schema built from it always lists the full filter menu.

use crate::error::{StateError, StateResult};
use crate::filter::{FilterDescriptor, FilterState};
use crate::params::RequestParams;
use crate::preset::Preset;
use crate::value::{positive_integer, scalar_to_string};
use crate::wire::{SEARCH_FILTER_KEY, WireFilter, WireParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One parsed sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
	pub name: String,
	pub descending: bool,
}

impl SortKey {
	/// Parses `name` or `-name`
	pub fn parse(token: &str) -> Self {
		match token.strip_prefix('-') {
			Some(name) => Self {
				name: name.to_string(),
				descending: true,
			},
			None => Self {
				name: token.to_string(),
				descending: false,
			},
		}
	}

	/// Renders the key back to its sign-annotated token
	pub fn to_token(&self) -> String {
		if self.descending {
			format!("-{}", self.name)
		} else {
			self.name.clone()
		}
	}
}

/// Splits a sort CSV into trimmed, non-empty tokens
///
/// # Examples
///
/// ```
/// use tablekit_core::parse_sort;
///
/// assert_eq!(parse_sort(" -created_at,,name "), vec!["-created_at", "name"]);
/// ```
pub fn parse_sort(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|token| !token.is_empty() && *token != "-")
		.map(str::to_string)
		.collect()
}

/// Returns whether a toggleable column is shown for a `fields` selection
///
/// A plain token lists a visible column and a `-` token hides one. When the
/// selection lists no plain token, every column it does not hide is shown,
/// so an empty selection shows everything. Hiding wins over listing.
///
/// # Examples
///
/// ```
/// use tablekit_core::is_field_visible;
///
/// let hidden = vec!["-serial".to_string()];
/// assert!(!is_field_visible(Some(&hidden), "serial"));
/// assert!(is_field_visible(Some(&hidden), "notes"));
///
/// let listed = vec!["serial".to_string()];
/// assert!(is_field_visible(Some(&listed), "serial"));
/// assert!(!is_field_visible(Some(&listed), "notes"));
///
/// assert!(is_field_visible(None, "notes"));
/// ```
pub fn is_field_visible(fields: Option<&[String]>, name: &str) -> bool {
	let Some(fields) = fields else {
		return true;
	};
	if fields.iter().any(|token| token.strip_prefix('-') == Some(name)) {
		return false;
	}
	let mut listed = fields.iter().filter(|token| !token.starts_with('-')).peekable();
	listed.peek().is_none() || listed.any(|token| token == name)
}

fn parse_csv(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(str::to_string)
		.collect()
}

/// Canonical, request-scoped snapshot of one table's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
	pub filters: BTreeMap<String, FilterState>,
	pub sort: Vec<String>,
	pub page: u64,
	pub per_page: u64,
	pub search: Option<String>,
	/// Toggleable column selection, see [`is_field_visible`]; `None` shows all of them
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fields: Option<Vec<String>>,
}

impl TableState {
	/// Filters that take part in the query
	pub fn active_filters(&self) -> impl Iterator<Item = (&String, &FilterState)> {
		self.filters.iter().filter(|(_, state)| state.enabled)
	}

	pub fn filter_count(&self) -> usize {
		self.active_filters().count()
	}

	/// Returns whether any filter or search term narrows the result
	pub fn has_filters(&self) -> bool {
		self.filter_count() > 0 || self.search.is_some()
	}

	pub fn sort_keys(&self) -> Vec<SortKey> {
		self.sort.iter().map(|token| SortKey::parse(token)).collect()
	}

	/// Renders the state back to its wire shape
	///
	/// Only active filters are emitted; sort, page, page size and scalar
	/// filter values survive a round trip unchanged.
	pub fn to_wire_params(&self) -> WireParams {
		let mut wire = WireParams {
			sort: (!self.sort.is_empty()).then(|| self.sort.join(",")),
			page: Some(self.page),
			per_page: Some(self.per_page),
			fields: self.fields.as_ref().map(|fields| fields.join(",")),
			..Default::default()
		};
		for (attribute, state) in self.active_filters() {
			let Some(clause) = state.clause else {
				continue;
			};
			let entry = if state.value.is_null() {
				WireFilter::op_only(clause.as_str())
			} else {
				WireFilter::clause(clause.as_str(), state.value.clone())
			};
			wire.filter.insert(attribute.clone(), entry);
		}
		wire.set_search(self.search.as_deref());
		wire
	}
}

/// Fallbacks used while parsing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDefaults {
	/// Sort applied when the request has none
	pub sort: Vec<String>,
	pub per_page: u64,
	pub max_per_page: u64,
	/// Top level search parameter accepted besides `filter[search]`
	pub search_param: String,
}

impl Default for StateDefaults {
	fn default() -> Self {
		Self {
			sort: Vec::new(),
			per_page: 15,
			max_per_page: 100,
			search_param: SEARCH_FILTER_KEY.to_string(),
		}
	}
}

/// Owns the state of one table for the duration of a request
#[derive(Debug, Clone)]
pub struct StateStore {
	name: Option<String>,
	descriptors: Vec<FilterDescriptor>,
	presets: Vec<Preset>,
	defaults: StateDefaults,
	state: TableState,
}

impl StateStore {
	/// Creates a store holding the default state
	pub fn new(
		name: Option<String>,
		descriptors: Vec<FilterDescriptor>,
		defaults: StateDefaults,
	) -> Self {
		let mut store = Self {
			name,
			descriptors,
			presets: Vec::new(),
			defaults,
			state: TableState {
				filters: BTreeMap::new(),
				sort: Vec::new(),
				page: 1,
				per_page: 1,
				search: None,
				fields: None,
			},
		};
		store.state = store.initial_state();
		store
	}

	/// Creates a store from the parameters of a request
	///
	/// Named tables read their own `<name>[...]` namespace.
	///
	/// # Examples
	///
	/// ```
	/// use tablekit_core::{FilterDescriptor, FilterType, RequestParams, StateDefaults, StateStore};
	///
	/// let params = RequestParams::from_query_string(
	///     "assets[filter][name][op]=is_not_set&assets[page]=2",
	/// ).unwrap();
	/// let store = StateStore::from_params(
	///     Some("assets".to_string()),
	///     vec![FilterDescriptor::new("name", FilterType::Text)],
	///     StateDefaults::default(),
	///     &params,
	/// );
	///
	/// assert!(store.state().filters["name"].enabled);
	/// assert_eq!(store.state().page, 2);
	/// ```
	pub fn from_params(
		name: Option<String>,
		descriptors: Vec<FilterDescriptor>,
		defaults: StateDefaults,
		params: &RequestParams,
	) -> Self {
		let mut store = Self::new(name, descriptors, defaults);
		let scoped = params.scoped(store.name.as_deref());
		store.state = store.parse(&scoped);
		store
	}

	/// Declares the presets [`apply_preset`](Self::apply_preset) can switch to
	pub fn with_presets(mut self, presets: Vec<Preset>) -> Self {
		self.presets = presets;
		self
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn descriptors(&self) -> &[FilterDescriptor] {
		&self.descriptors
	}

	pub fn descriptor(&self, attribute: &str) -> Option<&FilterDescriptor> {
		self.descriptors.iter().find(|d| d.attribute() == attribute)
	}

	pub fn presets(&self) -> &[Preset] {
		&self.presets
	}

	pub fn defaults(&self) -> &StateDefaults {
		&self.defaults
	}

	/// The current state snapshot
	pub fn state(&self) -> &TableState {
		&self.state
	}

	/// State of a request that carries no parameters
	pub fn initial_state(&self) -> TableState {
		TableState {
			filters: self.default_filters(),
			sort: self.defaults.sort.clone(),
			page: 1,
			per_page: self.clamp_per_page(self.defaults.per_page),
			search: None,
			fields: None,
		}
	}

	/// Replaces the state
	///
	/// The new state is merged with the declared filters: unknown attributes
	/// are dropped and missing ones fall back to their defaults.
	pub fn set_state(&mut self, state: TableState) {
		let mut filters = BTreeMap::new();
		for descriptor in &self.descriptors {
			let filter = state
				.filters
				.get(descriptor.attribute())
				.cloned()
				.unwrap_or_else(|| descriptor.default_state());
			filters.insert(descriptor.attribute().to_string(), filter);
		}
		self.state = TableState {
			filters,
			sort: state.sort,
			page: state.page.max(1),
			per_page: self.clamp_per_page(state.per_page),
			search: state.search.filter(|term| !term.is_empty()),
			fields: state.fields,
		};
	}

	/// Parses one filter entry and stores it
	///
	/// Changing a filter moves the table back to the first page.
	pub fn apply_filter(&mut self, attribute: &str, raw: &Value) -> StateResult<&FilterState> {
		let descriptor = self
			.descriptors
			.iter()
			.find(|d| d.attribute() == attribute)
			.ok_or_else(|| StateError::UnknownFilter(attribute.to_string()))?;
		let parsed = descriptor.parse(raw);
		self.state.page = 1;
		let slot = self
			.state
			.filters
			.entry(attribute.to_string())
			.or_insert_with(|| FilterState::disabled(Value::Null, None));
		*slot = parsed;
		Ok(slot)
	}

	/// Restores the default state
	pub fn reset(&mut self) {
		self.state = self.initial_state();
	}

	/// Switches to a named preset
	///
	/// Filters named by the preset are parsed like request input; every other
	/// filter is disabled. The preset sort replaces the current one when
	/// given. The search term is kept and pagination starts over.
	pub fn apply_preset(&mut self, name: &str) -> StateResult<()> {
		let preset = self
			.presets
			.iter()
			.find(|preset| preset.name() == name)
			.ok_or_else(|| StateError::UnknownPreset(name.to_string()))?;

		let mut filters = BTreeMap::new();
		for descriptor in &self.descriptors {
			let filter = match preset.filters().get(descriptor.attribute()) {
				Some(raw) => descriptor.parse(raw),
				None => FilterState::disabled(Value::Null, Some(descriptor.default_clause())),
			};
			filters.insert(descriptor.attribute().to_string(), filter);
		}
		for attribute in preset.filters().keys() {
			if self.descriptor(attribute).is_none() {
				tracing::warn!(preset = %name, attribute = %attribute, "preset names an undeclared filter");
			}
		}

		self.state.filters = filters;
		if let Some(sort) = preset.sort() {
			self.state.sort = sort.to_vec();
		}
		self.state.page = 1;
		Ok(())
	}

	fn default_filters(&self) -> BTreeMap<String, FilterState> {
		self.descriptors
			.iter()
			.map(|d| (d.attribute().to_string(), d.default_state()))
			.collect()
	}

	fn clamp_per_page(&self, per_page: u64) -> u64 {
		per_page.max(1).min(self.defaults.max_per_page.max(1))
	}

	fn parse(&self, params: &RequestParams) -> TableState {
		let mut filters = BTreeMap::new();
		let mut search = None;

		if let Some(Value::Object(entries)) = params.get("filter") {
			for (attribute, raw) in entries {
				if attribute == SEARCH_FILTER_KEY {
					search = scalar_to_string(raw).filter(|term| !term.is_empty());
					continue;
				}
				match self.descriptor(attribute) {
					Some(descriptor) => {
						filters.insert(attribute.clone(), descriptor.parse(raw));
					}
					None => {
						tracing::debug!(
							table = ?self.name,
							attribute = %attribute,
							"dropping filter without a declared descriptor"
						);
					}
				}
			}
		} else if params.get("filter").is_some() {
			tracing::debug!(table = ?self.name, "ignoring filter parameter that is not a map");
		}

		if search.is_none() {
			search = params
				.get_string(&self.defaults.search_param)
				.filter(|term| !term.is_empty());
		}

		for descriptor in &self.descriptors {
			filters
				.entry(descriptor.attribute().to_string())
				.or_insert_with(|| descriptor.default_state());
		}

		let sort = params
			.get_string("sort")
			.map(|raw| parse_sort(&raw))
			.filter(|sort| !sort.is_empty())
			.unwrap_or_else(|| self.defaults.sort.clone());

		let page = params.get("page").and_then(positive_integer).unwrap_or(1);
		let per_page = params
			.get("per_page")
			.and_then(positive_integer)
			.unwrap_or(self.defaults.per_page);

		TableState {
			filters,
			sort,
			page,
			per_page: self.clamp_per_page(per_page),
			search,
			fields: params.get_string("fields").map(|raw| parse_csv(&raw)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::operator::{FilterType, Operator};
	use rstest::*;
	use serde_json::json;

	#[fixture]
	fn descriptors() -> Vec<FilterDescriptor> {
		vec![
			FilterDescriptor::new("name", FilterType::Text),
			FilterDescriptor::new("status", FilterType::Select).with_default(json!(["in_use"])),
			FilterDescriptor::new("price", FilterType::Numeric),
			FilterDescriptor::new("category.name", FilterType::Text),
		]
	}

	#[fixture]
	fn defaults() -> StateDefaults {
		StateDefaults {
			sort: vec!["-created_at".to_string()],
			per_page: 15,
			max_per_page: 50,
			search_param: "search".to_string(),
		}
	}

	fn store_for(query: &str, descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) -> StateStore {
		let params = RequestParams::from_query_string(query).unwrap();
		StateStore::from_params(None, descriptors, defaults, &params)
	}

	#[rstest]
	fn test_empty_request_uses_defaults(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let store = store_for("", descriptors, defaults);
		let state = store.state();

		assert_eq!(state.sort, vec!["-created_at"]);
		assert_eq!(state.page, 1);
		assert_eq!(state.per_page, 15);
		assert_eq!(state.search, None);
		assert_eq!(state.filters.len(), 4);
		assert_eq!(
			state.filters["status"],
			FilterState::enabled(json!(["in_use"]), Operator::In)
		);
		assert!(!state.filters["name"].enabled);
	}

	#[rstest]
	fn test_request_filters_are_parsed(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let store = store_for(
			"filter[name][op]=is_not_set&filter[price][op]=equals\
			 &filter[category.name]=Laptops&filter[unknown][value]=x",
			descriptors,
			defaults,
		);
		let state = store.state();

		assert_eq!(
			state.filters["name"],
			FilterState::enabled(Value::Null, Operator::IsNotSet)
		);
		assert!(!state.filters["price"].enabled);
		assert_eq!(
			state.filters["category.name"],
			FilterState::enabled(json!("Laptops"), Operator::Contains)
		);
		assert!(!state.filters.contains_key("unknown"));
		assert_eq!(state.filter_count(), 3);
	}

	#[rstest]
	#[case("filter[search]=dell", Some("dell"))]
	#[case("search=dell", Some("dell"))]
	#[case("filter[search]=dell&search=other", Some("dell"))]
	#[case("filter[search]=", None)]
	fn test_search_term(
		descriptors: Vec<FilterDescriptor>,
		defaults: StateDefaults,
		#[case] query: &str,
		#[case] expected: Option<&str>,
	) {
		let store = store_for(query, descriptors, defaults);
		assert_eq!(store.state().search.as_deref(), expected);
	}

	#[rstest]
	#[case("page=3&per_page=20", 3, 20)]
	#[case("page=0&per_page=0", 1, 15)]
	#[case("page=abc&per_page=-5", 1, 15)]
	#[case("per_page=1000", 1, 50)]
	fn test_pagination_coercion(
		descriptors: Vec<FilterDescriptor>,
		defaults: StateDefaults,
		#[case] query: &str,
		#[case] page: u64,
		#[case] per_page: u64,
	) {
		let store = store_for(query, descriptors, defaults);
		assert_eq!(store.state().page, page);
		assert_eq!(store.state().per_page, per_page);
	}

	#[rstest]
	#[case(None, "serial", true)]
	#[case(Some(""), "serial", true)]
	#[case(Some("-serial"), "serial", false)]
	#[case(Some("-serial"), "notes", true)]
	#[case(Some("serial"), "notes", false)]
	#[case(Some("serial,-notes"), "serial", true)]
	#[case(Some("serial,-serial"), "serial", false)]
	fn test_field_visibility(
		descriptors: Vec<FilterDescriptor>,
		defaults: StateDefaults,
		#[case] fields: Option<&str>,
		#[case] column: &str,
		#[case] visible: bool,
	) {
		let query = fields.map(|fields| format!("fields={fields}")).unwrap_or_default();
		let store = store_for(&query, descriptors, defaults);
		assert_eq!(is_field_visible(store.state().fields.as_deref(), column), visible);
	}

	#[rstest]
	fn test_sort_and_fields(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let store = store_for("sort=name,,-price, &fields=serial, notes", descriptors, defaults);
		assert_eq!(store.state().sort, vec!["name", "-price"]);
		assert_eq!(
			store.state().fields,
			Some(vec!["serial".to_string(), "notes".to_string()])
		);
		assert!(!is_field_visible(store.state().fields.as_deref(), "price"));
		assert_eq!(
			store.state().sort_keys()[1],
			SortKey {
				name: "price".to_string(),
				descending: true
			}
		);
	}

	#[rstest]
	fn test_namespaced_tables_do_not_clobber(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let params = RequestParams::from_query_string("assets[page]=4&users[page]=2&page=9").unwrap();
		let assets = StateStore::from_params(
			Some("assets".to_string()),
			descriptors.clone(),
			defaults.clone(),
			&params,
		);
		let users = StateStore::from_params(Some("users".to_string()), descriptors, defaults, &params);

		assert_eq!(assets.state().page, 4);
		assert_eq!(users.state().page, 2);
	}

	#[rstest]
	fn test_apply_filter_and_reset(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let mut store = store_for("page=3", descriptors, defaults);

		let applied = store
			.apply_filter("price", &json!({"op": "between", "value": [10, 20]}))
			.unwrap()
			.clone();
		assert_eq!(applied, FilterState::enabled(json!([10, 20]), Operator::Between));
		assert_eq!(store.state().page, 1);

		assert_eq!(
			store.apply_filter("serial", &json!("x")),
			Err(StateError::UnknownFilter("serial".to_string()))
		);

		store.reset();
		assert_eq!(store.state(), &store.initial_state());
	}

	#[rstest]
	fn test_set_state_merges_with_descriptors(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let mut store = StateStore::new(None, descriptors, defaults);
		let mut filters = BTreeMap::new();
		filters.insert("name".to_string(), FilterState::enabled(json!("x"), Operator::Equals));
		filters.insert("ghost".to_string(), FilterState::enabled(json!("x"), Operator::Equals));

		store.set_state(TableState {
			filters,
			sort: vec!["name".to_string()],
			page: 0,
			per_page: 500,
			search: Some(String::new()),
			fields: None,
		});

		let state = store.state();
		assert!(state.filters["name"].enabled);
		assert!(!state.filters.contains_key("ghost"));
		assert!(state.filters["status"].enabled);
		assert_eq!(state.page, 1);
		assert_eq!(state.per_page, 50);
		assert_eq!(state.search, None);
	}

	#[rstest]
	fn test_apply_preset(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let mut store = store_for("filter[name]=dell&page=2&search=lap", descriptors, defaults).with_presets(vec![
			Preset::new("cheap")
				.with_filter("price", json!({"op": "less_than", "value": 100}))
				.with_sort(["price"]),
		]);

		store.apply_preset("cheap").unwrap();
		let state = store.state();
		assert_eq!(state.filters["price"], FilterState::enabled(json!(100), Operator::LessThan));
		assert!(!state.filters["name"].enabled);
		assert!(!state.filters["status"].enabled);
		assert_eq!(state.sort, vec!["price"]);
		assert_eq!(state.page, 1);
		assert_eq!(state.search.as_deref(), Some("lap"));

		assert_eq!(
			store.apply_preset("missing"),
			Err(StateError::UnknownPreset("missing".to_string()))
		);
	}

	#[rstest]
	fn test_state_serializes_camel_case(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let store = store_for("per_page=20", descriptors, defaults);
		let json = serde_json::to_value(store.state()).unwrap();
		assert_eq!(json["perPage"], 20);
		assert_eq!(json["filters"]["status"]["clause"], "in");
		assert!(json.get("fields").is_none());
	}

	#[rstest]
	fn test_to_wire_params(descriptors: Vec<FilterDescriptor>, defaults: StateDefaults) {
		let store = store_for(
			"filter[name][op]=is_not_set&filter[search]=dell&sort=-price&page=2&per_page=20",
			descriptors,
			defaults,
		);
		let wire = store.state().to_wire_params();

		assert_eq!(wire.sort.as_deref(), Some("-price"));
		assert_eq!(wire.page, Some(2));
		assert_eq!(wire.per_page, Some(20));
		assert_eq!(wire.search(), Some("dell"));
		assert_eq!(wire.filter["name"], WireFilter::op_only("is_not_set"));
		assert_eq!(wire.filter["status"], WireFilter::clause("in", json!(["in_use"])));
		assert!(!wire.filter.contains_key("price"));
	}
}
