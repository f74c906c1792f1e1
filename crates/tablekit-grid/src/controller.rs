//! Grid controller
//!
//! [`GridController`] owns one grid's state. Every change that affects the
//! rows is persisted and answered with a [`FetchRequest`] carrying the wire
//! parameters for the next request and the version its response must
//! match. Row selection only affects the client, so it is persisted without
//! a request.

use crate::cache::StateCache;
use crate::debounce::Debouncer;
use crate::settings::GridSettings;
use crate::state::{ColumnFilter, GridState, PaginationState, SortingEntry};
use crate::storage::StateStorage;
use crate::tracker::FetchTracker;
use serde_json::Value;
use std::collections::BTreeMap;
use tablekit_core::{TableState, WireParams};
use tokio::sync::mpsc;

/// Parameters of a fetch triggered by a state change
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
	pub version: u64,
	pub params: WireParams,
}

impl FetchRequest {
	/// Query string for the request, optionally under a table namespace
	pub fn query_string(&self, namespace: Option<&str>) -> String {
		self.params.to_query_string(namespace)
	}
}

/// Owns and persists the state of one grid
///
/// # Examples
///
/// ```
/// use tablekit_grid::{GridController, GridSettings, GridState, MemoryStorage, SortingEntry};
///
/// let storage = MemoryStorage::new();
/// let mut grid = GridController::new("assets", GridState::default(), storage.clone(), GridSettings::default());
///
/// let request = grid.set_sorting(vec![SortingEntry::desc("created_at")]);
/// assert_eq!(request.params.sort.as_deref(), Some("-created_at"));
/// assert!(grid.accept(request.version));
///
/// // A reload restores the last state.
/// let restored = GridController::new("assets", GridState::default(), storage, GridSettings::default());
/// assert_eq!(restored.state().sorting, vec![SortingEntry::desc("created_at")]);
/// ```
#[derive(Debug)]
pub struct GridController<S: StateStorage> {
	table_key: String,
	settings: GridSettings,
	initial: GridState,
	state: GridState,
	cache: StateCache<S>,
	tracker: FetchTracker,
}

impl<S: StateStorage> GridController<S> {
	/// Creates a controller, preferring a compatible persisted state over `initial`
	pub fn new(
		table_key: impl Into<String>,
		initial: GridState,
		storage: S,
		settings: GridSettings,
	) -> Self {
		let table_key = table_key.into();
		let cache = StateCache::new(storage, settings.storage_version);
		let state = match cache.load(&table_key) {
			Some(state) => {
				tracing::debug!(table = %table_key, "restored persisted grid state");
				state
			}
			None => initial.clone(),
		};
		Self {
			table_key,
			settings,
			initial,
			state,
			cache,
			tracker: FetchTracker::new(),
		}
	}

	/// Creates a controller seeded with the state the server rendered
	pub fn from_table_state(
		table_key: impl Into<String>,
		state: &TableState,
		storage: S,
		settings: GridSettings,
	) -> Self {
		Self::new(table_key, GridState::from_table_state(state), storage, settings)
	}

	/// Creates a controller seeded from the current URL's wire parameters
	///
	/// A missing `per_page` falls back to [`GridSettings::default_page_size`].
	pub fn from_wire(
		table_key: impl Into<String>,
		wire: &WireParams,
		storage: S,
		settings: GridSettings,
	) -> Self {
		let initial = GridState::from_wire(wire, settings.default_page_size);
		Self::new(table_key, initial, storage, settings)
	}

	pub fn table_key(&self) -> &str {
		&self.table_key
	}

	pub fn settings(&self) -> &GridSettings {
		&self.settings
	}

	pub fn state(&self) -> &GridState {
		&self.state
	}

	pub fn cache(&self) -> &StateCache<S> {
		&self.cache
	}

	pub fn tracker(&self) -> &FetchTracker {
		&self.tracker
	}

	/// Debouncer for global filter input, emitting terms for [`set_global_filter`](Self::set_global_filter)
	pub fn search_input(&self) -> (Debouncer<String>, mpsc::UnboundedReceiver<String>) {
		Debouncer::new(self.settings.debounce_delay())
	}

	/// Returns whether the response for `version` is still wanted
	pub fn accept(&self, version: u64) -> bool {
		self.tracker.accept(version)
	}

	/// Replaces the sort and returns to the first page
	pub fn set_sorting(&mut self, sorting: Vec<SortingEntry>) -> FetchRequest {
		self.state.sorting = sorting;
		self.state.pagination.page_index = 0;
		self.commit()
	}

	/// Cycles one column through ascending, descending and unsorted
	///
	/// The column becomes the only sort.
	pub fn toggle_sort(&mut self, id: &str) -> FetchRequest {
		let current = self.state.sorting.iter().find(|entry| entry.id == id);
		let sorting = match current {
			None => vec![SortingEntry::asc(id)],
			Some(entry) if !entry.desc => vec![SortingEntry::desc(id)],
			Some(_) => Vec::new(),
		};
		self.set_sorting(sorting)
	}

	/// Replaces every column filter and returns to the first page
	pub fn set_column_filters(&mut self, filters: Vec<ColumnFilter>) -> FetchRequest {
		self.state.column_filters = filters;
		self.state.pagination.page_index = 0;
		self.commit()
	}

	/// Sets one column filter; `null` removes it
	pub fn set_column_filter(&mut self, id: &str, value: Value) -> FetchRequest {
		let mut filters: Vec<ColumnFilter> = self
			.state
			.column_filters
			.iter()
			.filter(|filter| filter.id != id)
			.cloned()
			.collect();
		if !value.is_null() {
			filters.push(ColumnFilter::new(id, value));
		}
		self.set_column_filters(filters)
	}

	/// Sets the global filter and returns to the first page
	pub fn set_global_filter(&mut self, term: impl Into<String>) -> FetchRequest {
		self.state.global_filter = term.into();
		self.state.pagination.page_index = 0;
		self.commit()
	}

	pub fn set_pagination(&mut self, pagination: PaginationState) -> FetchRequest {
		self.state.pagination = pagination;
		self.commit()
	}

	pub fn set_page_index(&mut self, page_index: u64) -> FetchRequest {
		self.state.pagination.page_index = page_index;
		self.commit()
	}

	/// Changes the page size and returns to the first page
	pub fn set_page_size(&mut self, page_size: u64) -> FetchRequest {
		self.state.pagination = PaginationState {
			page_index: 0,
			page_size: page_size.max(1),
		};
		self.commit()
	}

	pub fn set_column_visibility(&mut self, visibility: BTreeMap<String, bool>) -> FetchRequest {
		self.state.column_visibility = visibility;
		self.commit()
	}

	/// Replaces the row selection; persisted, no fetch needed
	pub fn set_row_selection(&mut self, selection: BTreeMap<String, bool>) {
		self.state.row_selection = selection;
		self.cache.save(&self.table_key, &self.state);
	}

	/// Restores the initial state and forgets the persisted one
	pub fn reset(&mut self) -> FetchRequest {
		self.state = self.initial.clone();
		self.cache.clear(&self.table_key);
		self.request()
	}

	/// Requests the current state again, e.g. after a manual refresh
	pub fn request(&self) -> FetchRequest {
		FetchRequest {
			version: self.tracker.next(),
			params: self.state.to_wire_params(),
		}
	}

	fn commit(&mut self) -> FetchRequest {
		self.cache.save(&self.table_key, &self.state);
		self.request()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::storage::MemoryStorage;
	use rstest::*;
	use serde_json::json;
	use std::time::Duration;
	use tablekit_core::WireFilter;

	#[fixture]
	fn storage() -> MemoryStorage {
		MemoryStorage::new()
	}

	fn on_page_three() -> GridState {
		GridState {
			pagination: PaginationState {
				page_index: 2,
				page_size: 10,
			},
			..Default::default()
		}
	}

	fn controller(storage: &MemoryStorage) -> GridController<MemoryStorage> {
		GridController::new("assets", on_page_three(), storage.clone(), GridSettings::default())
	}

	#[rstest]
	fn test_sorting_returns_to_first_page(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		let request = grid.set_sorting(vec![SortingEntry::desc("price"), SortingEntry::asc("name")]);

		assert_eq!(request.params.sort.as_deref(), Some("-price,name"));
		assert_eq!(request.params.page, Some(1));
		assert_eq!(request.params.per_page, Some(10));
	}

	#[rstest]
	fn test_filters_return_to_first_page(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		let request = grid.set_column_filter("status", json!(["stock"]));
		assert_eq!(request.params.page, Some(1));
		assert_eq!(request.params.filter["status"], WireFilter::Value(json!(["stock"])));

		let request = grid.set_column_filter("status", Value::Null);
		assert!(request.params.filter.is_empty());
	}

	#[rstest]
	fn test_global_filter_returns_to_first_page(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		let request = grid.set_global_filter("dell");
		assert_eq!(request.params.page, Some(1));
		assert_eq!(request.params.search(), Some("dell"));
	}

	#[rstest]
	fn test_pagination_keeps_filters(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		grid.set_global_filter("dell");
		let request = grid.set_page_index(4);

		assert_eq!(request.params.page, Some(5));
		assert_eq!(request.params.search(), Some("dell"));

		let request = grid.set_page_size(50);
		assert_eq!((request.params.page, request.params.per_page), (Some(1), Some(50)));
	}

	#[rstest]
	fn test_from_wire_uses_default_page_size(storage: MemoryStorage) {
		let wire = WireParams {
			sort: Some("-price".to_string()),
			page: Some(2),
			..Default::default()
		};
		let settings = GridSettings::default().with_default_page_size(40);
		let grid = GridController::from_wire("assets", &wire, storage.clone(), settings);

		assert_eq!(
			grid.state().pagination,
			PaginationState {
				page_index: 1,
				page_size: 40
			}
		);
		assert_eq!(grid.request().params.per_page, Some(40));
	}

	#[rstest]
	fn test_toggle_sort_cycles(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		assert_eq!(grid.toggle_sort("name").params.sort.as_deref(), Some("name"));
		assert_eq!(grid.toggle_sort("name").params.sort.as_deref(), Some("-name"));
		assert_eq!(grid.toggle_sort("name").params.sort, None);
	}

	#[rstest]
	fn test_only_latest_response_is_accepted(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		let first = grid.set_global_filter("d");
		let second = grid.set_global_filter("dell");

		assert!(second.version > first.version);
		assert!(!grid.accept(first.version));
		assert!(grid.accept(second.version));
	}

	#[rstest]
	fn test_state_survives_reload(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		grid.set_global_filter("dell");
		let mut selection = BTreeMap::new();
		selection.insert("7".to_string(), true);
		grid.set_row_selection(selection);

		let reloaded = controller(&storage);
		assert_eq!(reloaded.state().global_filter, "dell");
		assert_eq!(reloaded.state().selected_rows(), vec!["7"]);
	}

	#[rstest]
	fn test_tables_do_not_share_state(storage: MemoryStorage) {
		let mut assets = controller(&storage);
		assets.set_global_filter("dell");

		let users = GridController::new("users", GridState::default(), storage.clone(), GridSettings::default());
		assert_eq!(users.state().global_filter, "");
	}

	#[rstest]
	fn test_storage_version_bump_discards_state(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		grid.set_global_filter("dell");

		let settings = GridSettings::default().with_storage_version(2);
		let upgraded = GridController::new("assets", on_page_three(), storage.clone(), settings);
		assert_eq!(upgraded.state(), &on_page_three());
	}

	#[rstest]
	fn test_reset_restores_initial_state(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		grid.set_global_filter("dell");

		let request = grid.reset();
		assert_eq!(grid.state(), &on_page_three());
		assert_eq!(request.params.page, Some(3));
		assert!(!storage.contains_key("tableState:assets"));
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_debounced_search_triggers_one_fetch(storage: MemoryStorage) {
		let mut grid = controller(&storage);
		let (mut input, mut terms) = grid.search_input();

		for term in ["d", "de", "del", "dell"] {
			input.push(term.to_string());
			tokio::time::advance(Duration::from_millis(50)).await;
		}

		let term = terms.recv().await.unwrap();
		let request = grid.set_global_filter(term);
		assert_eq!(request.params.search(), Some("dell"));
		assert_eq!(request.version, 1);
		assert!(terms.try_recv().is_err());
	}
}
