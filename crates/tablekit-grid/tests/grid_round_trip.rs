use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use tablekit_core::{
	FilterDescriptor, FilterState, FilterType, Operator, RequestParams, StateDefaults, StateStore,
	TableState, WireParams, is_field_visible,
};
use tablekit_grid::{GridController, GridSettings, GridState, MemoryStorage};

fn sort_token() -> impl Strategy<Value = String> {
	("-?", "[a-z][a-z_]{0,10}(\\.[a-z]{1,6})?").prop_map(|(sign, name)| format!("{sign}{name}"))
}

fn table_state() -> impl Strategy<Value = TableState> {
	(
		prop::collection::vec(sort_token(), 0..4),
		1u64..10_000,
		1u64..=100,
		prop::option::of("[a-z]{1,10}"),
		prop::collection::btree_map(
			prop::sample::select(vec!["name", "serial", "category.name"]),
			(
				prop::sample::select(vec![Operator::Equals, Operator::Contains, Operator::IsNotSet]),
				"[a-z0-9]{1,8}",
			),
			0..3,
		),
	)
		.prop_map(|(sort, page, per_page, search, filters)| TableState {
			filters: filters
				.into_iter()
				.map(|(attribute, (clause, value))| {
					let value = if clause.requires_value() {
						Value::String(value)
					} else {
						Value::Null
					};
					(attribute.to_string(), FilterState::enabled(value, clause))
				})
				.collect::<BTreeMap<_, _>>(),
			sort,
			page,
			per_page,
			search,
			fields: None,
		})
}

const TOGGLEABLE: [&str; 4] = ["serial", "notes", "created_at", "category.name"];

/// Parses the grid's next request the way the server does
fn server_state(grid: &GridState) -> TableState {
	let query = grid.to_wire_params().to_query_string(None);
	let params = RequestParams::from_query_string(&query).unwrap();
	StateStore::from_params(None, Vec::new(), StateDefaults::default(), &params)
		.state()
		.clone()
}

proptest! {
	#[test]
	fn prop_server_agrees_on_column_visibility(
		visibility in prop::collection::btree_map(
			prop::sample::select(TOGGLEABLE.to_vec()),
			any::<bool>(),
			0..4,
		),
	) {
		let grid = GridState {
			column_visibility: visibility
				.into_iter()
				.map(|(id, visible)| (id.to_string(), visible))
				.collect(),
			..Default::default()
		};
		let server = server_state(&grid);

		for column in TOGGLEABLE {
			prop_assert_eq!(
				is_field_visible(server.fields.as_deref(), column),
				grid.is_column_visible(column),
				"column {}",
				column
			);
		}
	}

	#[test]
	fn prop_table_state_to_grid_to_wire_keeps_page_and_sort(state in table_state()) {
		let grid = GridState::from_table_state(&state);
		let wire = grid.to_wire_params();

		prop_assert_eq!(wire.page, Some(grid.pagination.page_index + 1));
		prop_assert_eq!(wire.page, Some(state.page));
		prop_assert_eq!(wire.per_page, Some(state.per_page));

		let expected_sort = (!state.sort.is_empty()).then(|| state.sort.join(","));
		prop_assert_eq!(&wire.sort, &expected_sort);
		for (entry, token) in grid.sorting.iter().zip(&state.sort) {
			prop_assert_eq!(entry.desc, token.starts_with('-'));
		}

		prop_assert_eq!(wire, state.to_wire_params());
	}

	#[test]
	fn prop_persisted_grid_state_is_restored(state in table_state()) {
		let storage = MemoryStorage::new();
		let grid = GridState::from_table_state(&state);
		{
			let mut controller = GridController::new("assets", GridState::default(), storage.clone(), GridSettings::default());
			controller.set_pagination(grid.pagination);
			controller.set_column_filters(grid.column_filters.clone());
			controller.set_global_filter(grid.global_filter.clone());
			controller.set_sorting(grid.sorting.clone());
		}

		let restored = GridController::new("assets", GridState::default(), storage, GridSettings::default());
		prop_assert_eq!(&restored.state().sorting, &grid.sorting);
		prop_assert_eq!(&restored.state().column_filters, &grid.column_filters);
		prop_assert_eq!(&restored.state().global_filter, &grid.global_filter);
		prop_assert_eq!(restored.state().pagination.page_size, grid.pagination.page_size);
		prop_assert_eq!(restored.state().pagination.page_index, 0);
	}
}

#[test]
fn test_server_state_round_trips_through_the_grid() {
	let descriptors = vec![
		FilterDescriptor::new("name", FilterType::Text),
		FilterDescriptor::new("price", FilterType::Numeric),
		FilterDescriptor::new("status", FilterType::Select),
	];
	let query = "sort=-created_at,name&page=3&per_page=20&filter[search]=dell\
		&filter[price][op]=between&filter[price][value][]=10&filter[price][value][]=20\
		&filter[status][]=stock&filter[name][op]=is_set";
	let params = RequestParams::from_query_string(query).unwrap();
	let store = StateStore::from_params(None, descriptors.clone(), StateDefaults::default(), &params);

	let grid = GridState::from_table_state(store.state());
	assert_eq!(grid.pagination.page_index, 2);

	let next = RequestParams::from_query_string(&grid.to_wire_params().to_query_string(None)).unwrap();
	let reparsed = StateStore::from_params(None, descriptors, StateDefaults::default(), &next);
	let (before, after) = (store.state(), reparsed.state());

	assert_eq!(after.sort, before.sort);
	assert_eq!((after.page, after.per_page), (3, 20));
	assert_eq!(after.search.as_deref(), Some("dell"));
	let active = |state: &tablekit_core::TableState| {
		state
			.active_filters()
			.map(|(attribute, filter)| (attribute.clone(), filter.clause))
			.collect::<Vec<_>>()
	};
	assert_eq!(active(after), active(before));
	assert_eq!(active(after).len(), 3);
}

#[test]
fn test_hiding_one_column_keeps_the_rest_visible_on_the_server() {
	let mut grid = GridState::default();
	grid.column_visibility.insert("serial".to_string(), false);

	let server = server_state(&grid);
	let fields = server.fields.as_deref();
	assert!(!is_field_visible(fields, "serial"));
	assert!(is_field_visible(fields, "notes"));
	assert!(is_field_visible(fields, "created_at"));

	let back = GridState::from_table_state(&server);
	assert_eq!(back.column_visibility, grid.column_visibility);
}

#[test]
fn test_extreme_page_numbers_round_trip() {
	let wire = WireParams {
		page: Some(u64::MAX),
		per_page: Some(100),
		..Default::default()
	};
	let grid = GridState::from_wire(&wire, 15);
	assert_eq!(grid.pagination.page_index, u64::MAX - 1);
	assert_eq!(grid.to_wire_params().page, Some(u64::MAX));

	let mut controller =
		GridController::new("assets", GridState::default(), MemoryStorage::new(), GridSettings::default());
	let request = controller.set_page_index(u64::MAX);
	assert_eq!(request.params.page, Some(u64::MAX));

	let server = server_state(controller.state());
	assert_eq!(server.page, u64::MAX);
}
