//! # Tablekit
//!
//! Server-driven data tables for Rust.
//!
//! A table is declared once on the server: its resource, columns, filters,
//! default sort and presets. Each request's query parameters are parsed into
//! a canonical [`TableState`], resolved into SQL, executed, and returned as a
//! paginated payload together with a schema describing the table. On the
//! client, [`GridController`] keeps a grid's sorting, filters and pagination
//! in step with the same wire format and persists it between visits.
//!
//! ## Feature Flags
//!
//! - `minimal` - Request state parsing only
//! - `query` - Query resolution, table contract, pagination, export
//! - `sqlite` - SQLite backend (implies `query`)
//! - `grid` - Client grid state synchronization
//! - `full` (default) - Everything above
//!
//! ## Crates
//!
//! - [`tablekit_core`]: operators, filter descriptors, wire parameters,
//!   the state store and settings
//! - `tablekit_query`: the [`Table`] contract and [`TableView`] resolver
//! - `tablekit_grid`: grid state, persistence, debouncing and fetch tracking
//!
//! ## Example
//!
//! ```
//! use tablekit::prelude::*;
//!
//! let params = RequestParams::from_query_string("sort=-price&page=2&filter[search]=dell").unwrap();
//! let store = StateStore::from_params(
//!     None,
//!     vec![FilterDescriptor::new("price", FilterType::Numeric)],
//!     StateDefaults::default(),
//!     &params,
//! );
//! assert_eq!(store.state().search.as_deref(), Some("dell"));
//!
//! # #[cfg(feature = "grid")]
//! # {
//! let grid = GridState::from_table_state(store.state());
//! assert_eq!(grid.pagination.page_index, 1);
//! assert_eq!(grid.to_wire_params(), store.state().to_wire_params());
//! # }
//! ```

pub use tablekit_core;
#[cfg(feature = "grid")]
pub use tablekit_grid;
#[cfg(feature = "query")]
pub use tablekit_query;

// Request state
pub use tablekit_core::{
	ConfigurationError, DottedPath, FilterDescriptor, FilterOption, FilterState, FilterType,
	Operator, OperatorError, Preset, RequestParams, SEARCH_FILTER_KEY, SettingsError, SortKey,
	SqlDialect, StateDefaults, StateError, StateStore, TableSettings, TableState, WireFilter,
	WireParams, is_field_visible,
};

// Query resolution
#[cfg(feature = "query")]
pub use tablekit_query::{
	Column, CsvExporter, EagerLoader, FilterStrategy, PageLinks, Paginated, QueryDebug, Relation,
	RelationKind, Resource, Row, SchemaMeta, SortStrategy, SortType, Table, TableBackend,
	TableError, TableResult, TableSchema, TableView, ValidationReport, validate_table,
};

#[cfg(feature = "sqlite")]
pub use tablekit_query::SqliteBackend;

// Client grid
#[cfg(feature = "grid")]
pub use tablekit_grid::{
	ColumnFilter, Debouncer, FetchRequest, FetchTracker, GridController, GridSettings, GridState,
	MemoryStorage, PaginationState, SortingEntry, StateCache, StateStorage, StorageError,
};

/// Convenience re-exports for table implementations
pub mod prelude {
	pub use crate::{
		FilterDescriptor, FilterState, FilterType, Operator, Preset, RequestParams, SortKey,
		StateDefaults, StateStore, TableSettings, TableState, WireParams,
	};

	#[cfg(feature = "query")]
	pub use crate::{
		Column, EagerLoader, Paginated, Resource, Row, Table, TableBackend, TableError,
		TableResult, TableSchema, TableView,
	};

	#[cfg(feature = "sqlite")]
	pub use crate::SqliteBackend;

	#[cfg(feature = "grid")]
	pub use crate::{
		ColumnFilter, FetchRequest, GridController, GridSettings, GridState, MemoryStorage,
		SortingEntry,
	};

	// External
	pub use async_trait::async_trait;
	pub use serde::{Deserialize, Serialize};
}
