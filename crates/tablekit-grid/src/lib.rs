//! Client-side state layer for tablekit grids
//!
//! The server renders a table's canonical [`TableState`](tablekit_core::TableState);
//! a grid component works with sorting lists, column filters, a global
//! filter and 0-based pagination. This crate keeps the two consistent:
//!
//! - [`GridState`] converts from the server state and the wire parameters,
//!   and back to [`WireParams`](tablekit_core::WireParams) for the next
//!   request (`page == page_index + 1`, `-` marks descending sorts).
//! - [`StateCache`] persists each grid under `tableState:<tableKey>` with a
//!   version stamp, and can clear one table or all of them.
//! - [`Debouncer`] holds back global filter input until typing pauses.
//! - [`FetchTracker`] versions requests so stale responses are dropped.
//! - [`GridController`] ties these together for one grid.
//!
//! # Example
//!
//! ```
//! use tablekit_grid::{GridController, GridSettings, GridState, MemoryStorage};
//!
//! let mut grid = GridController::new("assets", GridState::default(), MemoryStorage::new(), GridSettings::default());
//!
//! let first = grid.set_global_filter("del");
//! let second = grid.set_global_filter("dell");
//! assert_eq!(second.query_string(None), "filter%5Bsearch%5D=dell&page=1&per_page=15");
//!
//! // The response to the first request arrived late.
//! assert!(!grid.accept(first.version));
//! ```

pub mod cache;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod settings;
pub mod state;
pub mod storage;
pub mod tracker;

pub use cache::{STORAGE_KEY_PREFIX, StateCache};
pub use controller::{FetchRequest, GridController};
pub use debounce::Debouncer;
pub use error::{StorageError, StorageResult};
pub use settings::GridSettings;
pub use state::{ColumnFilter, GridState, PaginationState, SortingEntry};
pub use storage::{MemoryStorage, StateStorage};
pub use tracker::FetchTracker;
