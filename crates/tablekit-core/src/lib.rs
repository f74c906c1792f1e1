//! Core vocabulary and request state for tablekit
//!
//! This crate holds everything about a table that does not touch a
//! database:
//!
//! - **Operators**: the closed comparison vocabulary with arity metadata
//!   and direct SQL mappings ([`Operator`], [`FilterType`])
//! - **Filter descriptors**: declared filters and their canonical parsed
//!   state ([`FilterDescriptor`], [`FilterState`])
//! - **Request parameters**: bracketed query strings decoded into a nested
//!   tree ([`RequestParams`]) and the flat wire shape ([`WireParams`])
//! - **State store**: request parsing, merging with declared filters,
//!   presets and explicit mutations ([`StateStore`], [`TableState`])
//! - **Settings**: pagination and search configuration ([`TableSettings`])
//!
//! # Example
//!
//! ```
//! use tablekit_core::{FilterDescriptor, FilterType, Operator, RequestParams, StateStore, TableSettings};
//!
//! let settings = TableSettings::default();
//! let params = RequestParams::from_query_string(
//!     "filter[name][op]=starts_with&filter[name][value]=Del&sort=-created_at",
//! ).unwrap();
//!
//! let store = StateStore::from_params(
//!     None,
//!     vec![FilterDescriptor::new("name", FilterType::Text)],
//!     settings.state_defaults(["name"]),
//!     &params,
//! );
//!
//! let name = &store.state().filters["name"];
//! assert!(name.enabled);
//! assert_eq!(name.clause, Some(Operator::StartsWith));
//! assert_eq!(store.state().sort, vec!["-created_at"]);
//! ```

pub mod error;
pub mod filter;
pub mod operator;
pub mod params;
pub mod path;
pub mod preset;
pub mod settings;
pub mod state;
pub mod value;
pub mod wire;

pub use error::{
	ConfigurationError, OperatorError, OperatorResult, SettingsError, SettingsResult, StateError,
	StateResult,
};
pub use filter::{FilterDescriptor, FilterOption, FilterState};
pub use operator::{FilterType, Operator};
pub use params::RequestParams;
pub use path::{DottedPath, flatten_alias, humanize};
pub use preset::Preset;
pub use settings::{SqlDialect, TableSettings};
pub use state::{
	SortKey, StateDefaults, StateStore, TableState, is_field_visible, parse_sort,
};
pub use value::{is_present, is_value_valid, positive_integer, scalar_to_string};
pub use wire::{SEARCH_FILTER_KEY, WireFilter, WireParams};
