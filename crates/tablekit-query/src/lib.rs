//! Query resolution for server-driven tables
//!
//! A [`Table`] declares a [`Resource`], its [`Column`]s and optional filters,
//! eager loads, default sort and presets. A [`TableView`] binds the table to
//! the parameters of one request and turns the resulting state into SQL:
//!
//! - **Filters** become `WHERE` predicates. Filters on related columns use
//!   correlated `EXISTS` sub-queries so the base rows are never duplicated.
//! - **Search** is an `OR` group over every searchable column.
//! - **Sorts** order by base columns, by a correlated sub-query for to-one
//!   relations, or through a single left join for to-many relations.
//! - **Toggles** narrow the projection to the requested `fields`.
//!
//! Statements are built with `sea-query` and executed by a
//! [`TableBackend`]. [`SqliteBackend`] is provided behind the `sqlite`
//! feature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tablekit_core::{FilterType, RequestParams, SqlDialect, TableSettings};
//! use tablekit_query::{Column, Resource, Table, TableView};
//!
//! struct Assets(Resource);
//!
//! impl Table for Assets {
//!     fn resource(&self) -> &Resource {
//!         &self.0
//!     }
//!
//!     fn columns(&self) -> Vec<Column> {
//!         vec![
//!             Column::new("name").sortable().searchable().filter(FilterType::Text),
//!             Column::new("category.name").sortable(),
//!         ]
//!     }
//! }
//!
//! let categories = Arc::new(Resource::new("categories"));
//! let table = Assets(Resource::new("assets").belongs_to("category", categories, "category_id"));
//! let params = RequestParams::from_query_string("filter[name][op]=starts_with&filter[name][value]=Del&sort=-name").unwrap();
//!
//! let view = TableView::new(&table, TableSettings::default(), &params).unwrap();
//! let debug = view.debug(SqlDialect::Postgres);
//! assert!(debug.sql.contains(r#""assets"."name" LIKE 'Del%'"#));
//! assert!(debug.sql.contains(r#"ORDER BY "assets"."name" DESC"#));
//! ```

pub mod backend;
pub mod column;
pub mod context;
pub mod eager;
pub mod error;
pub mod export;
pub mod filter_set;
pub mod pagination;
pub mod resource;
pub mod schema;
pub mod sort_set;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod strategy;
pub mod table;
pub mod toggle_set;
pub mod view;

pub use backend::{Row, TableBackend, render};
pub use column::{Column, SortDirective, SortStrategyKind, SortType};
pub use context::{QueryContext, QueryStep, escape_like, like_pattern};
pub use eager::EagerLoader;
pub use error::{ResourceValidationError, TableError, TableResult};
pub use export::{CsvExporter, cell};
pub use filter_set::{FilterSet, SearchDirective, operator_condition};
pub use pagination::{PageLinks, Paginated, page_offset};
pub use resource::{Relation, RelationKind, Resource};
pub use schema::{
	ColumnSchema, FilterSchema, OperatorSchema, PresetSchema, SchemaMeta, TableSchema,
	filter_summary,
};
pub use sort_set::SortSet;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
pub use strategy::{FilterStrategy, RelationSort, SortStrategy};
pub use table::Table;
pub use toggle_set::ToggleSet;
pub use view::{QueryDebug, TableView, ValidationReport, validate_table};
