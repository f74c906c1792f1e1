//! The table contract

use crate::column::Column;
use crate::resource::Resource;
use sea_query::SelectStatement;
use tablekit_core::{FilterDescriptor, Preset};

/// A declarative, queryable and paginated dataset
///
/// Implementors declare what the table is made of; [`TableView`](crate::TableView)
/// does the parsing, querying and rendering.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tablekit_core::FilterType;
/// use tablekit_query::{Column, Resource, Table};
///
/// struct AssetsTable {
///     resource: Resource,
/// }
///
/// impl Table for AssetsTable {
///     fn name(&self) -> Option<&str> {
///         Some("assets")
///     }
///
///     fn resource(&self) -> &Resource {
///         &self.resource
///     }
///
///     fn columns(&self) -> Vec<Column> {
///         vec![
///             Column::new("name").sortable().searchable().filter(FilterType::Text),
///             Column::new("category.name").sortable().searchable(),
///         ]
///     }
///
///     fn default_sort(&self) -> Vec<String> {
///         vec!["name".to_string()]
///     }
/// }
///
/// let categories = Arc::new(Resource::new("categories"));
/// let table = AssetsTable {
///     resource: Resource::new("assets").belongs_to("category", categories, "category_id"),
/// };
/// assert_eq!(table.columns().len(), 2);
/// assert!(table.paginate());
/// ```
pub trait Table: Send + Sync {
	/// Namespace for request parameters; `None` reads the root
	fn name(&self) -> Option<&str> {
		None
	}

	/// The resource rows are read from
	fn resource(&self) -> &Resource;

	/// Displayable and queryable columns
	fn columns(&self) -> Vec<Column>;

	/// Filters beyond the ones columns declare, or replacing them
	fn filters(&self) -> Vec<FilterDescriptor> {
		Vec::new()
	}

	/// Relations loaded alongside each row
	fn with(&self) -> Vec<String> {
		Vec::new()
	}

	/// Sort used when the request has none, e.g. `["-created_at"]`
	fn default_sort(&self) -> Vec<String> {
		Vec::new()
	}

	/// Returns whether results are split into pages
	fn paginate(&self) -> bool {
		true
	}

	/// Page size overriding the configured default
	fn per_page(&self) -> Option<u64> {
		None
	}

	/// Named filter combinations
	fn presets(&self) -> Vec<Preset> {
		Vec::new()
	}

	/// Last chance to adjust the statement before it runs
	fn customize_query(&self, _query: &mut SelectStatement) {}
}
