//! Error types for table operations

use tablekit_core::{ConfigurationError, StateError};
use thiserror::Error;

/// Errors raised while resolving or executing a table query
#[derive(Debug, Error)]
pub enum TableError {
	/// The table definition is invalid
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	/// An explicit state mutation was rejected
	#[error(transparent)]
	State(#[from] StateError),

	/// The backing store failed to execute a query
	#[error("Backend error: {0}")]
	Backend(String),

	/// Export encoding failed
	#[error("Export error: {0}")]
	Export(String),
}

impl From<csv::Error> for TableError {
	fn from(err: csv::Error) -> Self {
		TableError::Export(err.to_string())
	}
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for TableError {
	fn from(err: sqlx::Error) -> Self {
		TableError::Backend(err.to_string())
	}
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Structural problems reported by [`TableView::validate`](crate::TableView::validate)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceValidationError {
	/// The resource does not name a table
	#[error("Resource has no table name")]
	MissingTable,

	/// The resource does not name a primary key
	#[error("Resource '{0}' has no primary key")]
	MissingPrimaryKey(String),

	/// The table declares no columns
	#[error("Table declares no columns")]
	NoColumns,

	/// A default sort key names no column
	#[error("Default sort '{0}' does not name a column")]
	UnknownDefaultSort(String),

	/// A default sort key names a column that is not sortable
	#[error("Default sort '{0}' names a column that is not sortable")]
	UnsortableDefaultSort(String),

	/// A dotted column does not follow declared relations
	#[error("Column '{0}' does not follow a declared relation chain")]
	UnresolvableColumn(String),

	/// An eager load names an undeclared relation
	#[error("Eager load '{0}' is not a declared relation")]
	UnknownEagerLoad(String),
}
