//! Error types shared by the tablekit crates

use thiserror::Error;

/// Errors raised by the operator vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
	/// The operator string is not part of the vocabulary
	#[error("Unknown filter operator '{0}'")]
	Unknown(String),

	/// The operator has no 1:1 SQL comparison operator and needs dedicated translation
	#[error("Operator '{0}' has no direct SQL comparison operator")]
	NoDirectSqlMapping(String),
}

/// Programmer errors in a table definition
///
/// These are raised as soon as a table or column is constructed or first
/// queried and are never recoverable at request time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	/// A sort was requested from a column that is not sortable
	#[error("Column '{0}' is not sortable")]
	NotSortable(String),

	/// A column uses the custom sort type without supplying a strategy
	#[error("Column '{0}' uses a custom sort but no sort strategy was supplied")]
	MissingSortStrategy(String),

	/// A column uses the custom filter type without supplying a strategy
	#[error("Column '{0}' uses a custom filter but no filter implementation was supplied")]
	MissingFilterStrategy(String),

	/// Two columns share the same name
	#[error("Column '{0}' is declared more than once")]
	DuplicateColumn(String),
}

/// Errors raised by explicit state mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
	/// The attribute has no declared filter descriptor
	#[error("No filter is declared for attribute '{0}'")]
	UnknownFilter(String),

	/// The preset name is not declared by the table
	#[error("Unknown filter preset '{0}'")]
	UnknownPreset(String),

	/// The query string could not be decoded
	#[error("Malformed query string: {0}")]
	MalformedQuery(String),
}

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The settings file could not be read
	#[error("Failed to read table settings from {path}: {message}")]
	Io {
		/// Path of the settings file
		path: String,
		/// Underlying I/O error
		message: String,
	},

	/// The settings source could not be parsed
	#[error("Failed to parse table settings: {0}")]
	Parse(#[from] toml::de::Error),

	/// A setting value is out of range
	#[error("Invalid table setting '{field}': {message}")]
	Invalid {
		/// Name of the offending setting
		field: &'static str,
		/// Description of the problem
		message: String,
	},
}

/// Result type for operator lookups
pub type OperatorResult<T> = Result<T, OperatorError>;

/// Result type for state mutations
pub type StateResult<T> = Result<T, StateError>;

/// Result type for settings loading
pub type SettingsResult<T> = Result<T, SettingsError>;
