//! Error types for client-local state storage

use thiserror::Error;

/// Failures of a [`StateStorage`](crate::StateStorage) backend
///
/// The cache treats every storage failure as best effort: errors are logged
/// and the grid keeps working with its in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The storage cannot be reached (disabled, private mode, ...)
	#[error("Storage unavailable: {0}")]
	Unavailable(String),

	/// The storage refused the write
	#[error("Storage quota exceeded for key '{0}'")]
	QuotaExceeded(String),

	/// A persisted entry could not be encoded or decoded
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
