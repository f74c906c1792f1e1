//! Persisted grid state
//!
//! Each grid's state is stored as JSON under `tableState:<tableKey>`:
//!
//! ```json
//! {"version": 1, "state": {"sorting": [], "columnFilters": [], ...}}
//! ```
//!
//! Entries written with another `version` are treated as absent, so a table
//! whose columns changed does not restore incompatible state. Storage is
//! best effort: failures are logged and never reach the caller.

use crate::state::GridState;
use crate::storage::StateStorage;
use serde::{Deserialize, Serialize};

/// Prefix of every persisted key
pub const STORAGE_KEY_PREFIX: &str = "tableState:";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
	version: u32,
	state: GridState,
}

/// Versioned grid state cache over a [`StateStorage`]
#[derive(Debug, Clone)]
pub struct StateCache<S: StateStorage> {
	storage: S,
	version: u32,
}

impl<S: StateStorage> StateCache<S> {
	pub fn new(storage: S, version: u32) -> Self {
		Self { storage, version }
	}

	pub fn storage(&self) -> &S {
		&self.storage
	}

	pub fn version(&self) -> u32 {
		self.version
	}

	/// Storage key of a table
	pub fn key(table_key: &str) -> String {
		format!("{STORAGE_KEY_PREFIX}{table_key}")
	}

	/// Restores the state of a table, if a compatible one was saved
	pub fn load(&self, table_key: &str) -> Option<GridState> {
		let key = Self::key(table_key);
		let raw = match self.storage.get_item(&key) {
			Ok(raw) => raw?,
			Err(e) => {
				tracing::warn!(key = %key, error = %e, "failed to read persisted grid state");
				return None;
			}
		};
		let persisted: PersistedState = match serde_json::from_str(&raw) {
			Ok(persisted) => persisted,
			Err(e) => {
				tracing::warn!(key = %key, error = %e, "discarding unreadable grid state");
				return None;
			}
		};
		if persisted.version != self.version {
			tracing::debug!(
				key = %key,
				stored = persisted.version,
				expected = self.version,
				"discarding grid state of another version"
			);
			return None;
		}
		Some(persisted.state)
	}

	/// Saves the state of a table
	pub fn save(&self, table_key: &str, state: &GridState) {
		let key = Self::key(table_key);
		let persisted = PersistedState {
			version: self.version,
			state: state.clone(),
		};
		let result = serde_json::to_string(&persisted)
			.map_err(Into::into)
			.and_then(|raw| self.storage.set_item(&key, &raw));
		if let Err(e) = result {
			tracing::warn!(key = %key, error = %e, "failed to persist grid state");
		}
	}

	/// Forgets the state of one table
	pub fn clear(&self, table_key: &str) {
		let key = Self::key(table_key);
		if let Err(e) = self.storage.remove_item(&key) {
			tracing::warn!(key = %key, error = %e, "failed to clear grid state");
		}
	}

	/// Forgets the state of every table, leaving unrelated keys alone
	pub fn clear_all(&self) {
		let keys = match self.storage.keys() {
			Ok(keys) => keys,
			Err(e) => {
				tracing::warn!(error = %e, "failed to list persisted grid states");
				return;
			}
		};
		for key in keys.iter().filter(|key| key.starts_with(STORAGE_KEY_PREFIX)) {
			if let Err(e) = self.storage.remove_item(key) {
				tracing::warn!(key = %key, error = %e, "failed to clear grid state");
			}
		}
	}
}
