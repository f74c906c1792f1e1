//! Client-local key/value storage

use crate::error::StorageResult;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Synchronous string storage, shaped like the browser's `localStorage`
pub trait StateStorage {
	fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

	fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

	fn remove_item(&self, key: &str) -> StorageResult<()>;

	/// Every stored key
	fn keys(&self) -> StorageResult<Vec<String>>;
}

/// In-memory storage
///
/// Clones share the same entries, so a grid and a test can observe one
/// store.
///
/// # Examples
///
/// ```
/// use tablekit_grid::{MemoryStorage, StateStorage};
///
/// let storage = MemoryStorage::new();
/// let shared = storage.clone();
/// storage.set_item("tableState:assets", "{}").unwrap();
///
/// assert_eq!(shared.get_item("tableState:assets").unwrap(), Some("{}".to_string()));
/// assert_eq!(shared.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
	data: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_data(data: HashMap<String, String>) -> Self {
		Self {
			data: Rc::new(RefCell::new(data)),
		}
	}

	pub fn len(&self) -> usize {
		self.data.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.borrow().is_empty()
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.data.borrow().contains_key(key)
	}
}

impl StateStorage for MemoryStorage {
	fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
		Ok(self.data.borrow().get(key).cloned())
	}

	fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
		self.data
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove_item(&self, key: &str) -> StorageResult<()> {
		self.data.borrow_mut().remove(key);
		Ok(())
	}

	fn keys(&self) -> StorageResult<Vec<String>> {
		Ok(self.data.borrow().keys().cloned().collect())
	}
}
