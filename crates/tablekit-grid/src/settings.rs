//! Grid settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client-side settings of a grid
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tablekit_grid::GridSettings;
///
/// let settings = GridSettings::default().with_debounce_ms(0);
/// assert_eq!(settings.debounce_delay(), Duration::ZERO);
/// assert_eq!(settings.storage_version, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
	/// Delay applied to global filter input; `0` disables debouncing
	pub debounce_ms: u64,

	/// Version stamped into persisted state; bump it when the table changes shape
	pub storage_version: u32,

	/// Page size used when neither the server nor the cache supplies one
	pub default_page_size: u64,
}

impl Default for GridSettings {
	fn default() -> Self {
		Self {
			debounce_ms: 300,
			storage_version: 1,
			default_page_size: 15,
		}
	}
}

impl GridSettings {
	pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
		self.debounce_ms = debounce_ms;
		self
	}

	pub fn with_storage_version(mut self, version: u32) -> Self {
		self.storage_version = version;
		self
	}

	pub fn with_default_page_size(mut self, page_size: u64) -> Self {
		self.default_page_size = page_size;
		self
	}

	pub fn debounce_delay(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}
}
