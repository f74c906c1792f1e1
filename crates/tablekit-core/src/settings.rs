//! Table settings
//!
//! Settings can be built in code or loaded from a TOML document:
//!
//! ```toml
//! default_per_page = 25
//! max_per_page = 200
//! per_page_options = [25, 50, 100, 200]
//! case_insensitive_search = true
//! ```

use crate::error::{SettingsError, SettingsResult};
use crate::state::StateDefaults;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// SQL flavour a backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
	#[default]
	Postgres,
	Mysql,
	Sqlite,
}

impl fmt::Display for SqlDialect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Postgres => write!(f, "postgres"),
			Self::Mysql => write!(f, "mysql"),
			Self::Sqlite => write!(f, "sqlite"),
		}
	}
}

/// Pagination and search settings shared by the tables of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
	/// Page size used when the request does not pick one
	pub default_per_page: u64,

	/// Upper bound applied to the requested page size
	pub max_per_page: u64,

	/// Page sizes offered to the client
	pub per_page_options: Vec<u64>,

	/// Matches the global search term regardless of case
	pub case_insensitive_search: bool,

	/// Top level parameter accepted as an alternative to `filter[search]`
	pub search_param: String,
}

impl Default for TableSettings {
	fn default() -> Self {
		Self {
			default_per_page: 15,
			max_per_page: 100,
			per_page_options: vec![10, 15, 25, 50, 100],
			case_insensitive_search: false,
			search_param: "search".to_string(),
		}
	}
}

impl TableSettings {
	pub fn with_default_per_page(mut self, per_page: u64) -> Self {
		self.default_per_page = per_page;
		self
	}

	pub fn with_max_per_page(mut self, per_page: u64) -> Self {
		self.max_per_page = per_page;
		self
	}

	pub fn with_case_insensitive_search(mut self, enabled: bool) -> Self {
		self.case_insensitive_search = enabled;
		self
	}

	/// Parses and validates settings from a TOML string
	///
	/// Missing keys keep their default values.
	pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
		let settings: Self = toml::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Loads settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns error if the file cannot be read, parsed or validated.
	pub fn from_file(path: impl AsRef<Path>) -> SettingsResult<Self> {
		let content = std::fs::read_to_string(path.as_ref()).map_err(|e| SettingsError::Io {
			path: path.as_ref().display().to_string(),
			message: e.to_string(),
		})?;
		Self::from_toml_str(&content)
	}

	/// Checks the settings are consistent
	pub fn validate(&self) -> SettingsResult<()> {
		if self.default_per_page == 0 {
			return Err(SettingsError::Invalid {
				field: "default_per_page",
				message: "must be at least 1".to_string(),
			});
		}
		if self.max_per_page < self.default_per_page {
			return Err(SettingsError::Invalid {
				field: "max_per_page",
				message: format!(
					"must not be smaller than default_per_page ({})",
					self.default_per_page
				),
			});
		}
		if let Some(option) = self
			.per_page_options
			.iter()
			.find(|option| **option == 0 || **option > self.max_per_page)
		{
			return Err(SettingsError::Invalid {
				field: "per_page_options",
				message: format!("{option} is outside 1..={}", self.max_per_page),
			});
		}
		if self.search_param.trim().is_empty() {
			return Err(SettingsError::Invalid {
				field: "search_param",
				message: "must not be empty".to_string(),
			});
		}
		Ok(())
	}

	/// Defaults the state store falls back to
	pub fn state_defaults<I, S>(&self, default_sort: I) -> StateDefaults
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		StateDefaults {
			sort: default_sort.into_iter().map(Into::into).collect(),
			per_page: self.default_per_page,
			max_per_page: self.max_per_page,
			search_param: self.search_param.clone(),
		}
	}
}
