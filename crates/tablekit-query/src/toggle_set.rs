//! Toggleable column projection

use crate::column::Column;
use sea_query::{Alias, Asterisk, SelectStatement};
use tablekit_core::is_field_visible;

/// Which base columns are selected
///
/// Without toggleable columns every base column is selected. Otherwise the
/// select list is the primary key, the direct columns that are always shown,
/// the visible toggleable ones and any key eager loading needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleSet {
	fixed: Vec<String>,
	toggleable: Vec<String>,
}

impl ToggleSet {
	pub fn new(columns: &[Column]) -> Self {
		let mut set = Self::default();
		for column in columns {
			if column.is_toggleable() {
				set.toggleable.push(column.name().to_string());
			} else if !column.path().is_relation() {
				set.fixed.push(column.name().to_string());
			}
		}
		set
	}

	/// Returns whether any column can be toggled
	pub fn is_active(&self) -> bool {
		!self.toggleable.is_empty()
	}

	pub fn toggleable(&self) -> &[String] {
		&self.toggleable
	}

	/// Toggleable columns shown for a `fields` selection
	///
	/// `None` shows them all; names that are not toggleable are ignored.
	pub fn visible<'a>(&'a self, fields: Option<&[String]>) -> Vec<&'a str> {
		self.toggleable
			.iter()
			.filter(|name| is_field_visible(fields, name))
			.map(String::as_str)
			.collect()
	}

	/// Returns whether a column is shown for a `fields` selection
	pub fn is_visible(&self, name: &str, fields: Option<&[String]>) -> bool {
		!self.toggleable.iter().any(|t| t == name) || self.visible(fields).contains(&name)
	}

	/// Base columns selected for a `fields` selection, or `None` for `base.*`
	pub fn projection(
		&self,
		primary_key: &str,
		fields: Option<&[String]>,
		required: &[String],
	) -> Option<Vec<String>> {
		if !self.is_active() {
			return None;
		}
		let mut selected = vec![primary_key.to_string()];
		let visible = self
			.visible(fields)
			.into_iter()
			.filter(|name| !name.contains('.'))
			.map(str::to_string);
		for name in self
			.fixed
			.iter()
			.cloned()
			.chain(visible)
			.chain(required.iter().cloned())
		{
			if !selected.contains(&name) {
				selected.push(name);
			}
		}
		Some(selected)
	}

	/// Adds the select list to a statement
	pub fn apply(
		&self,
		select: &mut SelectStatement,
		base_alias: &str,
		primary_key: &str,
		fields: Option<&[String]>,
		required: &[String],
	) {
		match self.projection(primary_key, fields, required) {
			Some(columns) => {
				for column in columns {
					select.column((Alias::new(base_alias), Alias::new(column)));
				}
			}
			None => {
				select.column((Alias::new(base_alias), Asterisk));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use sea_query::{Query, SqliteQueryBuilder};

	#[fixture]
	fn toggles() -> ToggleSet {
		ToggleSet::new(&[
			Column::new("name"),
			Column::new("serial").toggleable(),
			Column::new("notes").toggleable(),
			Column::new("category.name").toggleable(),
		])
	}

	#[rstest]
	fn test_without_toggleable_columns_selects_everything() {
		let set = ToggleSet::new(&[Column::new("name"), Column::new("price")]);
		assert_eq!(set.projection("id", None, &[]), None);

		let mut select = Query::select();
		select.from(Alias::new("assets"));
		set.apply(&mut select, "assets", "id", None, &[]);
		assert_eq!(
			select.to_string(SqliteQueryBuilder),
			r#"SELECT "assets".* FROM "assets""#
		);
	}

	#[rstest]
	fn test_all_toggleable_columns_visible_by_default(toggles: ToggleSet) {
		assert_eq!(
			toggles.projection("id", None, &[]).unwrap(),
			vec!["id", "name", "serial", "notes"]
		);
	}

	#[rstest]
	fn test_fields_restrict_toggleable_columns(toggles: ToggleSet) {
		let fields = vec!["notes".to_string(), "name".to_string()];
		assert_eq!(
			toggles
				.projection("id", Some(&fields), &["category_id".to_string()])
				.unwrap(),
			vec!["id", "name", "notes", "category_id"]
		);
		assert!(toggles.is_visible("name", Some(&fields)));
		assert!(!toggles.is_visible("serial", Some(&fields)));
		assert!(!toggles.is_visible("category.name", Some(&fields)));
	}

	#[rstest]
	fn test_hidden_fields_keep_the_other_toggleable_columns(toggles: ToggleSet) {
		let fields = vec!["-serial".to_string()];
		assert_eq!(
			toggles.projection("id", Some(&fields), &[]).unwrap(),
			vec!["id", "name", "notes"]
		);
		assert_eq!(toggles.visible(Some(&fields)), vec!["notes", "category.name"]);
		assert!(!toggles.is_visible("serial", Some(&fields)));

		assert_eq!(toggles.visible(Some(&[][..])), vec!["serial", "notes", "category.name"]);
	}
}
