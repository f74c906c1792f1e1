//! Allowed sorts

use crate::column::{Column, SortDirective, SortStrategyKind};
use crate::context::{QueryContext, QueryStep};
use sea_query::{Alias, Expr};
use tablekit_core::{ConfigurationError, SortKey};

/// The sorts a table accepts, resolved once per table
#[derive(Debug, Clone, Default)]
pub struct SortSet {
	directives: Vec<SortDirective>,
}

impl SortSet {
	/// Resolves the sort of every sortable column
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::MissingSortStrategy`] when a custom sort
	/// has no strategy.
	pub fn new(columns: &[Column], base_table: &str) -> Result<Self, ConfigurationError> {
		let directives = columns
			.iter()
			.filter(|column| column.is_sortable())
			.map(|column| column.allowed_sort(base_table))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { directives })
	}

	pub fn directives(&self) -> &[SortDirective] {
		&self.directives
	}

	pub fn get(&self, name: &str) -> Option<&SortDirective> {
		self.directives.iter().find(|directive| directive.name == name)
	}

	pub fn allows(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Names of the sortable columns
	pub fn names(&self) -> Vec<String> {
		self.directives.iter().map(|d| d.name.clone()).collect()
	}

	/// Adds `ORDER BY` terms for the sort keys, in order
	///
	/// Keys that name no allowed sort are skipped.
	pub fn apply(&self, ctx: &mut QueryContext<'_>, keys: &[SortKey]) {
		for key in keys {
			let Some(directive) = self.get(&key.name) else {
				tracing::debug!(table = %ctx.base_alias(), sort = %key.name, "ignoring sort that is not allowed");
				ctx.record(QueryStep::Skipped {
					directive: key.to_token(),
					reason: "sort is not allowed".to_string(),
				});
				continue;
			};
			match &directive.strategy {
				SortStrategyKind::Field { table, column } => {
					ctx.order_by(
						Expr::col((Alias::new(table), Alias::new(column))),
						key.descending,
					);
					ctx.record(QueryStep::Sort {
						key: key.name.clone(),
						descending: key.descending,
					});
				}
				SortStrategyKind::Custom(strategy) => {
					let before = ctx.steps().len();
					strategy.apply(ctx, key.descending, &key.name);
					// Built-in strategies record their own step.
					if ctx.steps().len() == before {
						ctx.record(QueryStep::CustomSort {
							key: key.name.clone(),
							descending: key.descending,
						});
					}
				}
			}
		}
	}
}
