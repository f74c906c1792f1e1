//! Pluggable sort and filter strategies
//!
//! Columns that need more than a plain `ORDER BY column` or the built-in
//! operator translation supply a strategy object. Strategies receive the
//! [`QueryContext`] so they can reuse registered joins.

use crate::context::{QueryContext, QueryStep};
use sea_query::{Alias, Expr, Func};
use std::fmt;
use tablekit_core::{DottedPath, FilterState};

/// Translates one sort directive into `ORDER BY` terms
pub trait SortStrategy: Send + Sync + fmt::Debug {
	/// Short name shown in debug output
	fn name(&self) -> &str {
		"custom"
	}

	/// Applies the sort for `attribute` to the query under construction
	fn apply(&self, ctx: &mut QueryContext<'_>, descending: bool, attribute: &str);
}

/// Translates one active filter into query predicates
pub trait FilterStrategy: Send + Sync + fmt::Debug {
	/// Applies the filter for `attribute` to the query under construction
	fn apply(&self, ctx: &mut QueryContext<'_>, attribute: &str, filter: &FilterState);
}

/// Sorts by a column reached through relations
///
/// A chain of to-one relations is sorted through a correlated scalar
/// sub-query so rows are never duplicated. A chain with any to-many hop,
/// such as `assignments.user.name`, reaches several rows per base row: it is
/// left joined under the flattened path alias and sorted by the smallest
/// (ascending) or largest (descending) related value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationSort;

impl SortStrategy for RelationSort {
	fn name(&self) -> &str {
		"relation"
	}

	fn apply(&self, ctx: &mut QueryContext<'_>, descending: bool, attribute: &str) {
		let path = DottedPath::new(attribute);
		let Some(prefix) = path.relation_prefix() else {
			let column = ctx.column(attribute);
			ctx.order_by(column, descending);
			ctx.record(QueryStep::Sort {
				key: attribute.to_string(),
				descending,
			});
			return;
		};

		let Some(chain) = ctx.resolve(&path) else {
			ctx.skip(attribute, format!("'{prefix}' is not a relation chain"));
			return;
		};
		let to_one = chain.iter().all(|relation| relation.is_to_one());

		if to_one {
			let Some(expr) = ctx.scalar_subquery(prefix, path.attribute()) else {
				ctx.skip(attribute, format!("'{prefix}' is not a relation chain"));
				return;
			};
			ctx.order_by(expr, descending);
			ctx.record(QueryStep::SubquerySort {
				key: attribute.to_string(),
				relation: prefix.to_string(),
				descending,
			});
		} else {
			let Some(alias) = ctx.ensure_join(prefix) else {
				ctx.skip(attribute, format!("'{prefix}' is not a relation chain"));
				return;
			};
			let column = Expr::col((Alias::new(&alias), Alias::new(path.attribute())));
			let aggregate = if descending {
				Func::max(column)
			} else {
				Func::min(column)
			};
			ctx.order_by(aggregate, descending);
			ctx.record(QueryStep::JoinSort {
				key: attribute.to_string(),
				alias,
				descending,
			});
		}
	}
}
