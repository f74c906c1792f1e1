//! Query context shared by filter and sort strategies
//!
//! [`QueryContext`] wraps the select statement under construction together
//! with a registry of the joins already added, so every strategy that needs
//! a relation alias gets the same one. Every applied or skipped directive is
//! recorded as a [`QueryStep`] for [`TableView::debug`](crate::TableView::debug).

use crate::resource::{Relation, RelationKind, Resource};
use sea_query::{
	Alias, Condition, Expr, ExprTrait, Func, IntoCondition, JoinType, LikeExpr, Order, Query,
	QueryStatementBuilder,
	SelectStatement, SimpleExpr,
};
use serde::Serialize;
use tablekit_core::{DottedPath, Operator, flatten_alias};

/// One decision taken while building a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum QueryStep {
	/// Direct column filter
	Filter { attribute: String, clause: Operator },
	/// Filter on a related column through an `EXISTS` sub-query
	RelationFilter {
		attribute: String,
		relation: String,
		clause: Operator,
	},
	/// Filter translated by a caller-supplied strategy
	CustomFilter { attribute: String },
	/// Global search across searchable columns
	Search {
		term: String,
		columns: Vec<String>,
		relations: Vec<String>,
	},
	/// Sort on a base column
	Sort { key: String, descending: bool },
	/// Sort on a to-one relation through a correlated sub-query
	SubquerySort {
		key: String,
		relation: String,
		descending: bool,
	},
	/// Sort on a to-many relation through a left join
	JoinSort {
		key: String,
		alias: String,
		descending: bool,
	},
	/// Sort translated by a caller-supplied strategy
	CustomSort { key: String, descending: bool },
	/// Left join registered under an alias
	Join { alias: String, table: String },
	/// Directive that could not be applied
	Skipped { directive: String, reason: String },
}

/// One table reached while walking a relation chain
#[derive(Debug, Clone)]
struct Hop {
	table: String,
	alias: String,
	on: Expr,
}

/// Mutable state of one query under construction
pub struct QueryContext<'a> {
	resource: &'a Resource,
	select: SelectStatement,
	conditions: Condition,
	joins: Vec<String>,
	steps: Vec<QueryStep>,
	case_insensitive: bool,
}

impl<'a> QueryContext<'a> {
	/// Starts a select over the resource's table, aliased by its own name
	pub fn new(resource: &'a Resource) -> Self {
		let mut select = Query::select();
		select.from(Alias::new(resource.table()));
		Self {
			resource,
			select,
			conditions: Condition::all(),
			joins: Vec::new(),
			steps: Vec::new(),
			case_insensitive: false,
		}
	}

	/// Compares search terms regardless of case
	pub fn with_case_insensitive_search(mut self, enabled: bool) -> Self {
		self.case_insensitive = enabled;
		self
	}

	pub fn resource(&self) -> &'a Resource {
		self.resource
	}

	/// Alias of the base table
	pub fn base_alias(&self) -> &'a str {
		self.resource.table()
	}

	pub fn case_insensitive(&self) -> bool {
		self.case_insensitive
	}

	/// A base column qualified with the base alias
	pub fn column(&self, attribute: &str) -> Expr {
		Expr::col((Alias::new(self.base_alias()), Alias::new(attribute)))
	}

	/// Direct access to the statement for custom strategies
	pub fn query(&mut self) -> &mut SelectStatement {
		&mut self.select
	}

	/// Adds a predicate combined with `AND`
	pub fn and_where(&mut self, condition: impl IntoCondition) {
		let current = std::mem::replace(&mut self.conditions, Condition::all());
		self.conditions = current.add(condition);
	}

	/// Appends an `ORDER BY` expression
	pub fn order_by(&mut self, expr: impl Into<SimpleExpr>, descending: bool) {
		let order = if descending { Order::Desc } else { Order::Asc };
		self.select.order_by_expr(expr.into(), order);
	}

	pub fn record(&mut self, step: QueryStep) {
		self.steps.push(step);
	}

	/// Records a directive that was skipped and logs why
	pub fn skip(&mut self, directive: impl Into<String>, reason: impl Into<String>) {
		let directive = directive.into();
		let reason = reason.into();
		tracing::warn!(table = %self.base_alias(), directive = %directive, reason = %reason, "skipping query directive");
		self.steps.push(QueryStep::Skipped { directive, reason });
	}

	pub fn steps(&self) -> &[QueryStep] {
		&self.steps
	}

	/// Aliases of the joins added so far, in order
	pub fn joins(&self) -> &[String] {
		&self.joins
	}

	pub fn has_joins(&self) -> bool {
		!self.joins.is_empty()
	}

	/// Resolves the relation prefix of a dotted path against the base resource
	pub fn resolve(&self, path: &DottedPath) -> Option<Vec<&'a Relation>> {
		self.resource.resolve_relations(&path.relations())
	}

	/// Left joins every table along a relation chain
	///
	/// Each hop is aliased by its flattened relation path (`tags`,
	/// `assignments_user`) and joined at most once; later calls for the same
	/// path reuse the existing aliases. Returns the alias of the last table,
	/// or `None` when the chain does not resolve.
	pub fn ensure_join(&mut self, relation_path: &str) -> Option<String> {
		let segments: Vec<&str> = relation_path.split('.').collect();
		let chain = self.resource.resolve_relations(&segments)?;
		let hops = relation_hops(self.base_alias(), self.resource, &chain);
		let target = hops.last().map(|hop| hop.alias.clone());
		for hop in hops {
			if self.joins.contains(&hop.alias) {
				continue;
			}
			self.select.join_as(
				JoinType::LeftJoin,
				Alias::new(&hop.table),
				Alias::new(&hop.alias),
				hop.on,
			);
			self.steps.push(QueryStep::Join {
				alias: hop.alias.clone(),
				table: hop.table,
			});
			self.joins.push(hop.alias);
		}
		target
	}

	/// Builds `EXISTS (SELECT 1 FROM <relation chain> WHERE <correlation> AND <inner>)`
	///
	/// `inner` receives the alias of the last table on the chain. Returns
	/// `None` when the chain does not resolve.
	pub fn exists(
		&self,
		relation_path: &str,
		inner: impl FnOnce(&str) -> Condition,
	) -> Option<Expr> {
		let segments: Vec<&str> = relation_path.split('.').collect();
		let chain = self.resource.resolve_relations(&segments)?;
		let hops = relation_hops(self.base_alias(), self.resource, &chain);
		let (mut sub, target) = correlated_select(&hops)?;
		sub.expr(Expr::val(1));
		let condition = inner(&target);
		sub.cond_where(condition);
		Some(Expr::exists(sub))
	}

	/// Builds `(SELECT <alias>.<attribute> FROM <relation chain> WHERE <correlation> LIMIT 1)`
	pub fn scalar_subquery(&self, relation_path: &str, attribute: &str) -> Option<SimpleExpr> {
		let segments: Vec<&str> = relation_path.split('.').collect();
		let chain = self.resource.resolve_relations(&segments)?;
		let hops = relation_hops(self.base_alias(), self.resource, &chain);
		let (mut sub, target) = correlated_select(&hops)?;
		sub.expr(Expr::col((Alias::new(&target), Alias::new(attribute))));
		sub.limit(1);
		Some(SimpleExpr::SubQuery(
			None,
			Box::new(sub.into_sub_query_statement()),
		))
	}

	/// `LIKE` match of a search term, lowering both sides when case-insensitive
	pub fn search_match(&self, column: Expr, term: &str) -> Expr {
		if self.case_insensitive {
			Expr::expr(Func::lower(column)).like(like_pattern(&term.to_lowercase(), true, true))
		} else {
			column.like(like_pattern(term, true, true))
		}
	}

	/// Finishes the statement with the accumulated predicates
	pub fn finish(mut self) -> (SelectStatement, Vec<QueryStep>, Vec<String>) {
		if !self.conditions.is_empty() {
			self.select.cond_where(self.conditions);
		}
		(self.select, self.steps, self.joins)
	}
}

/// Escapes `%`, `_` and `\` in a `LIKE` operand
pub fn escape_like(raw: &str) -> String {
	raw.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_")
}

/// Builds an escaped `LIKE` operand with optional leading and trailing wildcards
pub fn like_pattern(raw: &str, leading: bool, trailing: bool) -> LikeExpr {
	let mut pattern = String::with_capacity(raw.len() + 2);
	if leading {
		pattern.push('%');
	}
	pattern.push_str(&escape_like(raw));
	if trailing {
		pattern.push('%');
	}
	LikeExpr::new(pattern).escape('\\')
}

/// Lists the tables along a relation chain with their join conditions
fn relation_hops(base_alias: &str, base: &Resource, chain: &[&Relation]) -> Vec<Hop> {
	let mut hops = Vec::with_capacity(chain.len());
	let mut from_alias = base_alias.to_string();
	let mut from_resource = base;
	let mut path = String::new();

	for relation in chain {
		if !path.is_empty() {
			path.push('.');
		}
		path.push_str(relation.name());
		let alias = flatten_alias(&path);
		let target = relation.target();

		match relation.kind() {
			RelationKind::BelongsTo { foreign_key } => hops.push(Hop {
				table: target.table().to_string(),
				alias: alias.clone(),
				on: Expr::col((Alias::new(&from_alias), Alias::new(foreign_key)))
					.equals((Alias::new(&alias), Alias::new(target.primary_key()))),
			}),
			RelationKind::HasOne { foreign_key } | RelationKind::HasMany { foreign_key } => {
				hops.push(Hop {
					table: target.table().to_string(),
					alias: alias.clone(),
					on: Expr::col((Alias::new(&alias), Alias::new(foreign_key)))
						.equals((Alias::new(&from_alias), Alias::new(from_resource.primary_key()))),
				})
			}
			RelationKind::BelongsToMany {
				pivot_table,
				foreign_pivot_key,
				related_pivot_key,
			} => {
				let pivot_alias = format!("{alias}_pivot");
				hops.push(Hop {
					table: pivot_table.clone(),
					alias: pivot_alias.clone(),
					on: Expr::col((Alias::new(&pivot_alias), Alias::new(foreign_pivot_key)))
						.equals((Alias::new(&from_alias), Alias::new(from_resource.primary_key()))),
				});
				hops.push(Hop {
					table: target.table().to_string(),
					alias: alias.clone(),
					on: Expr::col((Alias::new(&alias), Alias::new(target.primary_key())))
						.equals((Alias::new(&pivot_alias), Alias::new(related_pivot_key))),
				});
			}
		}

		from_alias = alias;
		from_resource = target;
	}
	hops
}

/// Starts a sub-query over a hop list, correlated with the outer query
///
/// The first hop is the `FROM` table and its join condition becomes the
/// correlation predicate; the remaining hops are inner joined.
fn correlated_select(hops: &[Hop]) -> Option<(SelectStatement, String)> {
	let (first, rest) = hops.split_first()?;
	let mut sub = Query::select();
	sub.from_as(Alias::new(&first.table), Alias::new(&first.alias));
	for hop in rest {
		sub.join_as(
			JoinType::InnerJoin,
			Alias::new(&hop.table),
			Alias::new(&hop.alias),
			hop.on.clone(),
		);
	}
	sub.and_where(first.on.clone());
	let target = hops.last().map(|hop| hop.alias.clone())?;
	Some((sub, target))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use sea_query::SqliteQueryBuilder;
	use std::sync::Arc;

	#[fixture]
	fn assets() -> Resource {
		let categories = Arc::new(Resource::new("categories"));
		let tags = Arc::new(Resource::new("tags"));
		let users = Arc::new(Resource::new("users"));
		let assignments = Arc::new(Resource::new("assignments").belongs_to("user", users, "user_id"));
		Resource::new("assets")
			.belongs_to("category", categories, "category_id")
			.belongs_to_many("tags", tags, "asset_tag", "asset_id", "tag_id")
			.has_many("assignments", assignments, "asset_id")
	}

	fn render(ctx: QueryContext<'_>) -> String {
		ctx.finish().0.to_string(SqliteQueryBuilder)
	}

	#[rstest]
	fn test_ensure_join_is_idempotent(assets: Resource) {
		let mut ctx = QueryContext::new(&assets);
		assert_eq!(ctx.ensure_join("tags").as_deref(), Some("tags"));
		assert_eq!(ctx.ensure_join("tags").as_deref(), Some("tags"));
		assert_eq!(ctx.joins(), &["tags_pivot".to_string(), "tags".to_string()]);

		let sql = render(ctx);
		assert_eq!(sql.matches("LEFT JOIN").count(), 2);
		assert!(sql.contains(r#"LEFT JOIN "asset_tag" AS "tags_pivot""#), "{sql}");
		assert!(sql.contains(r#"LEFT JOIN "tags" AS "tags""#), "{sql}");
	}

	#[rstest]
	fn test_nested_join_aliases_are_flattened(assets: Resource) {
		let mut ctx = QueryContext::new(&assets);
		assert_eq!(
			ctx.ensure_join("assignments.user").as_deref(),
			Some("assignments_user")
		);
		assert_eq!(
			ctx.joins(),
			&["assignments".to_string(), "assignments_user".to_string()]
		);
	}

	#[rstest]
	fn test_unknown_relation_does_not_join(assets: Resource) {
		let mut ctx = QueryContext::new(&assets);
		assert_eq!(ctx.ensure_join("owner"), None);
		assert!(!ctx.has_joins());
	}

	#[rstest]
	fn test_exists_is_correlated_with_base(assets: Resource) {
		let mut ctx = QueryContext::new(&assets);
		let exists = ctx
			.exists("category", |alias| {
				Condition::all().add(Expr::col((Alias::new(alias), Alias::new("name"))).eq("Laptops"))
			})
			.unwrap();
		ctx.and_where(exists);

		let sql = render(ctx);
		assert!(sql.contains("EXISTS"), "{sql}");
		assert!(sql.contains(r#"FROM "categories" AS "category""#), "{sql}");
		assert!(
			sql.contains(r#""assets"."category_id" = "category"."id""#),
			"{sql}"
		);
		assert!(!sql.contains("JOIN"), "{sql}");
	}

	#[rstest]
	fn test_scalar_subquery_orders_without_join(assets: Resource) {
		let mut ctx = QueryContext::new(&assets);
		let expr = ctx.scalar_subquery("category", "name").unwrap();
		ctx.order_by(expr, true);

		let sql = render(ctx);
		assert!(sql.contains(r#"ORDER BY (SELECT "category"."name" FROM "categories" AS "category""#), "{sql}");
		assert!(sql.contains("LIMIT 1) DESC"), "{sql}");
		assert!(!sql.contains("JOIN"), "{sql}");
	}

	#[rstest]
	#[case("50%_off", "50\\%\\_off")]
	#[case("a\\b", "a\\\\b")]
	#[case("plain", "plain")]
	fn test_escape_like(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(escape_like(raw), expected);
	}
}
