//! Eager loading of related rows
//!
//! Relations named by [`Table::with`](crate::Table::with) are loaded with
//! one extra query per relation and attached to each row under the relation
//! name: an object (or `null`) for to-one relations, an array for to-many
//! ones. Only direct relations of the base resource are loaded.

use crate::backend::{Row, TableBackend, render};
use crate::error::TableResult;
use crate::resource::{Relation, RelationKind, Resource};
use sea_query::{Alias, Asterisk, Expr, ExprTrait, JoinType, Query, SelectStatement, Value as SeaValue};
use serde_json::Value;
use std::collections::HashMap;

/// Column carrying the owner key of a many-to-many row
const PIVOT_KEY: &str = "__pivot_key";

/// Loads the declared relations of a page of rows
#[derive(Debug)]
pub struct EagerLoader<'a> {
	resource: &'a Resource,
	relations: Vec<&'a Relation>,
}

impl<'a> EagerLoader<'a> {
	/// Resolves relation names, skipping the ones that are not declared
	pub fn new(resource: &'a Resource, names: &[String]) -> Self {
		let relations = names
			.iter()
			.filter_map(|name| {
				let relation = resource.relation(name);
				if relation.is_none() {
					tracing::warn!(table = %resource.table(), relation = %name, "skipping undeclared eager load");
				}
				relation
			})
			.collect();
		Self {
			resource,
			relations,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.relations.is_empty()
	}

	/// Base columns the loader reads keys from
	pub fn required_columns(&self) -> Vec<String> {
		let mut columns = Vec::new();
		for relation in &self.relations {
			let column = match relation.kind() {
				RelationKind::BelongsTo { foreign_key } => foreign_key.clone(),
				_ => self.resource.primary_key().to_string(),
			};
			if !columns.contains(&column) {
				columns.push(column);
			}
		}
		columns
	}

	/// Loads every relation and attaches it to the rows
	pub async fn load(&self, backend: &dyn TableBackend, rows: &mut [Row]) -> TableResult<()> {
		if rows.is_empty() {
			return Ok(());
		}
		for relation in &self.relations {
			let owner_column = match relation.kind() {
				RelationKind::BelongsTo { foreign_key } => foreign_key.as_str(),
				_ => self.resource.primary_key(),
			};
			let keys = distinct_keys(rows, owner_column);

			let mut grouped: HashMap<String, Vec<Row>> = HashMap::new();
			if let Some(select) = relation_select(self.resource, relation, &keys) {
				let sql = render(backend.dialect(), &select);
				tracing::debug!(relation = %relation.name(), sql = %sql, "eager loading relation");
				for mut related in backend.fetch_all(&sql).await? {
					let key_column = match relation.kind() {
						RelationKind::BelongsTo { .. } => relation.target().primary_key(),
						RelationKind::HasOne { foreign_key } | RelationKind::HasMany { foreign_key } => {
							foreign_key.as_str()
						}
						RelationKind::BelongsToMany { .. } => PIVOT_KEY,
					};
					let Some(key) = related.get(key_column).and_then(key_string) else {
						continue;
					};
					if matches!(relation.kind(), RelationKind::BelongsToMany { .. }) {
						related.remove(PIVOT_KEY);
					}
					grouped.entry(key).or_default().push(related);
				}
			}

			for row in rows.iter_mut() {
				let related = row
					.get(owner_column)
					.and_then(key_string)
					.and_then(|key| grouped.get(&key));
				let value = if relation.is_to_one() {
					related
						.and_then(|items| items.first())
						.map(|item| Value::Object(item.clone()))
						.unwrap_or(Value::Null)
				} else {
					Value::Array(
						related
							.map(|items| items.iter().cloned().map(Value::Object).collect())
							.unwrap_or_default(),
					)
				};
				row.insert(relation.name().to_string(), value);
			}
		}
		Ok(())
	}
}

/// Builds the query loading one relation for a set of owner keys
fn relation_select(owner: &Resource, relation: &Relation, keys: &[Value]) -> Option<SelectStatement> {
	let values: Vec<SeaValue> = keys.iter().filter_map(key_value).collect();
	if values.is_empty() {
		return None;
	}
	let target = relation.target();
	let table = Alias::new(target.table());
	let mut select = Query::select();
	select.from(table.clone()).column((table.clone(), Asterisk));

	match relation.kind() {
		RelationKind::BelongsTo { .. } => {
			select.and_where(Expr::col((table, Alias::new(target.primary_key()))).is_in(values));
		}
		RelationKind::HasOne { foreign_key } | RelationKind::HasMany { foreign_key } => {
			select.and_where(Expr::col((table, Alias::new(foreign_key))).is_in(values));
		}
		RelationKind::BelongsToMany {
			pivot_table,
			foreign_pivot_key,
			related_pivot_key,
		} => {
			let pivot = Alias::new(pivot_table);
			select
				.expr_as(
					Expr::col((pivot.clone(), Alias::new(foreign_pivot_key))),
					Alias::new(PIVOT_KEY),
				)
				.join(
					JoinType::InnerJoin,
					pivot.clone(),
					Expr::col((pivot.clone(), Alias::new(related_pivot_key)))
						.equals((table, Alias::new(target.primary_key()))),
				)
				.and_where(Expr::col((pivot, Alias::new(foreign_pivot_key))).is_in(values));
		}
	}
	tracing::trace!(owner = %owner.table(), relation = %relation.name(), "built eager load query");
	Some(select)
}

fn distinct_keys(rows: &[Row], column: &str) -> Vec<Value> {
	let mut keys: Vec<Value> = Vec::new();
	for key in rows.iter().filter_map(|row| row.get(column)) {
		if !key.is_null() && !keys.contains(key) {
			keys.push(key.clone());
		}
	}
	keys
}

/// Comparable form of a key value
fn key_string(value: &Value) -> Option<String> {
	match value {
		Value::Number(n) => Some(n.to_string()),
		Value::String(s) => Some(s.clone()),
		_ => None,
	}
}

fn key_value(value: &Value) -> Option<SeaValue> {
	match value {
		Value::Number(n) => n
			.as_i64()
			.map(SeaValue::from)
			.or_else(|| n.as_f64().map(SeaValue::from)),
		Value::String(s) => Some(s.clone().into()),
		_ => None,
	}
}
