//! Filter directives and operator translation
//!
//! A [`FilterSet`] holds every filter a table accepts plus the optional
//! global search directive. Applying it to a [`QueryContext`] turns the
//! active filters of a [`TableState`] into `WHERE` predicates:
//!
//! - direct attributes compare `base.column`
//! - dotted attributes are wrapped in an `EXISTS` sub-query along the
//!   relation chain, so they never duplicate base rows
//! - custom filters delegate to their [`FilterStrategy`]
//! - the search term is an `OR` of `LIKE` matches over the searchable direct
//!   columns and one `EXISTS` per relation prefix

use crate::column::Column;
use crate::context::{QueryContext, QueryStep, like_pattern};
use crate::strategy::FilterStrategy;
use sea_query::{Alias, Condition, Expr, ExprTrait, Value as SeaValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tablekit_core::{
	ConfigurationError, DottedPath, FilterDescriptor, FilterState, FilterType, Operator, TableState,
	is_present, scalar_to_string,
};

/// One declared filter with its optional custom translation
#[derive(Debug, Clone)]
struct FilterEntry {
	descriptor: FilterDescriptor,
	strategy: Option<Arc<dyn FilterStrategy>>,
}

/// Columns matched by the global search term
///
/// Direct columns are listed as written; dotted columns are grouped by
/// relation prefix so one sub-query covers every column of a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchDirective {
	columns: Vec<String>,
	relations: BTreeMap<String, Vec<String>>,
}

impl SearchDirective {
	/// Builds the directive from the searchable columns, if there are any
	pub fn from_columns(columns: &[Column]) -> Option<Self> {
		let mut directive = Self::default();
		for column in columns.iter().filter(|c| c.is_searchable()) {
			match column.path().relation_prefix() {
				Some(prefix) => directive
					.relations
					.entry(prefix.to_string())
					.or_default()
					.push(column.path().attribute().to_string()),
				None => directive.columns.push(column.name().to_string()),
			}
		}
		(!directive.is_empty()).then_some(directive)
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty() && self.relations.is_empty()
	}

	/// Searchable base columns
	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	/// Searchable related columns keyed by relation prefix
	pub fn relations(&self) -> &BTreeMap<String, Vec<String>> {
		&self.relations
	}

	/// Every searchable path, dotted paths included
	pub fn paths(&self) -> Vec<String> {
		let mut paths = self.columns.clone();
		for (prefix, attributes) in &self.relations {
			paths.extend(attributes.iter().map(|attribute| format!("{prefix}.{attribute}")));
		}
		paths
	}

	/// Adds `(<direct LIKE> OR EXISTS (...) OR ...)` for a search term
	pub fn apply(&self, ctx: &mut QueryContext<'_>, term: &str) {
		let mut any = Condition::any();
		for column in &self.columns {
			any = any.add(ctx.search_match(ctx.column(column), term));
		}

		let mut relations = Vec::new();
		for (prefix, attributes) in &self.relations {
			let exists = ctx.exists(prefix, |alias| {
				let mut inner = Condition::any();
				for attribute in attributes {
					let column = Expr::col((Alias::new(alias), Alias::new(attribute)));
					inner = inner.add(ctx.search_match(column, term));
				}
				inner
			});
			match exists {
				Some(exists) => {
					any = any.add(exists);
					relations.push(prefix.clone());
				}
				None => ctx.skip(format!("search:{prefix}"), format!("'{prefix}' is not a relation chain")),
			}
		}

		if any.is_empty() {
			return;
		}
		ctx.and_where(any);
		ctx.record(QueryStep::Search {
			term: term.to_string(),
			columns: self.columns.clone(),
			relations,
		});
	}
}

/// Every filter a table accepts
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
	entries: Vec<FilterEntry>,
	search: Option<SearchDirective>,
}

impl FilterSet {
	/// Collects the filters of a table
	///
	/// Column filters come first in column order. A declared descriptor
	/// replaces the column-derived one of the same attribute and keeps the
	/// column's custom strategy.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::MissingFilterStrategy`] for a
	/// [`FilterType::Custom`] filter with no strategy.
	pub fn new(
		columns: &[Column],
		declared: Vec<FilterDescriptor>,
	) -> Result<Self, ConfigurationError> {
		let mut entries: Vec<FilterEntry> = columns
			.iter()
			.filter_map(|column| {
				column.filter_descriptor().map(|descriptor| FilterEntry {
					descriptor,
					strategy: column.filter_strategy().cloned(),
				})
			})
			.collect();

		for descriptor in declared {
			let strategy = columns
				.iter()
				.find(|column| column.name() == descriptor.attribute())
				.and_then(|column| column.filter_strategy().cloned());
			let entry = FilterEntry {
				descriptor,
				strategy,
			};
			match entries
				.iter_mut()
				.find(|existing| existing.descriptor.attribute() == entry.descriptor.attribute())
			{
				Some(existing) => *existing = entry,
				None => entries.push(entry),
			}
		}

		for entry in &entries {
			if entry.descriptor.filter_type() == FilterType::Custom && entry.strategy.is_none() {
				return Err(ConfigurationError::MissingFilterStrategy(
					entry.descriptor.attribute().to_string(),
				));
			}
		}

		Ok(Self {
			entries,
			search: SearchDirective::from_columns(columns),
		})
	}

	/// Descriptors handed to the state store and the schema
	pub fn descriptors(&self) -> Vec<FilterDescriptor> {
		self.entries.iter().map(|entry| entry.descriptor.clone()).collect()
	}

	pub fn descriptor(&self, attribute: &str) -> Option<&FilterDescriptor> {
		self.entries
			.iter()
			.map(|entry| &entry.descriptor)
			.find(|descriptor| descriptor.attribute() == attribute)
	}

	pub fn search(&self) -> Option<&SearchDirective> {
		self.search.as_ref()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Adds the predicates of every active filter and the search term
	pub fn apply(&self, ctx: &mut QueryContext<'_>, state: &TableState) {
		for (attribute, filter) in state.active_filters() {
			let Some(entry) = self
				.entries
				.iter()
				.find(|entry| entry.descriptor.attribute() == attribute)
			else {
				ctx.skip(attribute.clone(), "filter is not declared");
				continue;
			};
			match &entry.strategy {
				Some(strategy) => {
					strategy.apply(ctx, attribute, filter);
					ctx.record(QueryStep::CustomFilter {
						attribute: attribute.clone(),
					});
				}
				None => apply_filter(ctx, &entry.descriptor, filter),
			}
		}

		if let Some(term) = state.search.as_deref().filter(|term| !term.is_empty()) {
			match &self.search {
				Some(search) => search.apply(ctx, term),
				None => tracing::debug!(table = %ctx.base_alias(), "ignoring search term, no searchable columns"),
			}
		}
	}
}

/// Translates one built-in filter
fn apply_filter(ctx: &mut QueryContext<'_>, descriptor: &FilterDescriptor, filter: &FilterState) {
	let attribute = descriptor.attribute();
	let Some(clause) = filter.clause else {
		ctx.skip(attribute, "filter has no clause");
		return;
	};
	if !descriptor.allows(clause) {
		ctx.skip(attribute, format!("operator '{clause}' is not allowed"));
		return;
	}

	let path = DottedPath::new(attribute);
	let (Some(prefix), Some(alias)) = (path.relation_prefix(), path.relation_alias()) else {
		let Some(predicate) =
			operator_condition(ctx.column(attribute), clause, &filter.value, descriptor.filter_type())
		else {
			ctx.skip(attribute, format!("value does not fit operator '{clause}'"));
			return;
		};
		ctx.and_where(predicate);
		ctx.record(QueryStep::Filter {
			attribute: attribute.to_string(),
			clause,
		});
		return;
	};

	let column = Expr::col((Alias::new(&alias), Alias::new(path.attribute())));
	let Some(predicate) = operator_condition(column, clause, &filter.value, descriptor.filter_type())
	else {
		ctx.skip(attribute, format!("value does not fit operator '{clause}'"));
		return;
	};
	let Some(exists) = ctx.exists(prefix, |_| Condition::all().add(predicate)) else {
		ctx.skip(attribute, format!("'{prefix}' is not a relation chain"));
		return;
	};
	ctx.and_where(exists);
	ctx.record(QueryStep::RelationFilter {
		attribute: attribute.to_string(),
		relation: prefix.to_string(),
		clause,
	});
}

/// Builds the predicate for one operator applied to a column
///
/// Comparison operators map directly; pattern, range, set, null and boolean
/// operators are translated here. Returns `None` when the value does not
/// fit the operator.
///
/// # Examples
///
/// ```
/// use sea_query::{Alias, Expr, Query, SqliteQueryBuilder};
/// use serde_json::json;
/// use tablekit_core::{FilterType, Operator};
/// use tablekit_query::operator_condition;
///
/// let column = Expr::col((Alias::new("assets"), Alias::new("price")));
/// let predicate = operator_condition(column, Operator::Between, &json!(["10", "20"]), FilterType::Numeric).unwrap();
///
/// let sql = Query::select()
///     .column(Alias::new("id"))
///     .from(Alias::new("assets"))
///     .and_where(predicate)
///     .to_string(SqliteQueryBuilder);
/// assert!(sql.ends_with(r#"WHERE "assets"."price" BETWEEN 10 AND 20"#));
/// ```
pub fn operator_condition(
	column: Expr,
	clause: Operator,
	value: &Value,
	filter_type: FilterType,
) -> Option<Expr> {
	let expr = match clause {
		Operator::IsNull | Operator::IsNotSet => column.is_null(),
		Operator::IsNotNull | Operator::IsSet => column.is_not_null(),
		Operator::IsTrue => column.eq(true),
		Operator::IsFalse => column.eq(false),
		Operator::Contains => column.like(like_pattern(&text(value)?, true, true)),
		Operator::NotContains => column.not_like(like_pattern(&text(value)?, true, true)),
		Operator::StartsWith => column.like(like_pattern(&text(value)?, false, true)),
		Operator::EndsWith => column.like(like_pattern(&text(value)?, true, false)),
		Operator::Between | Operator::NotBetween => {
			let Value::Array(bounds) = value else {
				return None;
			};
			let [low, high] = bounds.as_slice() else {
				return None;
			};
			let low = sql_value(low, filter_type)?;
			let high = sql_value(high, filter_type)?;
			if clause == Operator::Between {
				column.between(low, high)
			} else {
				column.not_between(low, high)
			}
		}
		Operator::In | Operator::NotIn => {
			let Value::Array(items) = value else {
				return None;
			};
			let values: Vec<SeaValue> = items
				.iter()
				.filter(|item| is_present(item))
				.map(|item| sql_value(item, filter_type))
				.collect::<Option<_>>()?;
			if values.is_empty() {
				return None;
			}
			if clause == Operator::In {
				column.is_in(values)
			} else {
				column.is_not_in(values)
			}
		}
		Operator::Equals
		| Operator::NotEquals
		| Operator::GreaterThan
		| Operator::GreaterThanOrEqual
		| Operator::LessThan
		| Operator::LessThanOrEqual
		| Operator::Before
		| Operator::After
		| Operator::EqualOrBefore
		| Operator::EqualOrAfter => {
			let operand = sql_value(value, filter_type)?;
			match clause.to_sql_operator().ok()? {
				"=" => column.eq(operand),
				"!=" => column.ne(operand),
				">" => column.gt(operand),
				">=" => column.gte(operand),
				"<" => column.lt(operand),
				"<=" => column.lte(operand),
				_ => return None,
			}
		}
	};
	Some(expr)
}

fn text(value: &Value) -> Option<String> {
	scalar_to_string(value).filter(|s| !s.is_empty())
}

/// Converts one JSON scalar into a bound SQL value
///
/// Numeric filters coerce numeric strings so `"10"` compares as a number.
fn sql_value(value: &Value, filter_type: FilterType) -> Option<SeaValue> {
	match value {
		Value::Bool(b) => Some((*b).into()),
		Value::Number(n) => number(n),
		Value::String(s) if filter_type == FilterType::Numeric => {
			let trimmed = s.trim();
			if let Ok(int) = trimmed.parse::<i64>() {
				Some(int.into())
			} else {
				trimmed.parse::<f64>().ok().map(Into::into)
			}
		}
		Value::String(s) if filter_type == FilterType::Boolean => match s.as_str() {
			"1" | "true" => Some(true.into()),
			"0" | "false" => Some(false.into()),
			_ => None,
		},
		Value::String(s) => Some(s.clone().into()),
		Value::Null | Value::Array(_) | Value::Object(_) => None,
	}
}

fn number(n: &serde_json::Number) -> Option<SeaValue> {
	if let Some(int) = n.as_i64() {
		Some(int.into())
	} else {
		n.as_f64().map(Into::into)
	}
}
