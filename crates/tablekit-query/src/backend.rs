//! Query execution backends

use crate::error::{TableError, TableResult};
use async_trait::async_trait;
use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement, SqliteQueryBuilder};
use serde_json::{Map, Value};
use tablekit_core::SqlDialect;

/// One result row keyed by column name
pub type Row = Map<String, Value>;

/// Executes rendered select statements
///
/// The table layer only reads, so a backend needs nothing beyond fetching
/// rows. Values are converted to JSON so rows can be nested with their
/// eager-loaded relations and serialized as-is.
#[async_trait]
pub trait TableBackend: Send + Sync {
	/// SQL dialect statements are rendered in
	fn dialect(&self) -> SqlDialect;

	/// Runs a select and returns every row
	async fn fetch_all(&self, sql: &str) -> TableResult<Vec<Row>>;

	/// Runs a count query whose single row carries a `total` column
	async fn fetch_count(&self, sql: &str) -> TableResult<u64> {
		let rows = self.fetch_all(sql).await?;
		let total = rows
			.first()
			.and_then(|row| row.get("total"))
			.ok_or_else(|| TableError::Backend("count query returned no total".to_string()))?;
		match total {
			Value::Number(n) => n
				.as_u64()
				.or_else(|| n.as_f64().map(|f| f as u64))
				.ok_or_else(|| TableError::Backend(format!("invalid count: {n}"))),
			Value::String(s) => s
				.parse()
				.map_err(|_| TableError::Backend(format!("invalid count: {s}"))),
			other => Err(TableError::Backend(format!("invalid count: {other}"))),
		}
	}
}

/// Renders a statement with inlined values for a dialect
pub fn render(dialect: SqlDialect, statement: &SelectStatement) -> String {
	match dialect {
		SqlDialect::Postgres => statement.to_string(PostgresQueryBuilder),
		SqlDialect::Mysql => statement.to_string(MysqlQueryBuilder),
		SqlDialect::Sqlite => statement.to_string(SqliteQueryBuilder),
	}
}
