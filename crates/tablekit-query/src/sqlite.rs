//! SQLite backend

use crate::backend::{Row, TableBackend};
use crate::error::TableResult;
use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as SqlxRow, SqlitePool, TypeInfo, ValueRef};
use std::sync::Arc;
use tablekit_core::SqlDialect;

/// Runs table queries on a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteBackend {
	pool: Arc<SqlitePool>,
}

impl SqliteBackend {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	fn convert_row(sqlite_row: &SqliteRow) -> TableResult<Row> {
		let mut row = Row::new();
		for column in sqlite_row.columns() {
			let index = column.ordinal();
			let name = column.name().to_string();

			if sqlite_row.try_get_raw(index)?.is_null() {
				row.insert(name, Value::Null);
				continue;
			}

			// SQLite stores booleans as integers; only the declared type tells them apart.
			let declared = column.type_info().name().to_uppercase();
			let value = if declared.contains("BOOL") {
				sqlite_row
					.try_get::<i64, _>(index)
					.map(|v| Value::Bool(v != 0))
					.unwrap_or(Value::Null)
			} else if let Ok(v) = sqlite_row.try_get::<i64, _>(index) {
				Value::from(v)
			} else if let Ok(v) = sqlite_row.try_get::<f64, _>(index) {
				Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
			} else if let Ok(v) = sqlite_row.try_get::<String, _>(index) {
				Value::String(v)
			} else if let Ok(v) = sqlite_row.try_get::<Vec<u8>, _>(index) {
				Value::String(String::from_utf8_lossy(&v).into_owned())
			} else {
				tracing::warn!(column = %name, declared = %declared, "unreadable column value, using null");
				Value::Null
			};
			row.insert(name, value);
		}
		Ok(row)
	}
}

#[async_trait]
impl TableBackend for SqliteBackend {
	fn dialect(&self) -> SqlDialect {
		SqlDialect::Sqlite
	}

	async fn fetch_all(&self, sql: &str) -> TableResult<Vec<Row>> {
		tracing::debug!(sql = %sql, "executing table query");
		let rows = sqlx::query(sql).fetch_all(self.pool.as_ref()).await?;
		rows.iter().map(Self::convert_row).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use serde_json::json;
	use sqlx::sqlite::SqlitePoolOptions;

	async fn backend() -> SqliteBackend {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		sqlx::query(
			"CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL, active BOOLEAN, notes TEXT)",
		)
		.execute(&pool)
		.await
		.unwrap();
		sqlx::query("INSERT INTO items VALUES (1, 'Laptop', 999.5, 1, NULL)")
			.execute(&pool)
			.await
			.unwrap();
		SqliteBackend::new(pool)
	}

	#[rstest]
	#[tokio::test]
	async fn test_rows_are_converted_to_json() {
		let backend = backend().await;
		let rows = backend.fetch_all("SELECT * FROM items").await.unwrap();

		assert_eq!(rows.len(), 1);
		assert_eq!(
			Value::Object(rows[0].clone()),
			json!({"id": 1, "name": "Laptop", "price": 999.5, "active": true, "notes": null})
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_count_query() {
		let backend = backend().await;
		assert_eq!(
			backend
				.fetch_count("SELECT COUNT(*) AS total FROM items")
				.await
				.unwrap(),
			1
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_invalid_sql_is_a_backend_error() {
		let backend = backend().await;
		let err = backend.fetch_all("SELECT * FROM missing").await.unwrap_err();
		assert!(matches!(err, crate::TableError::Backend(_)));
	}
}
