//! CSV export of table rows

use crate::backend::Row;
use crate::error::{TableError, TableResult};
use serde_json::Value;
use tablekit_core::{DottedPath, scalar_to_string};

/// Writes rows as CSV with one column per exported field
///
/// Each field is `(path, header)`. Dotted paths are read from the
/// eager-loaded relation objects; to-many relations are joined with `", "`.
pub struct CsvExporter;

impl CsvExporter {
	/// Encodes rows as CSV bytes, headers first
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use tablekit_query::CsvExporter;
	///
	/// let row = json!({"name": "Laptop", "category": {"name": "Computers"}});
	/// let rows = vec![row.as_object().unwrap().clone()];
	/// let fields = vec![
	///     ("name".to_string(), "Name".to_string()),
	///     ("category.name".to_string(), "Category".to_string()),
	/// ];
	///
	/// let csv = CsvExporter::export(&fields, &rows).unwrap();
	/// assert_eq!(String::from_utf8(csv).unwrap(), "Name,Category\nLaptop,Computers\n");
	/// ```
	pub fn export(fields: &[(String, String)], rows: &[Row]) -> TableResult<Vec<u8>> {
		let mut writer = csv::Writer::from_writer(Vec::new());
		writer.write_record(fields.iter().map(|(_, header)| header.as_str()))?;

		for row in rows {
			let record: Vec<String> = fields
				.iter()
				.map(|(path, _)| cell(row, &DottedPath::new(path.as_str())))
				.collect();
			writer.write_record(&record)?;
		}

		writer.flush().map_err(|e| TableError::Export(e.to_string()))?;
		writer
			.into_inner()
			.map_err(|e| TableError::Export(e.to_string()))
	}
}

/// Text of one cell, following a dotted path through nested objects
pub fn cell(row: &Row, path: &DottedPath) -> String {
	let segments = path.segments();
	let Some((first, rest)) = segments.split_first() else {
		return String::new();
	};
	row.get(*first)
		.map(|value| render(value, rest))
		.unwrap_or_default()
}

fn render(value: &Value, path: &[&str]) -> String {
	match (value, path.split_first()) {
		(Value::Array(items), _) => items
			.iter()
			.map(|item| render(item, path))
			.filter(|text| !text.is_empty())
			.collect::<Vec<_>>()
			.join(", "),
		(Value::Object(map), Some((head, rest))) => map
			.get(*head)
			.map(|child| render(child, rest))
			.unwrap_or_default(),
		(Value::Object(_), None) => String::new(),
		(scalar, None) => scalar_to_string(scalar).unwrap_or_default(),
		(_, Some(_)) => String::new(),
	}
}
