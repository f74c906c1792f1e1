//! Inbound request parameters
//!
//! Query strings use bracketed keys (`filter[name][op]=contains`,
//! `filter[tags][value][]=a`). [`RequestParams`] decodes them into a nested
//! JSON tree so the state parser sees the same shape whether the parameters
//! arrived in a query string or in a JSON body.

use crate::error::{StateError, StateResult};
use crate::value::scalar_to_string;
use serde_json::{Map, Value};

/// Nested parameter tree for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
	root: Map<String, Value>,
}

impl RequestParams {
	/// Creates an empty parameter tree
	pub fn new() -> Self {
		Self::default()
	}

	/// Decodes a URL query string
	///
	/// # Examples
	///
	/// ```
	/// use tablekit_core::RequestParams;
	///
	/// let params = RequestParams::from_query_string(
	///     "sort=-created_at&filter%5Bname%5D%5Bop%5D=contains&filter%5Bname%5D%5Bvalue%5D=dell",
	/// ).unwrap();
	///
	/// assert_eq!(params.get_string("sort").as_deref(), Some("-created_at"));
	/// assert_eq!(params.get("filter").unwrap()["name"]["op"], "contains");
	/// ```
	pub fn from_query_string(query: &str) -> StateResult<Self> {
		let query = query.strip_prefix('?').unwrap_or(query);
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
			.map_err(|e| StateError::MalformedQuery(e.to_string()))?;
		Ok(Self::from_pairs(pairs))
	}

	/// Builds the tree from already decoded key/value pairs
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut root = Value::Object(Map::new());
		for (key, value) in pairs {
			let segments = split_key(key.as_ref());
			insert_segments(&mut root, &segments, Value::String(value.into()));
		}
		let root = normalize(root);
		match root {
			Value::Object(map) => Self { root: map },
			_ => Self::default(),
		}
	}

	/// Wraps a JSON body; anything but an object yields an empty tree
	pub fn from_json(value: Value) -> Self {
		match value {
			Value::Object(map) => Self { root: map },
			_ => Self::default(),
		}
	}

	/// Looks up a top level parameter
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.root.get(key)
	}

	/// Looks up a top level scalar parameter as a string
	pub fn get_string(&self, key: &str) -> Option<String> {
		self.root.get(key).and_then(scalar_to_string)
	}

	/// Sets a top level parameter
	pub fn insert(&mut self, key: impl Into<String>, value: Value) {
		self.root.insert(key.into(), value);
	}

	/// Sets a parameter inside a table namespace, or at the top level for unnamed tables
	pub fn insert_scoped(&mut self, scope: Option<&str>, key: impl Into<String>, value: Value) {
		let Some(scope) = scope else {
			self.insert(key, value);
			return;
		};
		let slot = self
			.root
			.entry(scope.to_string())
			.or_insert_with(|| Value::Object(Map::new()));
		if !slot.is_object() {
			*slot = Value::Object(Map::new());
		}
		if let Value::Object(map) = slot {
			map.insert(key.into(), value);
		}
	}

	/// Removes a top level parameter
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.root.remove(key)
	}

	/// Returns whether the tree holds no parameters
	pub fn is_empty(&self) -> bool {
		self.root.is_empty()
	}

	/// The parameters belonging to one table
	///
	/// Named tables read from their own `<name>[...]` namespace so several
	/// tables can share one request; unnamed tables read the root.
	pub fn scoped(&self, name: Option<&str>) -> RequestParams {
		match name {
			None => self.clone(),
			Some(name) => match self.root.get(name) {
				Some(Value::Object(map)) => Self { root: map.clone() },
				_ => Self::default(),
			},
		}
	}

	/// Places these parameters under a table namespace
	pub fn namespaced(self, name: Option<&str>) -> RequestParams {
		match name {
			None => self,
			Some(name) => {
				let mut root = Map::new();
				root.insert(name.to_string(), Value::Object(self.root));
				Self { root }
			}
		}
	}

	/// The underlying JSON object
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.root
	}

	/// Consumes the tree into a JSON value
	pub fn into_json(self) -> Value {
		Value::Object(self.root)
	}

	/// Flattens the tree back into bracketed key/value pairs
	pub fn to_pairs(&self) -> Vec<(String, String)> {
		let mut pairs = Vec::new();
		for (key, value) in &self.root {
			flatten(key, value, &mut pairs);
		}
		pairs
	}

	/// Encodes the tree as a URL query string
	pub fn to_query_string(&self) -> String {
		// Encoding a list of string pairs cannot fail.
		serde_urlencoded::to_string(self.to_pairs()).unwrap_or_default()
	}
}

fn split_key(key: &str) -> Vec<String> {
	let Some(start) = key.find('[') else {
		return vec![key.to_string()];
	};
	if start == 0 {
		return vec![key.to_string()];
	}

	let mut segments = vec![key[..start].to_string()];
	let mut rest = &key[start..];
	while let Some(inner) = rest.strip_prefix('[') {
		match inner.find(']') {
			Some(end) => {
				segments.push(inner[..end].to_string());
				rest = &inner[end + 1..];
			}
			None => return vec![key.to_string()],
		}
	}
	if !rest.is_empty() {
		return vec![key.to_string()];
	}
	segments
}

fn insert_segments(target: &mut Value, segments: &[String], value: Value) {
	let Some((head, rest)) = segments.split_first() else {
		*target = value;
		return;
	};

	if head.is_empty() {
		if !target.is_array() {
			*target = Value::Array(Vec::new());
		}
		if let Value::Array(items) = target {
			let mut child = Value::Null;
			insert_segments(&mut child, rest, value);
			items.push(child);
		}
		return;
	}

	if !target.is_object() {
		*target = Value::Object(Map::new());
	}
	if let Value::Object(map) = target {
		let child = map.entry(head.clone()).or_insert(Value::Null);
		insert_segments(child, rest, value);
	}
}

/// Converts objects keyed `0..n` into arrays
fn normalize(value: Value) -> Value {
	match value {
		Value::Object(map) => {
			let indexed = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
			if indexed {
				let mut items: Vec<(usize, Value)> = map
					.into_iter()
					.filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, normalize(v))))
					.collect();
				items.sort_by_key(|(i, _)| *i);
				Value::Array(items.into_iter().map(|(_, v)| v).collect())
			} else {
				Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect())
			}
		}
		Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
		other => other,
	}
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
	match value {
		Value::Object(map) => {
			for (key, child) in map {
				flatten(&format!("{prefix}[{key}]"), child, out);
			}
		}
		Value::Array(items) => {
			for (index, item) in items.iter().enumerate() {
				if item.is_object() || item.is_array() {
					flatten(&format!("{prefix}[{index}]"), item, out);
				} else {
					flatten(&format!("{prefix}[]"), item, out);
				}
			}
		}
		scalar => {
			if let Some(text) = scalar_to_string(scalar) {
				out.push((prefix.to_string(), text));
			}
		}
	}
}
