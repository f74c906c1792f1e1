//! Paginated results and page links

use crate::backend::Row;
use serde::Serialize;
use serde_json::json;
use tablekit_core::RequestParams;

/// One page of results with navigation metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated {
	pub data: Vec<Row>,
	pub current_page: u64,
	pub per_page: u64,
	pub total: u64,
	pub last_page: u64,
	/// 1-based position of the first row, `None` for an empty page
	pub from: Option<u64>,
	pub to: Option<u64>,
	pub path: String,
	pub first_page_url: String,
	pub last_page_url: String,
	pub prev_page_url: Option<String>,
	pub next_page_url: Option<String>,
}

/// Builds page links that keep every other request parameter
///
/// Only the table's own (possibly namespaced) `page` parameter changes, so
/// several tables on one page keep each other's state.
#[derive(Debug, Clone)]
pub struct PageLinks<'a> {
	path: &'a str,
	params: &'a RequestParams,
	scope: Option<&'a str>,
}

impl<'a> PageLinks<'a> {
	pub fn new(path: &'a str, params: &'a RequestParams, scope: Option<&'a str>) -> Self {
		Self {
			path,
			params,
			scope,
		}
	}

	/// URL of a page
	///
	/// # Examples
	///
	/// ```
	/// use tablekit_core::RequestParams;
	/// use tablekit_query::PageLinks;
	///
	/// let params = RequestParams::from_query_string("users[page]=4&assets[page]=1").unwrap();
	/// let links = PageLinks::new("/inventory", &params, Some("assets"));
	///
	/// let url = links.url(2);
	/// assert!(url.starts_with("/inventory?"));
	/// assert!(url.contains("assets%5Bpage%5D=2"));
	/// assert!(url.contains("users%5Bpage%5D=4"));
	/// ```
	pub fn url(&self, page: u64) -> String {
		let mut params = self.params.clone();
		params.insert_scoped(self.scope, "page", json!(page));
		format!("{}?{}", self.path, params.to_query_string())
	}
}

/// Number of rows before a 1-based page
///
/// Saturates at `i64::MAX`, the largest `OFFSET` SQL engines accept, so any
/// page number from a request maps to a valid (possibly empty) page.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
	page.saturating_sub(1)
		.saturating_mul(per_page)
		.min(i64::MAX as u64)
}

impl Paginated {
	/// Wraps one page of rows
	pub fn new(data: Vec<Row>, page: u64, per_page: u64, total: u64, links: &PageLinks<'_>) -> Self {
		let page = page.max(1);
		let per_page = per_page.max(1);
		let last_page = total.div_ceil(per_page).max(1);
		let (from, to) = if data.is_empty() {
			(None, None)
		} else {
			let from = page_offset(page, per_page).saturating_add(1);
			(Some(from), Some(from.saturating_add(data.len() as u64 - 1)))
		};
		Self {
			current_page: page,
			per_page,
			total,
			last_page,
			from,
			to,
			path: links.path.to_string(),
			first_page_url: links.url(1),
			last_page_url: links.url(last_page),
			prev_page_url: (page > 1).then(|| links.url(page - 1)),
			next_page_url: (page < last_page).then(|| links.url(page + 1)),
			data,
		}
	}

	/// Wraps an unpaginated result as a single page
	pub fn single(data: Vec<Row>, links: &PageLinks<'_>) -> Self {
		let total = data.len() as u64;
		Self::new(data, 1, total, total, links)
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}
