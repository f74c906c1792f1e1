//! A table bound to one request
//!
//! [`TableView`] composes the table's [`FilterSet`], [`SortSet`] and
//! [`ToggleSet`] with a [`StateStore`] parsed from the request, and runs the
//! resulting queries against a [`TableBackend`]. Every derived operation
//! (pagination, export, counts, schema, debug) goes through the same query
//! builder so they agree on filtering.

use crate::backend::{Row, TableBackend, render};
use crate::column::Column;
use crate::context::{QueryContext, QueryStep};
use crate::eager::EagerLoader;
use crate::error::{ResourceValidationError, TableResult};
use crate::export::CsvExporter;
use crate::filter_set::FilterSet;
use crate::pagination::{PageLinks, Paginated, page_offset};
use crate::schema::{ColumnSchema, FilterSchema, PresetSchema, SchemaMeta, TableSchema, filter_summary};
use crate::sort_set::SortSet;
use crate::table::Table;
use crate::toggle_set::ToggleSet;
use sea_query::{Alias, Asterisk, Expr, Func, Query, SelectStatement};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tablekit_core::{
	ConfigurationError, FilterState, RequestParams, SortKey, SqlDialect, StateStore, TableSettings,
	TableState,
};

/// Rendered queries and the decisions taken while building them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDebug {
	pub sql: String,
	pub count_sql: String,
	pub state: TableState,
	pub plan: Vec<QueryStep>,
	pub joins: Vec<String>,
}

/// Outcome of [`TableView::validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
	errors: Vec<ResourceValidationError>,
}

impl ValidationReport {
	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn errors(&self) -> &[ResourceValidationError] {
		&self.errors
	}

	fn push(&mut self, error: ResourceValidationError) {
		if !self.errors.contains(&error) {
			self.errors.push(error);
		}
	}
}

/// Checks a table definition for structural problems
///
/// Problems are collected rather than raised so a broken table can be
/// reported in full. [`TableView::validate`] runs the same checks.
pub fn validate_table<T: Table + ?Sized>(table: &T) -> ValidationReport {
	let mut report = ValidationReport::default();
	let resource = table.resource();
	let columns = table.columns();

	if resource.table().is_empty() {
		report.push(ResourceValidationError::MissingTable);
	}
	if resource.primary_key().is_empty() {
		report.push(ResourceValidationError::MissingPrimaryKey(
			resource.table().to_string(),
		));
	}
	if columns.is_empty() {
		report.push(ResourceValidationError::NoColumns);
	}

	for token in table.default_sort() {
		let key = SortKey::parse(&token);
		match columns.iter().find(|column| column.name() == key.name) {
			None => report.push(ResourceValidationError::UnknownDefaultSort(key.name)),
			Some(column) if !column.is_sortable() => {
				report.push(ResourceValidationError::UnsortableDefaultSort(key.name))
			}
			Some(_) => {}
		}
	}

	let filter_attributes = table.filters().into_iter().map(|d| d.attribute().to_string());
	let paths = columns
		.iter()
		.map(|column| column.name().to_string())
		.chain(filter_attributes);
	for path in paths {
		if path.contains('.') && resource.resolve(&path).is_none() {
			report.push(ResourceValidationError::UnresolvableColumn(path));
		}
	}

	for relation in table.with() {
		if resource.relation(&relation).is_none() {
			report.push(ResourceValidationError::UnknownEagerLoad(relation));
		}
	}
	report
}

/// A table bound to the parameters of one request
pub struct TableView<'t, T: Table + ?Sized> {
	table: &'t T,
	settings: TableSettings,
	columns: Vec<Column>,
	filters: FilterSet,
	sorts: SortSet,
	toggles: ToggleSet,
	store: StateStore,
	params: RequestParams,
	path: String,
}

impl<'t, T: Table + ?Sized> TableView<'t, T> {
	/// Resolves the table definition and parses the request state
	///
	/// # Errors
	///
	/// Returns [`TableError::Configuration`](crate::TableError::Configuration)
	/// when the table definition is invalid.
	pub fn new(table: &'t T, settings: TableSettings, params: &RequestParams) -> TableResult<Self> {
		let columns = table.columns();
		let mut seen = HashSet::new();
		for column in &columns {
			if !seen.insert(column.name()) {
				return Err(ConfigurationError::DuplicateColumn(column.name().to_string()).into());
			}
		}

		let filters = FilterSet::new(&columns, table.filters())?;
		let sorts = SortSet::new(&columns, table.resource().table())?;
		let toggles = ToggleSet::new(&columns);

		let mut defaults = settings.state_defaults(table.default_sort());
		if let Some(per_page) = table.per_page() {
			defaults.per_page = per_page;
		}
		let store = StateStore::from_params(
			table.name().map(str::to_string),
			filters.descriptors(),
			defaults,
			params,
		)
		.with_presets(table.presets());

		Ok(Self {
			table,
			settings,
			columns,
			filters,
			sorts,
			toggles,
			store,
			params: params.clone(),
			path: "/".to_string(),
		})
	}

	/// Sets the path page links point at
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	pub fn table(&self) -> &T {
		self.table
	}

	pub fn settings(&self) -> &TableSettings {
		&self.settings
	}

	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	pub fn filter_set(&self) -> &FilterSet {
		&self.filters
	}

	pub fn sort_set(&self) -> &SortSet {
		&self.sorts
	}

	pub fn toggle_set(&self) -> &ToggleSet {
		&self.toggles
	}

	pub fn store(&self) -> &StateStore {
		&self.store
	}

	/// The current state snapshot
	pub fn state(&self) -> &TableState {
		self.store.state()
	}

	pub fn set_state(&mut self, state: TableState) {
		self.store.set_state(state);
	}

	/// Parses and stores one filter entry
	///
	/// # Errors
	///
	/// Returns [`TableError::State`](crate::TableError::State) when the
	/// attribute has no declared filter.
	pub fn apply_filter(&mut self, attribute: &str, raw: &Value) -> TableResult<FilterState> {
		Ok(self.store.apply_filter(attribute, raw)?.clone())
	}

	pub fn reset(&mut self) {
		self.store.reset();
	}

	/// Switches to a named preset
	///
	/// # Errors
	///
	/// Returns [`TableError::State`](crate::TableError::State) for an
	/// unknown preset.
	pub fn apply_preset(&mut self, name: &str) -> TableResult<()> {
		self.store.apply_preset(name)?;
		Ok(())
	}

	/// Columns shown for the current `fields` selection, hidden ones excluded
	pub fn visible_columns(&self) -> Vec<&Column> {
		let fields = self.state().fields.as_deref();
		self.columns
			.iter()
			.filter(|column| !column.is_hidden() && self.toggles.is_visible(column.name(), fields))
			.collect()
	}

	/// Relations loaded with each row
	///
	/// The declared eager loads plus the first relation of every visible
	/// dotted column, so those columns have data to read.
	fn eager_relations(&self) -> Vec<String> {
		let mut names = self.table.with();
		for column in self.visible_columns() {
			if let Some(root) = column.path().relations().first()
				&& !names.iter().any(|name| name == *root)
			{
				names.push(root.to_string());
			}
		}
		names
	}

	fn context(&self) -> QueryContext<'t> {
		QueryContext::new(self.table.resource())
			.with_case_insensitive_search(self.settings.case_insensitive_search)
	}

	/// Builds the data query
	fn build(&self, loader: &EagerLoader<'_>, paginate: bool) -> (SelectStatement, Vec<QueryStep>, Vec<String>) {
		let resource = self.table.resource();
		let state = self.store.state();

		let mut ctx = self.context();
		self.filters.apply(&mut ctx, state);
		self.sorts.apply(&mut ctx, &state.sort_keys());
		let (mut select, steps, joins) = ctx.finish();

		self.toggles.apply(
			&mut select,
			resource.table(),
			resource.primary_key(),
			state.fields.as_deref(),
			&loader.required_columns(),
		);
		// To-many sort joins would otherwise repeat base rows.
		if !joins.is_empty() {
			select.group_by_col((Alias::new(resource.table()), Alias::new(resource.primary_key())));
		}
		if paginate && self.table.paginate() {
			select
				.limit(state.per_page)
				.offset(page_offset(state.page, state.per_page));
		}
		self.table.customize_query(&mut select);
		(select, steps, joins)
	}

	/// Builds `SELECT COUNT(*) AS total FROM (<matching base keys>)`
	fn count_query(&self, filtered: bool) -> SelectStatement {
		let resource = self.table.resource();
		let mut ctx = self.context();
		if filtered {
			self.filters.apply(&mut ctx, self.store.state());
		}
		let (mut inner, _, joins) = ctx.finish();
		let base = Alias::new(resource.table());
		let key = Alias::new(resource.primary_key());
		inner.column((base.clone(), key.clone()));
		if !joins.is_empty() {
			inner.group_by_col((base, key));
		}
		self.table.customize_query(&mut inner);

		Query::select()
			.expr_as(Func::count(Expr::col(Asterisk)), Alias::new("total"))
			.from_subquery(inner, Alias::new("matching"))
			.to_owned()
	}

	/// The data query for the current page
	pub fn query(&self) -> SelectStatement {
		let loader = EagerLoader::new(self.table.resource(), &self.eager_relations());
		self.build(&loader, true).0
	}

	async fn fetch(&self, backend: &dyn TableBackend, paginate: bool) -> TableResult<Vec<Row>> {
		let loader = EagerLoader::new(self.table.resource(), &self.eager_relations());
		let (select, _, _) = self.build(&loader, paginate);
		let sql = render(backend.dialect(), &select);
		tracing::debug!(table = %self.table.resource().table(), sql = %sql, "running table query");
		let mut rows = backend.fetch_all(&sql).await?;
		loader.load(backend, &mut rows).await?;
		Ok(rows)
	}

	/// Runs the query for the current page
	pub async fn paginate(&self, backend: &dyn TableBackend) -> TableResult<Paginated> {
		let links = PageLinks::new(&self.path, &self.params, self.table.name());
		if !self.table.paginate() {
			let rows = self.fetch(backend, false).await?;
			return Ok(Paginated::single(rows, &links));
		}
		let rows = self.fetch(backend, true).await?;
		let total = self.filtered_count(backend).await?;
		let state = self.store.state();
		Ok(Paginated::new(rows, state.page, state.per_page, total, &links))
	}

	/// Every matching row, filtered and sorted but not paginated
	pub async fn export(&self, backend: &dyn TableBackend) -> TableResult<Vec<Row>> {
		self.fetch(backend, false).await
	}

	/// Every matching row as CSV over the visible columns
	pub async fn export_csv(&self, backend: &dyn TableBackend) -> TableResult<Vec<u8>> {
		let rows = self.export(backend).await?;
		let fields: Vec<(String, String)> = self
			.visible_columns()
			.into_iter()
			.map(|column| (column.name().to_string(), column.label()))
			.collect();
		CsvExporter::export(&fields, &rows)
	}

	/// Number of rows before filtering
	pub async fn total_count(&self, backend: &dyn TableBackend) -> TableResult<u64> {
		let sql = render(backend.dialect(), &self.count_query(false));
		backend.fetch_count(&sql).await
	}

	/// Number of rows matching the active filters and search term
	pub async fn filtered_count(&self, backend: &dyn TableBackend) -> TableResult<u64> {
		let sql = render(backend.dialect(), &self.count_query(true));
		backend.fetch_count(&sql).await
	}

	/// Columns, filters, state, current page and metadata in one bundle
	pub async fn to_schema(&self, backend: &dyn TableBackend) -> TableResult<TableSchema> {
		let results = self.paginate(backend).await?;
		let state = self.store.state().clone();
		let descriptors = self.filters.descriptors();

		let meta = SchemaMeta {
			has_filters: state.has_filters(),
			filter_summary: filter_summary(&descriptors, &state),
			filter_count: state.filter_count(),
			sortable_columns: self.sorts.names(),
			toggleable_columns: self.toggles.toggleable().to_vec(),
			default_sort: self.table.default_sort(),
			searchable_columns: self
				.filters
				.search()
				.map(|search| search.paths())
				.unwrap_or_default(),
			per_page_options: self.settings.per_page_options.clone(),
		};

		Ok(TableSchema {
			name: self.table.name().map(str::to_string),
			columns: self
				.columns
				.iter()
				.filter(|column| !column.is_hidden())
				.map(ColumnSchema::from)
				.collect(),
			filters: descriptors
				.iter()
				.map(|descriptor| FilterSchema::new(descriptor, state.filters.get(descriptor.attribute())))
				.collect(),
			presets: self.store.presets().iter().map(PresetSchema::from).collect(),
			state,
			results,
			meta,
		})
	}

	/// Renders the queries for the current state without running them
	pub fn debug(&self, dialect: SqlDialect) -> QueryDebug {
		let loader = EagerLoader::new(self.table.resource(), &self.eager_relations());
		let (select, plan, joins) = self.build(&loader, true);
		QueryDebug {
			sql: render(dialect, &select),
			count_sql: render(dialect, &self.count_query(true)),
			state: self.store.state().clone(),
			plan,
			joins,
		}
	}

	/// Structural self-check of the table definition
	pub fn validate(&self) -> ValidationReport {
		validate_table(self.table)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource::Resource;
	use crate::TableError;
	use rstest::*;
	use serde_json::json;
	use std::sync::Arc;
	use tablekit_core::{FilterType, Preset, StateError};

	struct Assets {
		resource: Resource,
		columns: Vec<Column>,
		default_sort: Vec<String>,
		with: Vec<String>,
	}

	impl Table for Assets {
		fn name(&self) -> Option<&str> {
			Some("assets")
		}

		fn resource(&self) -> &Resource {
			&self.resource
		}

		fn columns(&self) -> Vec<Column> {
			self.columns.clone()
		}

		fn with(&self) -> Vec<String> {
			self.with.clone()
		}

		fn default_sort(&self) -> Vec<String> {
			self.default_sort.clone()
		}

		fn presets(&self) -> Vec<Preset> {
			vec![Preset::new("laptops").with_filter("category.name", json!(["Laptops"]))]
		}
	}

	#[fixture]
	fn assets() -> Assets {
		let categories = Arc::new(Resource::new("categories"));
		let tags = Arc::new(Resource::new("tags"));
		Assets {
			resource: Resource::new("assets")
				.belongs_to("category", categories, "category_id")
				.belongs_to_many("tags", tags, "asset_tag", "asset_id", "tag_id"),
			columns: vec![
				Column::new("name").sortable().searchable().filter(FilterType::Text),
				Column::new("created_at").sortable(),
				Column::new("category.name").sortable().searchable().filter(FilterType::Select),
				Column::new("tags.name").sortable().filter(FilterType::Text),
				Column::new("notes"),
			],
			default_sort: vec!["-created_at".to_string()],
			with: vec![],
		}
	}

	fn view<'t>(table: &'t Assets, query: &str) -> TableView<'t, Assets> {
		let params = RequestParams::from_query_string(query).unwrap();
		TableView::new(table, TableSettings::default(), &params).unwrap()
	}

	#[rstest]
	fn test_duplicate_column_is_a_configuration_error(mut assets: Assets) {
		assets.columns.push(Column::new("name"));
		let err = TableView::new(&assets, TableSettings::default(), &RequestParams::new())
			.err()
			.unwrap();
		assert!(matches!(
			err,
			TableError::Configuration(ConfigurationError::DuplicateColumn(ref name)) if name == "name"
		));
	}

	#[rstest]
	fn test_default_sort_applies_without_request_sort(assets: Assets) {
		let debug = view(&assets, "").debug(SqlDialect::Sqlite);
		assert!(
			debug.sql.contains(r#"ORDER BY "assets"."created_at" DESC LIMIT 15 OFFSET 0"#),
			"{}",
			debug.sql
		);
		assert!(debug.count_sql.starts_with("SELECT COUNT(*)"), "{}", debug.count_sql);
		assert!(
			debug.count_sql.ends_with(r#"(SELECT "assets"."id" FROM "assets") AS "matching""#),
			"{}",
			debug.count_sql
		);
	}

	#[rstest]
	fn test_namespaced_page_and_per_page(assets: Assets) {
		let debug = view(&assets, "assets[page]=3&assets[per_page]=10&page=9").debug(SqlDialect::Sqlite);
		assert!(debug.sql.ends_with("LIMIT 10 OFFSET 20"), "{}", debug.sql);
	}

	#[rstest]
	#[case("assets[page]=18446744073709551615&assets[per_page]=100")]
	#[case("assets[page]=18446744073709551615&assets[per_page]=1")]
	#[case("assets[page]=922337203685477581")]
	fn test_huge_page_saturates_offset(assets: Assets, #[case] query: &str) {
		let view = view(&assets, query);
		let debug = view.debug(SqlDialect::Sqlite);
		let offset = format!("OFFSET {}", page_offset(view.state().page, view.state().per_page));
		assert!(debug.sql.ends_with(&offset), "{}", debug.sql);
		assert!(debug.sql.ends_with(&format!("OFFSET {}", i64::MAX)), "{}", debug.sql);
	}

	#[rstest]
	fn test_filter_and_sort_share_one_join(assets: Assets) {
		let debug = view(
			&assets,
			"assets[filter][tags.name][op]=equals&assets[filter][tags.name][value]=urgent&assets[sort]=tags.name",
		)
		.debug(SqlDialect::Sqlite);

		assert_eq!(debug.joins, vec!["tags_pivot".to_string(), "tags".to_string()]);
		assert_eq!(debug.sql.matches(r#"LEFT JOIN "tags" AS "tags""#).count(), 1, "{}", debug.sql);
		assert!(debug.sql.contains(r#"GROUP BY "assets"."id""#), "{}", debug.sql);
		assert!(debug.sql.contains(r#"ORDER BY MIN("tags"."name") ASC"#), "{}", debug.sql);
		assert!(!debug.count_sql.contains("JOIN"), "{}", debug.count_sql);
	}

	#[rstest]
	fn test_to_one_sort_uses_subquery(assets: Assets) {
		let debug = view(&assets, "assets[sort]=-category.name").debug(SqlDialect::Sqlite);
		assert!(debug.joins.is_empty());
		assert!(
			debug.sql.contains(r#"ORDER BY (SELECT "category"."name" FROM "categories" AS "category""#),
			"{}",
			debug.sql
		);
	}

	#[rstest]
	fn test_unknown_sort_is_ignored(assets: Assets) {
		let debug = view(&assets, "assets[sort]=notes").debug(SqlDialect::Sqlite);
		assert!(!debug.sql.contains("ORDER BY"), "{}", debug.sql);
		assert!(matches!(debug.plan.as_slice(), [QueryStep::Skipped { .. }]));
	}

	#[rstest]
	fn test_dotted_columns_are_eager_loaded(assets: Assets) {
		let view = view(&assets, "");
		assert_eq!(view.eager_relations(), vec!["category".to_string(), "tags".to_string()]);
	}

	#[rstest]
	fn test_validate_reports_unsortable_default_sort(mut assets: Assets) {
		assets.default_sort = vec!["notes".to_string(), "-missing".to_string()];
		assets.with = vec!["owner".to_string()];
		assets.columns.push(Column::new("owner.name"));

		let report = view(&assets, "").validate();
		assert!(!report.is_valid());
		assert_eq!(
			report.errors(),
			&[
				ResourceValidationError::UnsortableDefaultSort("notes".to_string()),
				ResourceValidationError::UnknownDefaultSort("missing".to_string()),
				ResourceValidationError::UnresolvableColumn("owner.name".to_string()),
				ResourceValidationError::UnknownEagerLoad("owner".to_string()),
			]
		);
	}

	#[rstest]
	fn test_valid_table(assets: Assets) {
		assert!(view(&assets, "").validate().is_valid());
	}

	#[rstest]
	fn test_state_mutations(assets: Assets) {
		let mut view = view(&assets, "assets[page]=4");

		let filter = view.apply_filter("name", &json!({"op": "starts_with", "value": "Del"})).unwrap();
		assert!(filter.enabled);
		assert_eq!(view.state().page, 1);

		view.apply_preset("laptops").unwrap();
		assert!(!view.state().filters["name"].enabled);
		assert!(view.state().filters["category.name"].enabled);

		assert!(matches!(
			view.apply_preset("missing"),
			Err(TableError::State(StateError::UnknownPreset(_)))
		));
		assert!(matches!(
			view.apply_filter("notes", &json!("x")),
			Err(TableError::State(StateError::UnknownFilter(_)))
		));

		view.reset();
		assert_eq!(view.state(), &view.store().initial_state());
	}
}
