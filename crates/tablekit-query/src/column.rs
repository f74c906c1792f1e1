//! Column descriptors

use crate::strategy::{FilterStrategy, RelationSort, SortStrategy};
use std::fmt;
use std::sync::Arc;
use tablekit_core::{ConfigurationError, DottedPath, FilterDescriptor, FilterType, humanize};

/// How a sortable column is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
	/// Order by the column itself
	#[default]
	Field,
	/// Order through a caller-supplied [`SortStrategy`]
	Custom,
}

/// Resolved translation of one sort directive
#[derive(Clone)]
pub enum SortStrategyKind {
	/// `ORDER BY <table>.<column>`
	Field { table: String, column: String },
	/// Delegated to a strategy object
	Custom(Arc<dyn SortStrategy>),
}

impl fmt::Debug for SortStrategyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Field { table, column } => write!(f, "Field({table}.{column})"),
			Self::Custom(strategy) => write!(f, "Custom({})", strategy.name()),
		}
	}
}

/// A named, resolved sort
#[derive(Debug, Clone)]
pub struct SortDirective {
	pub name: String,
	pub strategy: SortStrategyKind,
}

/// Declares one displayable and queryable field
///
/// # Examples
///
/// ```
/// use tablekit_core::FilterType;
/// use tablekit_query::{Column, SortStrategyKind};
///
/// let name = Column::new("name").sortable().searchable().filter(FilterType::Text);
/// let category = Column::new("category.name").sortable().toggleable();
///
/// assert_eq!(category.label(), "Category Name");
/// assert!(matches!(
///     name.allowed_sort("assets").unwrap().strategy,
///     SortStrategyKind::Field { .. }
/// ));
/// assert!(matches!(
///     category.allowed_sort("assets").unwrap().strategy,
///     SortStrategyKind::Custom(_)
/// ));
/// ```
#[derive(Clone)]
pub struct Column {
	name: DottedPath,
	label: Option<String>,
	sortable: bool,
	sort_type: SortType,
	sort_strategy: Option<Arc<dyn SortStrategy>>,
	filter_type: Option<FilterType>,
	filter_strategy: Option<Arc<dyn FilterStrategy>>,
	searchable: bool,
	toggleable: bool,
	hidden: bool,
}

impl Column {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: DottedPath::new(name),
			label: None,
			sortable: false,
			sort_type: SortType::Field,
			sort_strategy: None,
			filter_type: None,
			filter_strategy: None,
			searchable: false,
			toggleable: false,
			hidden: false,
		}
	}

	/// Sets the header text
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Allows sorting by this column
	pub fn sortable(mut self) -> Self {
		self.sortable = true;
		self
	}

	pub fn with_sort_type(mut self, sort_type: SortType) -> Self {
		self.sort_type = sort_type;
		self
	}

	/// Sorts through a caller-supplied strategy
	pub fn custom_sort(mut self, strategy: impl SortStrategy + 'static) -> Self {
		self.sortable = true;
		self.sort_type = SortType::Custom;
		self.sort_strategy = Some(Arc::new(strategy));
		self
	}

	/// Offers a filter of the given type for this column
	pub fn filter(mut self, filter_type: FilterType) -> Self {
		self.filter_type = Some(filter_type);
		self
	}

	/// Filters through a caller-supplied strategy
	pub fn custom_filter(mut self, strategy: impl FilterStrategy + 'static) -> Self {
		self.filter_type.get_or_insert(FilterType::Custom);
		self.filter_strategy = Some(Arc::new(strategy));
		self
	}

	/// Includes this column in global search
	pub fn searchable(mut self) -> Self {
		self.searchable = true;
		self
	}

	/// Lets the client show and hide this column
	pub fn toggleable(mut self) -> Self {
		self.toggleable = true;
		self
	}

	/// Leaves this column out of the schema while keeping it queryable
	pub fn hidden(mut self) -> Self {
		self.hidden = true;
		self
	}

	pub fn name(&self) -> &str {
		self.name.as_str()
	}

	pub fn path(&self) -> &DottedPath {
		&self.name
	}

	pub fn label(&self) -> String {
		self.label
			.clone()
			.unwrap_or_else(|| humanize(self.name.as_str()))
	}

	pub fn is_sortable(&self) -> bool {
		self.sortable
	}

	pub fn sort_type(&self) -> SortType {
		self.sort_type
	}

	pub fn filter_type(&self) -> Option<FilterType> {
		self.filter_type
	}

	pub fn filter_strategy(&self) -> Option<&Arc<dyn FilterStrategy>> {
		self.filter_strategy.as_ref()
	}

	pub fn is_searchable(&self) -> bool {
		self.searchable
	}

	pub fn is_toggleable(&self) -> bool {
		self.toggleable
	}

	pub fn is_hidden(&self) -> bool {
		self.hidden
	}

	/// Returns the resolved sort for this column
	///
	/// Direct columns are qualified with `base_table`; dotted columns are
	/// sorted through [`RelationSort`].
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::NotSortable`] when the column is not
	/// sortable and [`ConfigurationError::MissingSortStrategy`] when a custom
	/// sort has no strategy.
	pub fn allowed_sort(&self, base_table: &str) -> Result<SortDirective, ConfigurationError> {
		if !self.sortable {
			return Err(ConfigurationError::NotSortable(self.name().to_string()));
		}
		let strategy = match self.sort_type {
			SortType::Custom => {
				let strategy = self
					.sort_strategy
					.clone()
					.ok_or_else(|| ConfigurationError::MissingSortStrategy(self.name().to_string()))?;
				SortStrategyKind::Custom(strategy)
			}
			SortType::Field if self.name.is_relation() => SortStrategyKind::Custom(Arc::new(RelationSort)),
			SortType::Field => SortStrategyKind::Field {
				table: base_table.to_string(),
				column: self.name().to_string(),
			},
		};
		Ok(SortDirective {
			name: self.name().to_string(),
			strategy,
		})
	}

	/// Filter descriptor derived from the column's filter type
	pub fn filter_descriptor(&self) -> Option<FilterDescriptor> {
		self.filter_type
			.map(|filter_type| FilterDescriptor::new(self.name(), filter_type).with_label(self.label()))
	}
}

impl fmt::Debug for Column {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Column")
			.field("name", &self.name)
			.field("label", &self.label)
			.field("sortable", &self.sortable)
			.field("sort_type", &self.sort_type)
			.field("filter_type", &self.filter_type)
			.field("searchable", &self.searchable)
			.field("toggleable", &self.toggleable)
			.field("hidden", &self.hidden)
			.finish_non_exhaustive()
	}
}
