//! Resources and their relations
//!
//! A [`Resource`] names the table a [`Table`](crate::Table) reads from and
//! the relations dotted paths may traverse. Relations point at the related
//! resource, so a chain such as `assignments.user` is resolved one segment
//! at a time.

use std::sync::Arc;
use tablekit_core::DottedPath;

/// How a relation links two tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
	/// `owner.foreign_key = related.primary_key`
	BelongsTo { foreign_key: String },
	/// `related.foreign_key = owner.primary_key`, at most one row
	HasOne { foreign_key: String },
	/// `related.foreign_key = owner.primary_key`
	HasMany { foreign_key: String },
	/// Linked through a pivot table
	BelongsToMany {
		pivot_table: String,
		/// Pivot column pointing at the owner
		foreign_pivot_key: String,
		/// Pivot column pointing at the related row
		related_pivot_key: String,
	},
}

impl RelationKind {
	/// Returns whether the relation yields at most one related row
	pub fn is_to_one(&self) -> bool {
		matches!(self, Self::BelongsTo { .. } | Self::HasOne { .. })
	}
}

/// A named relation from one resource to another
#[derive(Debug, Clone)]
pub struct Relation {
	name: String,
	kind: RelationKind,
	target: Arc<Resource>,
}

impl Relation {
	pub fn new(name: impl Into<String>, kind: RelationKind, target: Arc<Resource>) -> Self {
		Self {
			name: name.into(),
			kind,
			target,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> &RelationKind {
		&self.kind
	}

	pub fn target(&self) -> &Resource {
		&self.target
	}

	pub fn is_to_one(&self) -> bool {
		self.kind.is_to_one()
	}
}

/// A queryable table and its relations
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tablekit_query::Resource;
///
/// let categories = Arc::new(Resource::new("categories"));
/// let tags = Arc::new(Resource::new("tags"));
/// let assets = Resource::new("assets")
///     .belongs_to("category", categories, "category_id")
///     .belongs_to_many("tags", tags, "asset_tag", "asset_id", "tag_id");
///
/// assert!(assets.relation("category").unwrap().is_to_one());
/// assert!(!assets.relation("tags").unwrap().is_to_one());
/// assert!(assets.resolve("category.name").is_some());
/// assert!(assets.resolve("owner.name").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Resource {
	table: String,
	primary_key: String,
	relations: Vec<Relation>,
}

impl Resource {
	/// Declares a resource with an `id` primary key
	pub fn new(table: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			primary_key: "id".to_string(),
			relations: Vec::new(),
		}
	}

	pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
		self.primary_key = primary_key.into();
		self
	}

	pub fn with_relation(mut self, relation: Relation) -> Self {
		self.relations.push(relation);
		self
	}

	pub fn belongs_to(
		self,
		name: impl Into<String>,
		target: Arc<Resource>,
		foreign_key: impl Into<String>,
	) -> Self {
		self.with_relation(Relation::new(
			name,
			RelationKind::BelongsTo {
				foreign_key: foreign_key.into(),
			},
			target,
		))
	}

	pub fn has_one(
		self,
		name: impl Into<String>,
		target: Arc<Resource>,
		foreign_key: impl Into<String>,
	) -> Self {
		self.with_relation(Relation::new(
			name,
			RelationKind::HasOne {
				foreign_key: foreign_key.into(),
			},
			target,
		))
	}

	pub fn has_many(
		self,
		name: impl Into<String>,
		target: Arc<Resource>,
		foreign_key: impl Into<String>,
	) -> Self {
		self.with_relation(Relation::new(
			name,
			RelationKind::HasMany {
				foreign_key: foreign_key.into(),
			},
			target,
		))
	}

	pub fn belongs_to_many(
		self,
		name: impl Into<String>,
		target: Arc<Resource>,
		pivot_table: impl Into<String>,
		foreign_pivot_key: impl Into<String>,
		related_pivot_key: impl Into<String>,
	) -> Self {
		self.with_relation(Relation::new(
			name,
			RelationKind::BelongsToMany {
				pivot_table: pivot_table.into(),
				foreign_pivot_key: foreign_pivot_key.into(),
				related_pivot_key: related_pivot_key.into(),
			},
			target,
		))
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn primary_key(&self) -> &str {
		&self.primary_key
	}

	pub fn relations(&self) -> &[Relation] {
		&self.relations
	}

	pub fn relation(&self, name: &str) -> Option<&Relation> {
		self.relations.iter().find(|r| r.name == name)
	}

	/// Resolves the relation segments of a dotted path
	///
	/// Returns `None` when any segment is not a declared relation of the
	/// resource reached so far. A path without relations resolves to an
	/// empty chain.
	pub fn resolve(&self, path: &str) -> Option<Vec<&Relation>> {
		let path = DottedPath::new(path);
		self.resolve_relations(&path.relations())
	}

	/// Resolves a chain of relation names
	pub fn resolve_relations(&self, segments: &[&str]) -> Option<Vec<&Relation>> {
		let mut chain = Vec::with_capacity(segments.len());
		let mut current = self;
		for segment in segments {
			let relation = current.relation(segment)?;
			current = relation.target();
			chain.push(relation);
		}
		Some(chain)
	}
}
