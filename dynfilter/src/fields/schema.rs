//! Schema introspection: what the storage layer tells us about its fields.
//!
//! The core never inspects storage types by name or reflection. A schema
//! collaborator answers a few explicit questions per field (storage kind,
//! relation target, choice set, concreteness) through [`FieldDescriptor`] and
//! the [`SchemaProvider`] trait.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use super::types::Operator;

/// Storage-level primitive kind of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    Char,
    Text,
    Slug,
    Email,
    Url,
    File,
    FilePath,
    Integer,
    PositiveInteger,
    SmallInteger,
    BigInteger,
    Auto,
    BigAuto,
    Float,
    Decimal,
    Boolean,
    NullBoolean,
    Date,
    DateTime,
    Time,
    ForeignKey,
    OneToOne,
    ManyToMany,
    Json,
    Array,
    Uuid,
    /// Anything the table does not know; classified as text
    Other(String),
}

impl StorageKind {
    /// Whether values are stored as integers (used for enum coercion)
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::PositiveInteger
                | Self::SmallInteger
                | Self::BigInteger
                | Self::Auto
                | Self::BigAuto
        )
    }

    /// Whether values are stored as strings (used for enum coercion)
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::Char | Self::Text | Self::Slug)
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        matches!(self, Self::ForeignKey | Self::OneToOne | Self::ManyToMany)
    }
}

/// One entry of an enumerated choice set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Choice {
    /// Stored value, as text
    pub value: String,
    /// Human-readable label
    pub label: String,
}

impl Choice {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Per-field filter configuration declared alongside the schema.
///
/// Every entry is optional; unset entries fall back to the defaults of the
/// field's semantic type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFilterConfig {
    /// Include in free-text search when no search allow-list is configured
    pub searchable: bool,
    /// Replace the type's allowed operators
    pub lookups: Option<Vec<Operator>>,
    /// Replace the type's default operator
    pub default_lookup: Option<Operator>,
    /// Override `<field>_min` / `<field>_max` eligibility
    pub range_filter: Option<bool>,
    /// Override whether the field may appear in the ordering
    pub orderable: Option<bool>,
}

/// A schema field as seen by the filter engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: StorageKind,
    /// Name of the related model, for relation kinds
    pub related_model: Option<String>,
    /// Enumerated choices, if the field is restricted to a fixed set
    pub choices: Option<Vec<Choice>>,
    /// Generated by the storage layer rather than declared (reverse links)
    pub auto_created: bool,
    /// Backed by a real column
    pub concrete: bool,
    pub filter: FieldFilterConfig,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StorageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            related_model: None,
            choices: None,
            auto_created: false,
            concrete: true,
            filter: FieldFilterConfig::default(),
        }
    }

    /// A foreign key to `model`
    #[must_use]
    pub fn foreign_key(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, StorageKind::ForeignKey).related_to(model)
    }

    /// A reverse link the storage layer creates automatically; never registered
    #[must_use]
    pub fn reverse_relation(name: impl Into<String>, model: impl Into<String>) -> Self {
        let mut field = Self::new(name, StorageKind::ManyToMany).related_to(model);
        field.auto_created = true;
        field.concrete = false;
        field
    }

    #[must_use]
    pub fn related_to(mut self, model: impl Into<String>) -> Self {
        self.related_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = Some(choices);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FieldFilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Shorthand for a field declared searchable
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.filter.searchable = true;
        self
    }

    /// Whether the field is restricted to a non-empty choice set
    #[must_use]
    pub fn is_enumerated(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Auto-created reverse links without a backing column are skipped
    #[must_use]
    pub const fn is_registrable(&self) -> bool {
        !(self.auto_created && !self.concrete)
    }
}

/// Source of schema metadata.
///
/// Relations refer to their target by model name, so cyclic relations
/// (including self-references) need no reference cycles.
pub trait SchemaProvider {
    /// Fields declared on `model`, or `None` when the model is unknown
    fn fields(&self, model: &str) -> Option<&[FieldDescriptor]>;
}

/// In-memory schema provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    models: HashMap<String, Vec<FieldDescriptor>>,
}

impl SchemaCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a model
    #[must_use]
    pub fn with_model(mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        self.insert(name, fields);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) {
        self.models.insert(name.into(), fields);
    }
}

impl SchemaProvider for SchemaCatalog {
    fn fields(&self, model: &str) -> Option<&[FieldDescriptor]> {
        self.models.get(model).map(Vec::as_slice)
    }
}

/// Aggregation behind a computed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "source")]
pub enum Aggregate {
    Count,
    Sum,
    Average,
    Concat,
    /// Minimum of a source field on the model
    Min(String),
    /// Maximum of a source field on the model
    Max(String),
    Other,
}

/// A derived field with no backing descriptor (an annotation on the query).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedField {
    pub name: String,
    pub aggregate: Aggregate,
}

impl ComputedField {
    #[must_use]
    pub fn new(name: impl Into<String>, aggregate: Aggregate) -> Self {
        Self {
            name: name.into(),
            aggregate,
        }
    }
}
