//! Per-model field registry.
//!
//! Built once per (model, computed fields, config) and read-only afterwards,
//! so a single registry can serve any number of concurrent filter builds.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

use super::schema::{
    Aggregate, Choice, ComputedField, FieldDescriptor, SchemaProvider, StorageKind,
};
use super::types::{Operator, SemanticType, classify};
use crate::config::{FilterConfig, is_reserved};
use crate::errors::{DiagnosticKind, Diagnostics, FilterError};

/// Separator between a relation name and the related field in a field path
pub const PATH_SEPARATOR: char = '.';

/// Filter metadata for one registered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    name: String,
    field_path: String,
    semantic_type: SemanticType,
    storage_kind: Option<StorageKind>,
    searchable: bool,
    filterable: bool,
    orderable: bool,
    allowed_operators: Vec<Operator>,
    default_operator: Operator,
    range_eligible: bool,
    choices: Option<Vec<Choice>>,
    is_computed: bool,
}

impl FieldMetadata {
    /// Registry key
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path used to reach the field from the filtered model
    #[must_use]
    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    #[must_use]
    pub const fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    /// Storage kind of the backing descriptor; `None` for computed fields
    #[must_use]
    pub const fn storage_kind(&self) -> Option<&StorageKind> {
        self.storage_kind.as_ref()
    }

    #[must_use]
    pub const fn is_searchable(&self) -> bool {
        self.searchable
    }

    #[must_use]
    pub const fn is_filterable(&self) -> bool {
        self.filterable
    }

    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        self.orderable
    }

    #[must_use]
    pub fn allowed_operators(&self) -> &[Operator] {
        &self.allowed_operators
    }

    #[must_use]
    pub fn allows(&self, operator: Operator) -> bool {
        self.allowed_operators.contains(&operator)
    }

    #[must_use]
    pub const fn default_operator(&self) -> Operator {
        self.default_operator
    }

    #[must_use]
    pub const fn is_range_eligible(&self) -> bool {
        self.range_eligible
    }

    /// Choice set, for enum fields
    #[must_use]
    pub fn choices(&self) -> Option<&[Choice]> {
        self.choices.as_deref()
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.is_computed
    }
}

/// Public description of a filterable field, for forms and documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterableField {
    pub name: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    pub filterable: bool,
    pub searchable: bool,
    pub orderable: bool,
    pub lookups: Vec<Operator>,
    pub default_lookup: Operator,
    pub range_filter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

impl From<&FieldMetadata> for FilterableField {
    fn from(field: &FieldMetadata) -> Self {
        Self {
            name: field.name.clone(),
            semantic_type: field.semantic_type,
            filterable: field.filterable,
            searchable: field.searchable,
            orderable: field.orderable,
            lookups: field.allowed_operators.clone(),
            default_lookup: field.default_operator,
            range_filter: field.range_eligible,
            choices: field
                .choices
                .clone()
                .filter(|_| field.semantic_type == SemanticType::Enum),
        }
    }
}

/// Mapping from field name to [`FieldMetadata`] for one model.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    model: String,
    fields: Vec<FieldMetadata>,
    index: HashMap<String, usize>,
    config: FilterConfig,
    diagnostics: Diagnostics,
}

impl FieldRegistry {
    /// Build the registry for `model`.
    ///
    /// Registers the model's own fields, then the fields of each related model
    /// one level deep, then `computed` fields. The first registration of a
    /// name wins.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::MissingSchema`] for an empty model name and
    /// [`FilterError::UnknownModel`] when `provider` cannot describe it.
    pub fn build(
        provider: &dyn SchemaProvider,
        model: &str,
        computed: &[ComputedField],
        config: FilterConfig,
    ) -> Result<Self, FilterError> {
        if model.trim().is_empty() {
            return Err(FilterError::MissingSchema);
        }
        let own_fields = provider
            .fields(model)
            .ok_or_else(|| FilterError::unknown_model(model))?;

        let mut registry = Self {
            model: model.to_string(),
            fields: Vec::new(),
            index: HashMap::new(),
            config,
            diagnostics: Diagnostics::new(),
        };

        let mut relations = Vec::new();
        for field in own_fields.iter().filter(|f| f.is_registrable()) {
            registry.register_descriptor(field, None);
            if let Some(target) = &field.related_model {
                relations.push((field.name.as_str(), target.as_str()));
            }
        }

        // One level only: fields of related models are not expanded further.
        for (relation, target) in relations {
            let Some(related_fields) = provider.fields(target) else {
                registry.diagnostics.warn(
                    DiagnosticKind::UnresolvedRelation,
                    format!("Relation '{relation}' points at unknown model '{target}'"),
                );
                continue;
            };
            for field in related_fields.iter().filter(|f| f.is_registrable()) {
                registry.register_descriptor(field, Some(relation));
            }
        }

        for field in computed {
            if registry.contains(&field.name) {
                continue;
            }
            let semantic_type = registry.computed_type(field, own_fields);
            registry.register_computed(&field.name, semantic_type);
        }

        tracing::debug!(
            model = %registry.model,
            fields = registry.fields.len(),
            "Built field registry"
        );
        Ok(registry)
    }

    fn register_descriptor(&mut self, field: &FieldDescriptor, relation: Option<&str>) {
        let mut name = field.name.clone();
        let mut field_path = field.name.clone();

        if let Some(relation) = relation {
            field_path = format!("{relation}{PATH_SEPARATOR}{}", field.name);
            if self.contains(&name) {
                name = format!("{relation}_{}", field.name);
            }
        }

        if self.contains(&name) {
            return;
        }

        let semantic_type = classify(field);
        let searchable = self
            .config
            .search_allow_list()
            .map_or(field.filter.searchable, |list| list.contains(&name));
        let filterable = self
            .config
            .filter_allow_list()
            .is_none_or(|list| list.contains(&name));

        let metadata = FieldMetadata {
            field_path,
            semantic_type,
            storage_kind: Some(field.kind.clone()),
            searchable,
            filterable,
            orderable: field.filter.orderable.unwrap_or(true),
            allowed_operators: field
                .filter
                .lookups
                .clone()
                .unwrap_or_else(|| semantic_type.allowed_operators().to_vec()),
            default_operator: field
                .filter
                .default_lookup
                .unwrap_or_else(|| semantic_type.default_operator()),
            range_eligible: field
                .filter
                .range_filter
                .unwrap_or_else(|| semantic_type.is_range_eligible()),
            choices: if semantic_type == SemanticType::Enum {
                field.choices.clone()
            } else {
                None
            },
            is_computed: false,
            name,
        };
        self.insert(metadata);
    }

    fn computed_type(
        &mut self,
        field: &ComputedField,
        own_fields: &[FieldDescriptor],
    ) -> SemanticType {
        match &field.aggregate {
            Aggregate::Count => SemanticType::Integer,
            Aggregate::Sum | Aggregate::Average => SemanticType::Decimal,
            Aggregate::Concat | Aggregate::Other => SemanticType::Text,
            Aggregate::Min(source) | Aggregate::Max(source) => {
                if let Some(descriptor) = own_fields.iter().find(|f| &f.name == source) {
                    classify(descriptor)
                } else {
                    self.diagnostics.warn(
                        DiagnosticKind::UnknownField,
                        format!(
                            "Computed field '{}' aggregates unknown field '{source}', treating as text",
                            field.name
                        ),
                    );
                    SemanticType::Text
                }
            }
        }
    }

    fn register_computed(&mut self, name: &str, semantic_type: SemanticType) {
        let searchable = self
            .config
            .search_allow_list()
            .is_none_or(|list| list.iter().any(|n| n == name));
        let filterable = self
            .config
            .filter_allow_list()
            .is_none_or(|list| list.iter().any(|n| n == name));

        self.insert(FieldMetadata {
            name: name.to_string(),
            field_path: name.to_string(),
            semantic_type,
            storage_kind: None,
            searchable,
            filterable,
            orderable: true,
            allowed_operators: semantic_type.allowed_operators().to_vec(),
            default_operator: semantic_type.default_operator(),
            range_eligible: semantic_type.is_range_eligible(),
            choices: None,
            is_computed: true,
        });
    }

    fn insert(&mut self, metadata: FieldMetadata) {
        self.index.insert(metadata.name.clone(), self.fields.len());
        self.fields.push(metadata);
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Non-fatal problems met while building
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldMetadata> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldMetadata> {
        self.fields.iter()
    }

    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|f| f.searchable)
    }

    /// Describe every filterable field.
    ///
    /// Fields that are not filterable, start with `_`, or collide with a
    /// reserved parameter name are left out.
    #[must_use]
    pub fn filterable_fields(&self) -> BTreeMap<String, FilterableField> {
        self.fields
            .iter()
            .filter(|f| f.filterable && !f.name.starts_with('_') && !is_reserved(&f.name))
            .map(|f| (f.name.clone(), FilterableField::from(f)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FieldRegistry {
    type Item = &'a FieldMetadata;
    type IntoIter = std::slice::Iter<'a, FieldMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
