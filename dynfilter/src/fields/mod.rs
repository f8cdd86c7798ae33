//! Field classification and the per-model field registry.

pub mod registry;
pub mod schema;
pub mod types;

pub use registry::{FieldMetadata, FieldRegistry, FilterableField, PATH_SEPARATOR};
pub use schema::{
    Aggregate, Choice, ComputedField, FieldDescriptor, FieldFilterConfig, SchemaCatalog,
    SchemaProvider, StorageKind,
};
pub use types::{Operator, SemanticType, UnknownOperator, classify, classify_kind};
