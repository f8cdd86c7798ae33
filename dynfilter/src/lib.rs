//! # dynfilter
//!
//! Declarative, schema-driven filtering for list endpoints.
//!
//! A [`FieldRegistry`] is built once per model from a [`SchemaProvider`]: own
//! fields, fields of directly related models, and computed aggregates, each
//! classified into a [`SemanticType`] with its allowed operators. A
//! [`ModelFilter`] then reads request parameters through a [`ParamSource`] and
//! produces a backend-neutral [`Predicate`] tree plus [`SortKey`]s.
//!
//! ```rust,ignore
//! let registry = FieldRegistry::build(&catalog, "book", &[], FilterConfig::default())?;
//! let params = QueryParams::parse("title=dune&pages__gte=300&ordering=-published_on");
//! let filter = ModelFilter::new(&registry, &params);
//!
//! let outcome = filter.apply();
//! for diagnostic in &outcome.diagnostics {
//!     println!("{:?}: {}", diagnostic.kind, diagnostic.message);
//! }
//! ```
//!
//! Malformed input never fails a request: bad values, unknown fields and
//! disallowed operators are dropped or replaced, and reported as
//! [`Diagnostics`]. Only setup problems (a missing schema, an unknown model)
//! surface as [`FilterError`].
//!
//! With the default `sea-orm` feature, [`sea`] maps outcomes to
//! `sea_orm::Condition` and order expressions.

pub mod config;
pub mod conversion;
pub mod dates;
pub mod errors;
pub mod fields;
pub mod filtering;
pub mod model_filter;
pub mod params;
#[cfg(feature = "sea-orm")]
pub mod sea;
pub mod value;

#[cfg(test)]
mod test_fixtures;

pub use config::FilterConfig;
pub use dates::DateParser;
pub use errors::{Diagnostic, DiagnosticKind, Diagnostics, FilterError, ParamError};
pub use fields::{
    Aggregate, Choice, ComputedField, FieldDescriptor, FieldFilterConfig, FieldMetadata,
    FieldRegistry, FilterableField, Operator, SchemaCatalog, SchemaProvider, SemanticType,
    StorageKind,
};
pub use filtering::{Combinator, Predicate, SortKey};
pub use model_filter::{FilterOutcome, ModelFilter};
pub use params::{ParamSource, ParamValue, QueryParams};
pub use value::FilterValue;
