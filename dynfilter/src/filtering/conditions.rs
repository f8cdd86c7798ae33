//! Per-field lookups: operator fallback, null checks and value conversion.

use crate::conversion::ValueConverter;
use crate::dates::DateParser;
use crate::errors::{DiagnosticKind, Diagnostics};
use crate::fields::{FieldMetadata, Operator, SemanticType};
use crate::params::RequestValueExtractor;
use crate::value::FilterValue;

use super::predicate::Predicate;

// Basic safety limits
pub const MAX_FIELD_VALUE_LENGTH: usize = 10_000;

/// Single-field comparison filter.
///
/// The building block every other strategy that targets one field delegates
/// to, so operator validation, null handling, multi-value normalisation and
/// type coercion behave the same everywhere.
#[derive(Debug, Clone, Copy)]
pub struct BasicFieldFilter<'a> {
    extractor: RequestValueExtractor<'a>,
    converter: ValueConverter<'a>,
}

impl<'a> BasicFieldFilter<'a> {
    #[must_use]
    pub const fn new(extractor: RequestValueExtractor<'a>, dates: &'a DateParser) -> Self {
        Self {
            extractor,
            converter: ValueConverter::new(dates),
        }
    }

    /// Build the leaf for `field`.
    ///
    /// With no `value`, the request is read by the field's path. With no
    /// `operator`, or one the field does not allow, the field's default
    /// operator applies.
    pub fn build(
        &self,
        field: &FieldMetadata,
        value: Option<FilterValue>,
        operator: Option<Operator>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        if !field.is_filterable() {
            return None;
        }

        let value = match value {
            Some(value) => value,
            None => self.extractor.get(field.field_path(), diagnostics)?,
        };
        if value.is_empty() {
            return None;
        }

        let operator = resolve_operator(field, operator, diagnostics);

        if value.is_null_token() {
            return Some(Predicate::is_null(field.field_path()));
        }

        if exceeds_length(&value) {
            diagnostics.warn(
                DiagnosticKind::MalformedInput,
                format!(
                    "Value for field '{}' is longer than {MAX_FIELD_VALUE_LENGTH} characters",
                    field.name()
                ),
            );
            return None;
        }

        let value = normalise_arity(value, field, operator, diagnostics)?;
        let value = self.converter.convert(value, field, operator, diagnostics);

        Some(Predicate::leaf(field.field_path(), operator, value))
    }
}

/// The requested operator when the field allows it, else the field default
fn resolve_operator(
    field: &FieldMetadata,
    requested: Option<Operator>,
    diagnostics: &mut Diagnostics,
) -> Operator {
    match requested {
        Some(op) if field.allows(op) => op,
        Some(op) => {
            diagnostics.warn(
                DiagnosticKind::DisallowedOperator,
                format!(
                    "Lookup '{op}' not allowed for field '{}'. Using default: {}",
                    field.field_path(),
                    field.default_operator()
                ),
            );
            field.default_operator()
        }
        None => field.default_operator(),
    }
}

fn exceeds_length(value: &FilterValue) -> bool {
    match value {
        FilterValue::Text(s) => s.len() > MAX_FIELD_VALUE_LENGTH,
        FilterValue::List(items) => items.iter().any(exceeds_length),
        _ => false,
    }
}

/// Array operators other than `len` compare against a collection
fn is_collection_comparison(field: &FieldMetadata, operator: Operator) -> bool {
    field.semantic_type() == SemanticType::Array && operator != Operator::Len
}

/// Shape the value for the operator.
///
/// Multi-value operators always get a sequence. Repeated values sent to a
/// scalar comparison keep the last one, except for array and json fields
/// whose operators compare whole collections.
fn normalise_arity(
    value: FilterValue,
    field: &FieldMetadata,
    operator: Operator,
    diagnostics: &mut Diagnostics,
) -> Option<FilterValue> {
    if operator.expects_many() || is_collection_comparison(field, operator) {
        let list = value.into_list();
        if operator == Operator::Range
            && let FilterValue::List(bounds) = &list
            && bounds.len() != 2
        {
            diagnostics.warn(
                DiagnosticKind::MalformedInput,
                format!(
                    "Range on field '{}' needs exactly two bounds, got {}",
                    field.name(),
                    bounds.len()
                ),
            );
            return None;
        }
        return Some(list);
    }

    match value {
        FilterValue::List(mut items)
            if !matches!(field.semantic_type(), SemanticType::Array | SemanticType::Json) =>
        {
            diagnostics.debug(
                DiagnosticKind::MalformedInput,
                format!(
                    "Field '{}' got {} values for '{operator}', using the last",
                    field.name(),
                    items.len()
                ),
            );
            items.pop()
        }
        other => Some(other),
    }
}
