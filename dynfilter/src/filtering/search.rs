//! Free-text search across every searchable field.
//!
//! Text fields match with `icontains`; enum fields match on their choice labels.

use crate::config::SEARCH_PARAM;
use crate::conversion::ValueConverter;
use crate::dates::DateParser;
use crate::errors::Diagnostics;
use crate::fields::{FieldMetadata, FieldRegistry, Operator, SemanticType};
use crate::params::RequestValueExtractor;
use crate::value::FilterValue;

use super::predicate::Predicate;

// Basic safety limits
pub const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Free-text search across every searchable field.
#[derive(Debug, Clone, Copy)]
pub struct SearchFilter<'a> {
    extractor: RequestValueExtractor<'a>,
    converter: ValueConverter<'a>,
}

impl<'a> SearchFilter<'a> {
    #[must_use]
    pub const fn new(extractor: RequestValueExtractor<'a>, dates: &'a DateParser) -> Self {
        Self {
            extractor,
            converter: ValueConverter::new(dates),
        }
    }

    /// OR of one leaf per searchable field that can match the search term.
    ///
    /// Text fields match by case-insensitive substring. Enum fields match the
    /// values whose label contains the term.
    pub fn build(
        &self,
        registry: &FieldRegistry,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        let term = self.search_term(diagnostics)?;
        let leaves: Vec<Predicate> = registry
            .searchable_fields()
            .filter_map(|field| self.field_leaf(field, &term, diagnostics))
            .collect();

        tracing::debug!(term = %term, matched_fields = leaves.len(), "Built search predicate");
        Predicate::any(leaves)
    }

    fn search_term(&self, diagnostics: &mut Diagnostics) -> Option<String> {
        let raw = self.extractor.get_single(SEARCH_PARAM, diagnostics)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(truncate(trimmed, MAX_SEARCH_QUERY_LENGTH).to_string())
    }

    fn field_leaf(
        &self,
        field: &FieldMetadata,
        term: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        match field.semantic_type() {
            SemanticType::Text => Some(Predicate::leaf(
                field.field_path(),
                Operator::IContains,
                term,
            )),
            SemanticType::Enum => {
                let needle = term.to_lowercase();
                let matching: Vec<FilterValue> = field
                    .choices()?
                    .iter()
                    .filter(|choice| choice.label.to_lowercase().contains(&needle))
                    .map(|choice| FilterValue::from(choice.value.as_str()))
                    .collect();
                if matching.is_empty() {
                    return None;
                }
                let value =
                    self.converter
                        .convert(FilterValue::List(matching), field, Operator::In, diagnostics);
                Some(Predicate::leaf(field.field_path(), Operator::In, value))
            }
            _ => None,
        }
    }
}

/// Cut `s` to at most `max` bytes on a character boundary
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
