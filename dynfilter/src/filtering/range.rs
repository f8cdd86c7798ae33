//! `<field>_min` / `<field>_max` bounds for date, datetime and numeric fields.

use crate::dates::DateParser;
use crate::errors::{DiagnosticKind, Diagnostics};
use crate::fields::{FieldMetadata, Operator, SemanticType};
use crate::params::RequestValueExtractor;
use crate::value::FilterValue;

use super::predicate::Predicate;

pub const MIN_SUFFIX: &str = "_min";
pub const MAX_SUFFIX: &str = "_max";

/// `<field>_min` / `<field>_max` boundary filter.
#[derive(Debug, Clone, Copy)]
pub struct RangeFilter<'a> {
    extractor: RequestValueExtractor<'a>,
    dates: &'a DateParser,
}

impl<'a> RangeFilter<'a> {
    #[must_use]
    pub const fn new(extractor: RequestValueExtractor<'a>, dates: &'a DateParser) -> Self {
        Self { extractor, dates }
    }

    /// Parameter names read for `field`
    #[must_use]
    pub fn param_names(field: &FieldMetadata) -> (String, String) {
        (
            format!("{}{MIN_SUFFIX}", field.name()),
            format!("{}{MAX_SUFFIX}", field.name()),
        )
    }

    /// `gte` for a present min, `lte` for a present max, AND-ed when both are
    /// present. Bounds that do not parse contribute nothing.
    pub fn build(&self, field: &FieldMetadata, diagnostics: &mut Diagnostics) -> Option<Predicate> {
        if !field.is_filterable() || !field.is_range_eligible() {
            return None;
        }
        let (min_param, max_param) = Self::param_names(field);

        let lower = self
            .bound(field, &min_param, diagnostics)
            .map(|v| Predicate::leaf(field.field_path(), Operator::Gte, v));
        let upper = self
            .bound(field, &max_param, diagnostics)
            .map(|v| Predicate::leaf(field.field_path(), Operator::Lte, v));

        Predicate::all(lower.into_iter().chain(upper))
    }

    fn bound(
        &self,
        field: &FieldMetadata,
        param: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<FilterValue> {
        let raw = self.extractor.get_single(param, diagnostics)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let parsed = match field.semantic_type() {
            SemanticType::Date => self.dates.parse_date(raw).map(FilterValue::Date),
            SemanticType::Datetime => self.dates.parse_datetime(raw).map(FilterValue::DateTime),
            SemanticType::Integer => raw.parse::<i64>().ok().map(FilterValue::Int),
            SemanticType::Decimal => raw
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(FilterValue::Float),
            _ => Some(FilterValue::from(raw)),
        };

        if parsed.is_none() {
            diagnostics.debug(
                DiagnosticKind::ConversionFailed,
                format!(
                    "Ignoring range bound '{param}': '{raw}' is not a valid {}",
                    field.semantic_type()
                ),
            );
        }
        parsed
    }
}
