//! Coercion of untyped caller input into the value type a field expects.
//!
//! Conversion never fails the request. Numeric coercion resolves to a safe
//! default (`0`, `0.0`); any other failure keeps the raw value and records a
//! diagnostic.

use crate::dates::DateParser;
use crate::errors::{DiagnosticKind, Diagnostics};
use crate::fields::{FieldMetadata, Operator, SemanticType, StorageKind};
use crate::value::FilterValue;

const TRUE_TOKENS: &[&str] = &["true", "t", "yes", "y", "1"];

/// Boolean coercion: recognised tokens for text, truthiness otherwise
#[must_use]
pub fn to_boolean(value: &FilterValue) -> bool {
    match value {
        FilterValue::Bool(b) => *b,
        FilterValue::Text(s) => {
            let lowered = s.trim().to_lowercase();
            TRUE_TOKENS.contains(&lowered.as_str())
        }
        FilterValue::Int(i) => *i != 0,
        FilterValue::Float(x) => *x != 0.0,
        FilterValue::Null => false,
        FilterValue::List(items) => !items.is_empty(),
        FilterValue::Date(_) | FilterValue::DateTime(_) | FilterValue::Uuid(_) => true,
        FilterValue::Json(v) => match v {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            _ => true,
        },
    }
}

/// Integer coercion through a float, truncating toward zero; `0` when unparsable
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_integer(value: &FilterValue) -> i64 {
    let float = match value {
        FilterValue::Int(i) => return *i,
        FilterValue::Bool(b) => return i64::from(*b),
        FilterValue::Float(x) => *x,
        FilterValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if float.is_finite() {
        float.trunc() as i64
    } else {
        0
    }
}

/// Decimal coercion; `0.0` when unparsable
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_decimal(value: &FilterValue) -> f64 {
    match value {
        FilterValue::Float(x) => *x,
        FilterValue::Int(i) => *i as f64,
        FilterValue::Bool(b) => f64::from(u8::from(*b)),
        FilterValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Converts values using a field's semantic type.
#[derive(Debug, Clone, Copy)]
pub struct ValueConverter<'a> {
    dates: &'a DateParser,
}

impl<'a> ValueConverter<'a> {
    #[must_use]
    pub const fn new(dates: &'a DateParser) -> Self {
        Self { dates }
    }

    /// Convert `value` for a comparison against `field` with `operator`.
    ///
    /// Lists are converted element by element. On failure the original value
    /// is returned unchanged.
    pub fn convert(
        &self,
        value: FilterValue,
        field: &FieldMetadata,
        operator: Operator,
        diagnostics: &mut Diagnostics,
    ) -> FilterValue {
        if matches!(value, FilterValue::Null) {
            return value;
        }

        let converted = match &value {
            _ if is_document_comparison(field, operator) => to_document(&value),
            FilterValue::List(items) => items
                .iter()
                .map(|item| self.convert_scalar(item, field, operator))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            scalar => self.convert_scalar(scalar, field, operator),
        };

        match converted {
            Ok(converted) => converted,
            Err(ConversionFailure { level, reason }) => {
                let message = format!(
                    "Could not convert '{value}' for field '{}' ({}): {reason}",
                    field.name(),
                    field.semantic_type()
                );
                match level {
                    Level::Debug => diagnostics.debug(DiagnosticKind::ConversionFailed, message),
                    Level::Warn => diagnostics.warn(DiagnosticKind::ConversionFailed, message),
                }
                value
            }
        }
    }

    fn convert_scalar(
        &self,
        value: &FilterValue,
        field: &FieldMetadata,
        operator: Operator,
    ) -> Result<FilterValue, ConversionFailure> {
        if matches!(value, FilterValue::Null) {
            return Ok(FilterValue::Null);
        }

        Ok(match field.semantic_type() {
            SemanticType::Boolean => FilterValue::Bool(to_boolean(value)),
            SemanticType::Integer => FilterValue::Int(to_integer(value)),
            SemanticType::Decimal => FilterValue::Float(to_decimal(value)),
            SemanticType::Enum => convert_enum(value, field)?,
            SemanticType::Date => self.convert_date(value)?,
            SemanticType::Datetime if operator == Operator::Date => self.convert_date(value)?,
            SemanticType::Datetime => self.convert_datetime(value)?,
            SemanticType::Array if operator == Operator::Len => {
                FilterValue::Int(to_integer(value))
            }
            SemanticType::Text if is_uuid_match(field, operator) => to_uuid(value)?,
            SemanticType::Text
            | SemanticType::Relation
            | SemanticType::Array
            | SemanticType::Json => value.clone(),
        })
    }

    fn convert_date(&self, value: &FilterValue) -> Result<FilterValue, ConversionFailure> {
        match value {
            FilterValue::Text(s) => self
                .dates
                .parse_date(s)
                .map(FilterValue::Date)
                .ok_or_else(|| ConversionFailure::debug("no date format matched")),
            FilterValue::DateTime(dt) => Ok(FilterValue::Date(dt.date())),
            other => Ok(other.clone()),
        }
    }

    fn convert_datetime(&self, value: &FilterValue) -> Result<FilterValue, ConversionFailure> {
        match value {
            FilterValue::Text(s) => self
                .dates
                .parse_datetime(s)
                .map(FilterValue::DateTime)
                .ok_or_else(|| ConversionFailure::debug("no datetime format matched")),
            other => Ok(other.clone()),
        }
    }
}

/// Equality on a uuid-backed field compares uuids, not text
fn is_uuid_match(field: &FieldMetadata, operator: Operator) -> bool {
    matches!(field.storage_kind(), Some(StorageKind::Uuid))
        && matches!(operator, Operator::Exact | Operator::In)
}

fn to_uuid(value: &FilterValue) -> Result<FilterValue, ConversionFailure> {
    match value {
        FilterValue::Text(s) => uuid::Uuid::parse_str(s.trim())
            .map(FilterValue::Uuid)
            .map_err(|e| ConversionFailure::debug(format!("not a uuid: {e}"))),
        other => Ok(other.clone()),
    }
}

/// Containment on a json field compares whole documents
fn is_document_comparison(field: &FieldMetadata, operator: Operator) -> bool {
    field.semantic_type() == SemanticType::Json
        && matches!(operator, Operator::Contains | Operator::ContainedBy)
}

fn to_document(value: &FilterValue) -> Result<FilterValue, ConversionFailure> {
    match value {
        FilterValue::Text(s) => serde_json::from_str::<serde_json::Value>(s)
            .map(FilterValue::Json)
            .map_err(|e| ConversionFailure::debug(format!("not a JSON document: {e}"))),
        FilterValue::List(_) => serde_json::to_value(value)
            .map(FilterValue::Json)
            .map_err(|e| ConversionFailure::debug(e.to_string())),
        other => Ok(other.clone()),
    }
}

/// Enum values become the field's storage primitive: text or integer.
fn convert_enum(
    value: &FilterValue,
    field: &FieldMetadata,
) -> Result<FilterValue, ConversionFailure> {
    let Some(kind) = field.storage_kind() else {
        return Ok(value.clone());
    };

    if kind.is_string() {
        return Ok(match value {
            FilterValue::Text(_) => value.clone(),
            other => FilterValue::Text(other.to_string()),
        });
    }

    if kind.is_integer() {
        return match value {
            FilterValue::Int(_) => Ok(value.clone()),
            FilterValue::Bool(b) => Ok(FilterValue::Int(i64::from(*b))),
            FilterValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(FilterValue::Int)
                .map_err(|e| ConversionFailure::warn(e.to_string())),
            other => Err(ConversionFailure::warn(format!(
                "'{other}' is not an integer choice"
            ))),
        };
    }

    Ok(value.clone())
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Debug,
    Warn,
}

#[derive(Debug)]
struct ConversionFailure {
    level: Level,
    reason: String,
}

impl ConversionFailure {
    fn debug(reason: impl Into<String>) -> Self {
        Self {
            level: Level::Debug,
            reason: reason.into(),
        }
    }

    fn warn(reason: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            reason: reason.into(),
        }
    }
}
