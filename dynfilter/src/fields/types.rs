//! Semantic field types and the comparison operators each one accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::schema::{FieldDescriptor, StorageKind};

/// Storage-agnostic classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Enum,
    Relation,
    Array,
    Json,
}

impl SemanticType {
    pub const ALL: [Self; 10] = [
        Self::Text,
        Self::Integer,
        Self::Decimal,
        Self::Boolean,
        Self::Date,
        Self::Datetime,
        Self::Enum,
        Self::Relation,
        Self::Array,
        Self::Json,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Enum => "enum",
            Self::Relation => "relation",
            Self::Array => "array",
            Self::Json => "json",
        }
    }

    /// Operator used when the caller does not name one
    #[must_use]
    pub const fn default_operator(self) -> Operator {
        match self {
            Self::Text => Operator::IContains,
            Self::Array => Operator::Contains,
            Self::Json => Operator::HasKey,
            Self::Integer
            | Self::Decimal
            | Self::Boolean
            | Self::Date
            | Self::Datetime
            | Self::Enum
            | Self::Relation => Operator::Exact,
        }
    }

    /// Operators a caller may request, in declaration order
    #[must_use]
    pub const fn allowed_operators(self) -> &'static [Operator] {
        use Operator::{
            ContainedBy, Contains, Date, Exact, Gt, Gte, HasKey, IContains, IExact, IStartsWith,
            In, Len, Lt, Lte, Overlap, Range, StartsWith,
        };
        match self {
            Self::Text => &[Exact, IExact, Contains, IContains, StartsWith, IStartsWith],
            Self::Integer => &[Exact, Gt, Gte, Lt, Lte, In, Range],
            Self::Decimal | Self::Date => &[Exact, Gt, Gte, Lt, Lte, Range],
            Self::Boolean => &[Exact],
            Self::Datetime => &[Exact, Gt, Gte, Lt, Lte, Range, Date],
            Self::Enum | Self::Relation => &[Exact, In],
            Self::Array => &[Contains, ContainedBy, Overlap, Len],
            Self::Json => &[HasKey, Contains, ContainedBy],
        }
    }

    /// Whether `<field>_min` / `<field>_max` bounds apply by default
    #[must_use]
    pub const fn is_range_eligible(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Datetime | Self::Integer | Self::Decimal
        )
    }

    /// Whether free-text search applies by default
    #[must_use]
    pub const fn is_searchable(self) -> bool {
        matches!(self, Self::Text | Self::Enum)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named comparison between a field path and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Exact,
    #[serde(rename = "iexact")]
    IExact,
    Contains,
    #[serde(rename = "icontains")]
    IContains,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "istartswith")]
    IStartsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Range,
    Date,
    HasKey,
    ContainedBy,
    Overlap,
    Len,
    /// Never requested directly; produced for `null` values
    #[serde(rename = "isnull")]
    IsNull,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Range => "range",
            Self::Date => "date",
            Self::HasKey => "has_key",
            Self::ContainedBy => "contained_by",
            Self::Overlap => "overlap",
            Self::Len => "len",
            Self::IsNull => "isnull",
        }
    }

    /// `in` and `range` take a sequence; every other operator takes one value
    #[must_use]
    pub const fn expects_many(self) -> bool {
        matches!(self, Self::In | Self::Range)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "exact" => Self::Exact,
            "iexact" => Self::IExact,
            "contains" => Self::Contains,
            "icontains" => Self::IContains,
            "startswith" => Self::StartsWith,
            "istartswith" => Self::IStartsWith,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "in" => Self::In,
            "range" => Self::Range,
            "date" => Self::Date,
            "has_key" => Self::HasKey,
            "contained_by" => Self::ContainedBy,
            "overlap" => Self::Overlap,
            "len" => Self::Len,
            "isnull" => Self::IsNull,
            _ => return Err(UnknownOperator(s.to_string())),
        })
    }
}

/// Returned when an operator token is not recognised at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

/// Map a schema field to its semantic type.
///
/// First match wins: enumerated choices, date, datetime, json, the storage
/// kind table, then `text`.
#[must_use]
pub fn classify(descriptor: &FieldDescriptor) -> SemanticType {
    if descriptor.is_enumerated() {
        return SemanticType::Enum;
    }
    classify_kind(&descriptor.kind)
}

/// Classification by storage kind alone, for fields with no choice set.
#[must_use]
pub fn classify_kind(kind: &StorageKind) -> SemanticType {
    storage_kind_type(kind).unwrap_or(SemanticType::Text)
}

fn storage_kind_type(kind: &StorageKind) -> Option<SemanticType> {
    use StorageKind as K;
    Some(match kind {
        K::Char | K::Text | K::Slug | K::Email | K::Url | K::File | K::FilePath | K::Time => {
            SemanticType::Text
        }
        K::Integer
        | K::PositiveInteger
        | K::SmallInteger
        | K::BigInteger
        | K::Auto
        | K::BigAuto => SemanticType::Integer,
        K::Float | K::Decimal => SemanticType::Decimal,
        K::Boolean | K::NullBoolean => SemanticType::Boolean,
        K::Date => SemanticType::Date,
        K::DateTime => SemanticType::Datetime,
        K::ForeignKey | K::OneToOne | K::ManyToMany => SemanticType::Relation,
        K::Json => SemanticType::Json,
        K::Array => SemanticType::Array,
        K::Uuid | K::Other(_) => return None,
    })
}
