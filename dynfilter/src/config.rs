//! Reserved parameter names and per-registry filter configuration.

use serde::Deserialize;

use crate::dates::DateParser;

/// Reserved parameter carrying the free-text search token
pub const SEARCH_PARAM: &str = "search";
/// Reserved parameter carrying the ordering specification
pub const ORDERING_PARAM: &str = "ordering";
/// Reserved parameter carrying the URL-encoded JSON boolean expression
pub const ADVANCED_FILTER_PARAM: &str = "filter";
/// Pagination parameters, never treated as fields
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Parameters skipped by per-field filtering
pub const RESERVED_PARAMS: &[&str] = &[
    PAGE_PARAM,
    PAGE_SIZE_PARAM,
    SEARCH_PARAM,
    ADVANCED_FILTER_PARAM,
    ORDERING_PARAM,
];

pub const DEFAULT_ORDERING: &str = "-last_modified_date";
pub const DEFAULT_MAX_DEPTH: usize = 16;
pub const DEFAULT_MAX_CONDITIONS: usize = 256;

/// Whether `name` is one of the reserved parameter names
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMS.contains(&name)
}

/// Caller-supplied filter configuration.
///
/// # Allow-lists
/// When `filterable_fields` or `searchable_fields` is set (and non-empty) it is
/// the only source of truth for that flag. Left unset, every field is
/// filterable and searchability follows each field's own declaration.
///
/// # Example
/// ```json
/// {
///   "filterable_fields": ["title", "price", "published_on"],
///   "searchable_fields": ["title"],
///   "default_ordering": "-published_on",
///   "max_depth": 8
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Exclusive allow-list of filterable field names
    pub filterable_fields: Option<Vec<String>>,
    /// Exclusive allow-list of searchable field names
    pub searchable_fields: Option<Vec<String>>,
    /// Ordering used when the request has no `ordering` parameter
    pub default_ordering: String,
    /// Deepest group nesting accepted in the advanced filter
    pub max_depth: usize,
    /// Most nodes (groups and leaves) accepted in one advanced filter
    pub max_conditions: usize,
    /// Candidate formats for date and datetime values
    pub dates: DateParser,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filterable_fields: None,
            searchable_fields: None,
            default_ordering: DEFAULT_ORDERING.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_conditions: DEFAULT_MAX_CONDITIONS,
            dates: DateParser::default(),
        }
    }
}

impl FilterConfig {
    #[must_use]
    pub fn with_filterable_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable_fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_searchable_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_default_ordering(mut self, ordering: impl Into<String>) -> Self {
        self.default_ordering = ordering.into();
        self
    }

    #[must_use]
    pub fn with_dates(mut self, dates: DateParser) -> Self {
        self.dates = dates;
        self
    }

    /// `Some(list)` only when an allow-list is configured and non-empty
    pub(crate) fn filter_allow_list(&self) -> Option<&[String]> {
        self.filterable_fields.as_deref().filter(|l| !l.is_empty())
    }

    pub(crate) fn search_allow_list(&self) -> Option<&[String]> {
        self.searchable_fields.as_deref().filter(|l| !l.is_empty())
    }
}
