//! Ordering from the comma-separated `ordering` parameter.

use serde::Serialize;
use std::fmt;

use crate::config::ORDERING_PARAM;
use crate::errors::{DiagnosticKind, Diagnostics};
use crate::fields::FieldRegistry;
use crate::params::{ParamValue, RequestValueExtractor};

/// One ordering instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SortKey {
    pub field_path: String,
    pub descending: bool,
}

impl SortKey {
    #[must_use]
    pub fn asc(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            descending: false,
        }
    }

    #[must_use]
    pub fn desc(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            descending: true,
        }
    }
}

/// `-path` for descending keys, `path` otherwise
impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(&self.field_path)
    }
}

/// Turns the ordering parameter into validated sort keys.
#[derive(Debug, Clone, Copy)]
pub struct OrderingBuilder<'a> {
    registry: &'a FieldRegistry,
    extractor: RequestValueExtractor<'a>,
}

impl<'a> OrderingBuilder<'a> {
    #[must_use]
    pub const fn new(registry: &'a FieldRegistry, extractor: RequestValueExtractor<'a>) -> Self {
        Self {
            registry,
            extractor,
        }
    }

    /// Sort keys in the order the caller gave them.
    ///
    /// Without an ordering parameter the configured default ordering applies;
    /// a blank parameter means no ordering. Unknown and non-orderable tokens
    /// are dropped.
    pub fn build(&self, diagnostics: &mut Diagnostics) -> Vec<SortKey> {
        let tokens: Vec<String> = match self.extractor.get_raw(ORDERING_PARAM, diagnostics) {
            Some(ParamValue::Single(ordering)) => split_tokens(&ordering),
            Some(ParamValue::Multiple(orderings)) => {
                orderings.iter().flat_map(|s| split_tokens(s)).collect()
            }
            None => split_tokens(&self.registry.config().default_ordering),
        };

        tokens
            .iter()
            .filter_map(|token| self.resolve(token, diagnostics))
            .collect()
    }

    fn resolve(&self, token: &str, diagnostics: &mut Diagnostics) -> Option<SortKey> {
        let (name, descending) = token
            .strip_prefix('-')
            .map_or((token, false), |name| (name, true));

        let Some(field) = self.registry.get(name) else {
            diagnostics.debug(
                DiagnosticKind::UnknownField,
                format!("Dropping unknown ordering field '{name}'"),
            );
            return None;
        };
        if !field.is_orderable() {
            diagnostics.debug(
                DiagnosticKind::UnknownField,
                format!("Dropping non-orderable ordering field '{name}'"),
            );
            return None;
        }

        Some(SortKey {
            field_path: field.field_path().to_string(),
            descending,
        })
    }
}

fn split_tokens(ordering: &str) -> Vec<String> {
    ordering
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::fields::{FieldDescriptor, FieldFilterConfig, SchemaCatalog, StorageKind};
    use crate::params::QueryParams;
    use crate::test_fixtures::book_registry;

    fn order(registry: &FieldRegistry, params: &QueryParams) -> Vec<SortKey> {
        OrderingBuilder::new(registry, RequestValueExtractor::new(params))
            .build(&mut Diagnostics::new())
    }

    #[test]
    fn test_caller_order_is_preserved() {
        let registry = book_registry();
        let params = QueryParams::new().with(ORDERING_PARAM, "-pages, title");
        assert_eq!(
            order(&registry, &params),
            vec![SortKey::desc("pages"), SortKey::asc("title")]
        );
    }

    #[test]
    fn test_unknown_tokens_dropped() {
        let registry = book_registry();
        let params = QueryParams::new().with(ORDERING_PARAM, "bogus,title,-");
        assert_eq!(order(&registry, &params), vec![SortKey::asc("title")]);
    }

    /// Related fields sort by their dotted path
    #[test]
    fn test_related_field_uses_path() {
        let registry = book_registry();
        let params = QueryParams::new().with(ORDERING_PARAM, "-publisher_name,name");
        assert_eq!(
            order(&registry, &params),
            vec![SortKey::desc("publisher.name"), SortKey::asc("author.name")]
        );
    }

    #[test]
    fn test_default_ordering_when_absent() {
        let registry = book_registry();
        assert_eq!(
            order(&registry, &QueryParams::new()),
            vec![SortKey::desc("last_modified_date")]
        );
    }

    #[test]
    fn test_blank_ordering_is_empty() {
        let registry = book_registry();
        let params = QueryParams::new().with(ORDERING_PARAM, "");
        assert!(order(&registry, &params).is_empty());
    }

    #[test]
    fn test_repeated_ordering_params() {
        let registry = book_registry();
        let params = QueryParams::new()
            .with(ORDERING_PARAM, "title")
            .with(ORDERING_PARAM, "-price");
        assert_eq!(
            order(&registry, &params),
            vec![SortKey::asc("title"), SortKey::desc("price")]
        );
    }

    #[test]
    fn test_non_orderable_dropped() {
        let catalog = SchemaCatalog::new().with_model(
            "item",
            vec![
                FieldDescriptor::new("rank", StorageKind::Integer),
                FieldDescriptor::new("blob", StorageKind::Text).with_filter(FieldFilterConfig {
                    orderable: Some(false),
                    ..FieldFilterConfig::default()
                }),
            ],
        );
        let registry =
            FieldRegistry::build(&catalog, "item", &[], FilterConfig::default()).unwrap();
        let params = QueryParams::new().with(ORDERING_PARAM, "blob,-rank");
        assert_eq!(order(&registry, &params), vec![SortKey::desc("rank")]);
    }

    #[test]
    fn test_display() {
        assert_eq!(SortKey::desc("a.b").to_string(), "-a.b");
        assert_eq!(SortKey::asc("a").to_string(), "a");
    }
}
