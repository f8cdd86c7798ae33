//! Composition of every strategy into one predicate and sort order.

use serde::Serialize;
use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{ADVANCED_FILTER_PARAM, FilterConfig, ORDERING_PARAM, SEARCH_PARAM, is_reserved};
use crate::errors::{DiagnosticKind, Diagnostics, FilterError};
use crate::fields::{
    ComputedField, FieldMetadata, FieldRegistry, FilterableField, Operator, SchemaProvider,
};
use crate::filtering::{
    AdvancedFilter, BasicFieldFilter, OrderingBuilder, Predicate, RangeFilter, SearchFilter,
    SortKey, decode_document,
};
use crate::params::{ParamSource, RequestValueExtractor};

/// Separator between a field name and an operator in a parameter name
pub const LOOKUP_SEPARATOR: &str = "__";

/// Result of applying a filter to a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    /// `None` when nothing in the request filters anything
    pub predicate: Option<Predicate>,
    pub sort_keys: Vec<SortKey>,
    /// Input that was dropped or degraded on the way
    pub diagnostics: Diagnostics,
}

/// What a request parameter addresses in the per-field pass.
#[derive(Debug, Clone, Copy)]
enum ParamTarget<'r> {
    /// Pagination, search, advanced filter or ordering
    Reserved,
    /// Exact field name
    Field(&'r FieldMetadata),
    /// `<field>__<operator>` with an operator the field allows
    Lookup(&'r FieldMetadata, Operator),
    /// `<field>__<operator>` with an operator the field does not allow
    RejectedLookup(&'r FieldMetadata, &'r str),
    Ignored,
}

/// Filter for one model and one request.
///
/// # Precedence
///
/// When the request carries an advanced filter that compiles, it is the whole
/// predicate: search, per-field and range parameters are not consulted.
/// Otherwise the predicate is the AND of the search predicate, one predicate
/// per field parameter, and the range bounds.
///
/// # Example
///
/// ```rust,ignore
/// let params = QueryParams::parse("title=dune&pages__gte=300&ordering=-published_on");
/// let filter = ModelFilter::new(&registry, &params);
/// let outcome = filter.apply();
/// if let Some(predicate) = &outcome.predicate {
///     println!("{predicate}");
/// }
/// ```
pub struct ModelFilter<'a> {
    registry: Cow<'a, FieldRegistry>,
    params: &'a dyn ParamSource,
    outcome: OnceCell<FilterOutcome>,
}

impl fmt::Debug for ModelFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFilter")
            .field("model", &self.registry.model())
            .field("params", &self.params.names())
            .field("outcome", &self.outcome.get())
            .finish()
    }
}

impl<'a> ModelFilter<'a> {
    /// Filter `params` against an existing registry
    #[must_use]
    pub fn new(registry: &'a FieldRegistry, params: &'a dyn ParamSource) -> Self {
        Self {
            registry: Cow::Borrowed(registry),
            params,
            outcome: OnceCell::new(),
        }
    }

    /// Build a registry for `model` and filter `params` against it.
    ///
    /// # Errors
    ///
    /// Fails when the model name is empty or `provider` does not know it.
    pub fn for_model(
        provider: &dyn SchemaProvider,
        model: &str,
        computed: &[ComputedField],
        config: FilterConfig,
        params: &'a dyn ParamSource,
    ) -> Result<Self, FilterError> {
        let registry = FieldRegistry::build(provider, model, computed, config)?;
        Ok(Self {
            registry: Cow::Owned(registry),
            params,
            outcome: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Build the predicate and sort order; later calls return the same result
    pub fn apply(&self) -> &FilterOutcome {
        self.outcome.get_or_init(|| self.compute())
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.apply().predicate.as_ref()
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.apply().sort_keys
    }

    /// Description of every filterable field, keyed by name
    #[must_use]
    pub fn get_filterable_fields(&self) -> BTreeMap<String, FilterableField> {
        self.registry.filterable_fields()
    }

    fn compute(&self) -> FilterOutcome {
        let registry = self.registry();
        let dates = &registry.config().dates;
        let extractor = RequestValueExtractor::new(self.params);
        let basic = BasicFieldFilter::new(extractor, dates);
        let mut diagnostics = Diagnostics::new();

        let advanced = AdvancedFilter::new(registry, extractor, basic).build(&mut diagnostics);
        let predicate = match advanced {
            Some(advanced) => Some(advanced),
            None => {
                let mut parts = Vec::new();
                let search = SearchFilter::new(extractor, dates);
                if let Some(search) = search.build(registry, &mut diagnostics) {
                    parts.push(search);
                }
                self.field_predicates(extractor, basic, &mut parts, &mut diagnostics);

                let range = RangeFilter::new(extractor, dates);
                for field in registry {
                    if let Some(bounds) = range.build(field, &mut diagnostics) {
                        parts.push(bounds);
                    }
                }
                Predicate::all(parts)
            }
        };

        let sort_keys = OrderingBuilder::new(registry, extractor).build(&mut diagnostics);

        tracing::debug!(
            model = %registry.model(),
            predicate = %predicate.as_ref().map_or_else(|| "none".to_string(), ToString::to_string),
            sort_keys = sort_keys.len(),
            dropped = diagnostics.len(),
            "Applied filter"
        );

        FilterOutcome {
            predicate,
            sort_keys,
            diagnostics,
        }
    }

    /// One predicate per parameter naming a field or a field lookup
    fn field_predicates(
        &self,
        extractor: RequestValueExtractor<'_>,
        basic: BasicFieldFilter<'_>,
        parts: &mut Vec<Predicate>,
        diagnostics: &mut Diagnostics,
    ) {
        for name in extractor.names() {
            let (field, operator) = match self.classify_param(name) {
                ParamTarget::Reserved | ParamTarget::Ignored => continue,
                ParamTarget::Field(field) => (field, None),
                ParamTarget::Lookup(field, operator) => (field, Some(operator)),
                ParamTarget::RejectedLookup(field, lookup) => {
                    diagnostics.warn(
                        DiagnosticKind::DisallowedOperator,
                        format!(
                            "Lookup '{lookup}' not allowed for field '{}'; ignoring '{name}'",
                            field.name()
                        ),
                    );
                    continue;
                }
            };
            let Some(value) = extractor.get(name, diagnostics) else {
                continue;
            };
            if let Some(predicate) = basic.build(field, Some(value), operator, diagnostics) {
                parts.push(predicate);
            }
        }
    }

    fn classify_param<'p>(&'p self, name: &'p str) -> ParamTarget<'p> {
        if is_reserved(name) {
            return ParamTarget::Reserved;
        }
        if let Some(field) = self.registry.get(name) {
            return ParamTarget::Field(field);
        }
        let Some((field_name, lookup)) = name.split_once(LOOKUP_SEPARATOR) else {
            return ParamTarget::Ignored;
        };
        let Some(field) = self.registry.get(field_name) else {
            return ParamTarget::Ignored;
        };
        match lookup.parse::<Operator>() {
            Ok(operator) if field.allows(operator) => ParamTarget::Lookup(field, operator),
            _ => ParamTarget::RejectedLookup(field, lookup),
        }
    }

    /// The applied parameters in a form suitable for saving.
    ///
    /// Pagination, ordering and the advanced filter are left out of the plain
    /// entries; the decoded advanced filter is stored under `_advanced_filter`
    /// and the ordering under `_ordering`. The search term is kept. Anything
    /// skipped on the way is reported in the returned diagnostics.
    #[must_use]
    pub fn get_filter_params(&self) -> (serde_json::Map<String, serde_json::Value>, Diagnostics) {
        let extractor = RequestValueExtractor::new(self.params);
        let mut diagnostics = Diagnostics::new();
        let mut saved = serde_json::Map::new();

        for name in extractor.names() {
            if is_reserved(name) && name != SEARCH_PARAM {
                continue;
            }
            if let Some(value) = extractor.get_raw(name, &mut diagnostics) {
                saved.insert(name.to_string(), value.to_json());
            }
        }

        if let Some(raw) = extractor.get_single(ADVANCED_FILTER_PARAM, &mut diagnostics) {
            match decode_document(&raw) {
                Ok(document) => {
                    saved.insert("_advanced_filter".to_string(), document);
                }
                Err(e) => diagnostics.warn(
                    DiagnosticKind::MalformedInput,
                    format!("Failed to parse advanced filter: {e}"),
                ),
            }
        }

        if let Some(ordering) = extractor.get_raw(ORDERING_PARAM, &mut diagnostics) {
            saved.insert("_ordering".to_string(), ordering.to_json());
        }

        (saved, diagnostics)
    }

    /// The request's parameters as a percent-encoded query string.
    ///
    /// Empty values are skipped and repeated keys are repeated. A parameter
    /// that cannot be read is left out and reported in the diagnostics.
    #[must_use]
    pub fn to_url_params(&self) -> (String, Diagnostics) {
        let extractor = RequestValueExtractor::new(self.params);
        let mut diagnostics = Diagnostics::new();
        let mut pairs = Vec::new();

        for name in extractor.names() {
            let Some(value) = extractor.get_raw(name, &mut diagnostics) else {
                continue;
            };
            let key = url_escape::encode_component(name);
            for item in value.values().into_iter().filter(|v| !v.is_empty()) {
                pairs.push(format!("{key}={}", url_escape::encode_component(item)));
            }
        }

        (pairs.join("&"), diagnostics)
    }
}
