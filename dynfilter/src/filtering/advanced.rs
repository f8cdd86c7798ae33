//! Recursive boolean expressions from a JSON document.
//!
//! Grammar:
//!
//! ```json
//! { "operator": "AND" | "OR", "conditions": [ <node>, ... ] }   // group
//! { "field": "<name>", "value": <any>, "lookup": "<operator>" }  // leaf, lookup optional
//! ```
//!
//! Groups fold their children left to right. A group whose first child
//! compiles to nothing is itself nothing; later children that compile to
//! nothing are skipped.

use serde_json::Value;

use crate::config::ADVANCED_FILTER_PARAM;
use crate::errors::{DiagnosticKind, Diagnostics};
use crate::fields::{FieldRegistry, Operator};
use crate::params::RequestValueExtractor;
use crate::value::FilterValue;

use super::conditions::BasicFieldFilter;
use super::predicate::{Combinator, Predicate};

/// Percent-decode and parse an advanced filter parameter.
///
/// # Errors
///
/// Returns a description of the problem when the text is not JSON or the
/// top-level value is not an object.
pub fn decode_document(raw: &str) -> Result<Value, String> {
    let decoded = url_escape::decode(raw);
    let document: Value = serde_json::from_str(&decoded).map_err(|e| e.to_string())?;
    if document.is_object() {
        Ok(document)
    } else {
        Err("top-level value must be a JSON object".to_string())
    }
}

/// Advanced (JSON expression) filter strategy.
#[derive(Debug, Clone, Copy)]
pub struct AdvancedFilter<'a> {
    registry: &'a FieldRegistry,
    extractor: RequestValueExtractor<'a>,
    basic: BasicFieldFilter<'a>,
}

/// Nodes visited so far against the configured bounds
struct Budget {
    nodes: usize,
    max_nodes: usize,
    max_depth: usize,
    exceeded: bool,
}

impl Budget {
    fn enter(&mut self, depth: usize) -> bool {
        self.nodes += 1;
        if self.nodes > self.max_nodes || depth > self.max_depth {
            self.exceeded = true;
        }
        !self.exceeded
    }
}

impl<'a> AdvancedFilter<'a> {
    #[must_use]
    pub const fn new(
        registry: &'a FieldRegistry,
        extractor: RequestValueExtractor<'a>,
        basic: BasicFieldFilter<'a>,
    ) -> Self {
        Self {
            registry,
            extractor,
            basic,
        }
    }

    /// Compile the request's advanced filter parameter.
    ///
    /// Absent when the parameter is missing or blank, when it is not a JSON
    /// object, or when nothing in it compiles.
    pub fn build(&self, diagnostics: &mut Diagnostics) -> Option<Predicate> {
        let raw = self
            .extractor
            .get_single(ADVANCED_FILTER_PARAM, diagnostics)?;
        if raw.trim().is_empty() {
            return None;
        }

        let document = match decode_document(&raw) {
            Ok(document) => document,
            Err(e) => {
                diagnostics.error(
                    DiagnosticKind::MalformedInput,
                    format!("Error parsing advanced filter: {e}"),
                );
                return None;
            }
        };
        self.compile_document(&document, diagnostics)
    }

    /// Compile an already-parsed document.
    ///
    /// Exceeding the configured depth or node count drops the whole document.
    pub fn compile_document(
        &self,
        document: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        let config = self.registry.config();
        let mut budget = Budget {
            nodes: 0,
            max_nodes: config.max_conditions,
            max_depth: config.max_depth,
            exceeded: false,
        };

        let predicate = self.compile(document, 0, &mut budget, diagnostics);
        if budget.exceeded {
            diagnostics.warn(
                DiagnosticKind::LimitExceeded,
                format!(
                    "Advanced filter exceeds limits (max depth {}, max conditions {}); ignoring it",
                    budget.max_depth, budget.max_nodes
                ),
            );
            return None;
        }
        predicate
    }

    fn compile(
        &self,
        node: &Value,
        depth: usize,
        budget: &mut Budget,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        if !budget.enter(depth) {
            return None;
        }

        let Some(object) = node.as_object() else {
            diagnostics.warn(DiagnosticKind::MalformedInput, "Invalid filter condition format");
            return None;
        };

        let group = (object.get("operator"), object.get("conditions"));
        if let (Some(operator), Some(conditions)) = group {
            self.compile_group(operator, conditions, depth, budget, diagnostics)
        } else if let (Some(field), Some(value)) = (object.get("field"), object.get("value")) {
            self.compile_leaf(field, value, object.get("lookup"), diagnostics)
        } else {
            diagnostics.warn(DiagnosticKind::MalformedInput, "Invalid filter condition format");
            None
        }
    }

    fn compile_group(
        &self,
        operator: &Value,
        conditions: &Value,
        depth: usize,
        budget: &mut Budget,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        let Some(conditions) = conditions.as_array() else {
            diagnostics.warn(
                DiagnosticKind::MalformedInput,
                "Group 'conditions' must be a list",
            );
            return None;
        };

        let combinator = operator.as_str().and_then(Combinator::parse).unwrap_or_else(|| {
            diagnostics.warn(
                DiagnosticKind::MalformedInput,
                format!("Unsupported operator: {operator}, using AND"),
            );
            Combinator::And
        });

        let mut children = conditions.iter();
        let mut result = self.compile(children.next()?, depth + 1, budget, diagnostics)?;

        for child in children {
            if let Some(next) = self.compile(child, depth + 1, budget, diagnostics) {
                result = result.combine(next, combinator);
            }
            if budget.exceeded {
                return None;
            }
        }
        Some(result)
    }

    fn compile_leaf(
        &self,
        field: &Value,
        value: &Value,
        lookup: Option<&Value>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Predicate> {
        let Some(name) = field.as_str() else {
            diagnostics.warn(
                DiagnosticKind::MalformedInput,
                format!("Condition 'field' must be a string, got {field}"),
            );
            return None;
        };

        let Some(metadata) = self.registry.get(name) else {
            diagnostics.warn(DiagnosticKind::UnknownField, format!("Unknown field: {name}"));
            return None;
        };

        let operator = match lookup {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => match token.parse::<Operator>() {
                Ok(op) => Some(op),
                Err(e) => {
                    diagnostics.warn(
                        DiagnosticKind::DisallowedOperator,
                        format!(
                            "{e} for field '{name}'. Using default: {}",
                            metadata.default_operator()
                        ),
                    );
                    None
                }
            },
            Some(other) => {
                diagnostics.warn(
                    DiagnosticKind::DisallowedOperator,
                    format!(
                        "Lookup {other} for field '{name}' is not a string. Using default: {}",
                        metadata.default_operator()
                    ),
                );
                None
            }
        };

        self.basic
            .build(metadata, Some(FilterValue::from_json(value)), operator, diagnostics)
    }
}
