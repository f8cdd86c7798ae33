//! # Error Handling for Filter Construction
//!
//! Filtering is permissive toward caller input: a bad parameter never fails the
//! request, it is dropped and reported. Only two kinds of problem are fatal and
//! surface as [`FilterError`]; everything else becomes a [`Diagnostic`] that is
//! logged through `tracing` and returned alongside the result.
//!
//! ## Philosophy
//!
//! **One bad field must not sink the whole query.** Malformed JSON, unknown
//! fields, disallowed operators and unparsable values contribute nothing to the
//! predicate. The caller can still inspect what was dropped:
//!
//! ```rust,ignore
//! let outcome = filter.apply();
//! for diagnostic in outcome.diagnostics.iter() {
//!     println!("{:?}: {}", diagnostic.kind, diagnostic.message);
//! }
//! ```
//!
//! ## Logging
//!
//! Diagnostics are emitted with the `tracing` crate at the time they are
//! recorded. Install a subscriber in your application to see them:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt().with_target(false).compact().init();
//! ```

use serde::Serialize;
use std::fmt;

/// Fatal construction errors.
///
/// These are raised only when no meaningful field registry can exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// No model name was supplied
    MissingSchema,

    /// The schema provider cannot describe the requested model
    UnknownModel {
        /// Model name that was requested
        model: String,
    },
}

impl FilterError {
    /// Create an unknown model error
    pub fn unknown_model(model: impl Into<String>) -> Self {
        Self::UnknownModel {
            model: model.into(),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSchema => write!(f, "a model must be provided to build a filter"),
            Self::UnknownModel { model } => {
                write!(f, "model '{model}' is not described by the schema provider")
            }
        }
    }
}

impl std::error::Error for FilterError {}

/// Failure while reading a single request parameter.
///
/// Raised by [`ParamSource`](crate::params::ParamSource) implementations and
/// absorbed by the value extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamError {
    /// Parameter that could not be read
    pub name: String,
    /// What went wrong
    pub reason: String,
}

impl ParamError {
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter '{}': {}", self.name, self.reason)
    }
}

impl std::error::Error for ParamError {}

/// Category of a non-fatal problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Input that could not be parsed (bad JSON, bad date, bad node shape)
    MalformedInput,
    /// Reference to a field the registry does not know
    UnknownField,
    /// Operator not allowed for the field it was applied to
    DisallowedOperator,
    /// Value coercion failed and the raw value was kept
    ConversionFailed,
    /// A request parameter could not be read
    ExtractionFailed,
    /// Advanced filter exceeded the configured depth or size
    LimitExceeded,
    /// A relation points at a model the schema provider cannot describe
    UnresolvedRelation,
}

/// A dropped or degraded piece of input, with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Ordered collection of diagnostics.
///
/// Recording a diagnostic also logs it, so the collector and the log sink never
/// disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic logged at `warn` level
    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(kind = ?kind, "{message}");
        self.entries.push(Diagnostic { kind, message });
    }

    /// Record a diagnostic logged at `error` level
    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(kind = ?kind, "{message}");
        self.entries.push(Diagnostic { kind, message });
    }

    /// Record a diagnostic logged at `debug` level
    pub fn debug(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(kind = ?kind, "{message}");
        self.entries.push(Diagnostic { kind, message });
    }

    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Whether any recorded diagnostic has the given kind
    #[must_use]
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_schema_message() {
        let err = FilterError::MissingSchema;
        assert_eq!(err.to_string(), "a model must be provided to build a filter");
    }

    #[test]
    fn test_unknown_model_message() {
        let err = FilterError::unknown_model("book");
        assert_eq!(
            err.to_string(),
            "model 'book' is not described by the schema provider"
        );
    }

    #[test]
    fn test_param_error_display() {
        let err = ParamError::new("title", "nested objects are not parameters");
        assert_eq!(
            err.to_string(),
            "parameter 'title': nested objects are not parameters"
        );
    }

    /// Diagnostics keep insertion order and can be queried by kind
    #[test]
    fn test_diagnostics_collect_in_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.warn(DiagnosticKind::UnknownField, "unknown field 'x'");
        diagnostics.debug(DiagnosticKind::MalformedInput, "could not parse date");

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.contains(DiagnosticKind::UnknownField));
        assert!(!diagnostics.contains(DiagnosticKind::LimitExceeded));

        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::UnknownField, DiagnosticKind::MalformedInput]
        );
    }

    #[test]
    fn test_diagnostics_extend() {
        let mut first = Diagnostics::new();
        first.warn(DiagnosticKind::UnknownField, "a");
        let mut second = Diagnostics::new();
        second.error(DiagnosticKind::MalformedInput, "b");

        first.extend(second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_diagnostics_serialize_as_list() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(DiagnosticKind::DisallowedOperator, "no");
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "kind": "disallowed_operator", "message": "no" }])
        );
    }
}
