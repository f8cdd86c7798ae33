//! Request parameter containers.
//!
//! Filtering reads parameters through [`ParamSource`], so any container can
//! feed it: a parsed query string with repeated keys ([`QueryParams`]), a plain
//! string map, or a JSON object.

use std::collections::{BTreeMap, HashMap};

use crate::errors::{DiagnosticKind, Diagnostics, ParamError};
use crate::value::FilterValue;

/// A parameter as read from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    /// Repeated key, in request order
    Multiple(Vec<String>),
}

impl ParamValue {
    /// Every value, in order
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(v) => vec![v.as_str()],
            Self::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the parameter carries nothing but empty strings
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }

    #[must_use]
    pub fn into_filter_value(self) -> FilterValue {
        match self {
            Self::Single(v) => FilterValue::Text(v),
            Self::Multiple(vs) => {
                FilterValue::List(vs.into_iter().map(FilterValue::Text).collect())
            }
        }
    }

    /// JSON form used when reporting the applied parameters
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Single(v) => serde_json::Value::String(v.clone()),
            Self::Multiple(vs) => vs.iter().cloned().map(serde_json::Value::String).collect(),
        }
    }
}

/// A container of request parameters.
pub trait ParamSource {
    /// Parameter names in request order, each listed once
    fn names(&self) -> Vec<&str>;

    /// Read one parameter.
    ///
    /// # Errors
    ///
    /// Returns a [`ParamError`] when the parameter exists but cannot be
    /// represented as text.
    fn lookup(&self, name: &str) -> Result<Option<ParamValue>, ParamError>;
}

/// Ordered multi-map of query parameters, supporting repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Builder form of [`QueryParams::append`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// All values for `name`, in order
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ParamSource for QueryParams {
    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.pairs {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    fn lookup(&self, name: &str) -> Result<Option<ParamValue>, ParamError> {
        let mut values = self.get_all(name);
        Ok(match values.len() {
            0 => None,
            1 => Some(ParamValue::Single(values.remove(0).to_string())),
            _ => Some(ParamValue::Multiple(
                values.into_iter().map(ToString::to_string).collect(),
            )),
        })
    }
}

/// Plain maps have no inherent order; names are reported sorted.
impl ParamSource for HashMap<String, String> {
    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, name: &str) -> Result<Option<ParamValue>, ParamError> {
        Ok(self.get(name).cloned().map(ParamValue::Single))
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn lookup(&self, name: &str) -> Result<Option<ParamValue>, ParamError> {
        Ok(self.get(name).cloned().map(ParamValue::Single))
    }
}

/// JSON bodies: scalars become single values, arrays repeated values.
impl ParamSource for serde_json::Map<String, serde_json::Value> {
    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn lookup(&self, name: &str) -> Result<Option<ParamValue>, ParamError> {
        use serde_json::Value;

        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        match value {
            Value::Null => Ok(None),
            Value::Array(items) => items
                .iter()
                .map(|item| json_scalar(name, item))
                .collect::<Result<Vec<_>, _>>()
                .map(|vs| Some(ParamValue::Multiple(vs))),
            scalar => json_scalar(name, scalar).map(|v| Some(ParamValue::Single(v))),
        }
    }
}

fn json_scalar(name: &str, value: &serde_json::Value) -> Result<String, ParamError> {
    use serde_json::Value;
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(ParamError::new(
            name,
            "nested arrays and objects are not parameter values",
        )),
    }
}

/// Uniform, never-failing read access over a [`ParamSource`].
///
/// Extraction errors are turned into `ExtractionFailed` diagnostics and the
/// parameter is treated as absent.
#[derive(Clone, Copy)]
pub struct RequestValueExtractor<'a> {
    source: &'a dyn ParamSource,
}

impl std::fmt::Debug for RequestValueExtractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValueExtractor")
            .field("names", &self.source.names())
            .finish()
    }
}

impl<'a> RequestValueExtractor<'a> {
    #[must_use]
    pub fn new(source: &'a dyn ParamSource) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'a str> {
        self.source.names()
    }

    /// Raw parameter value, absent on a missing key or a read failure
    pub fn get_raw(&self, name: &str, diagnostics: &mut Diagnostics) -> Option<ParamValue> {
        match self.source.lookup(name) {
            Ok(value) => value,
            Err(e) => {
                diagnostics.warn(DiagnosticKind::ExtractionFailed, e.to_string());
                None
            }
        }
    }

    /// Parameter as a filter operand: a scalar, or a list for repeated keys
    pub fn get(&self, name: &str, diagnostics: &mut Diagnostics) -> Option<FilterValue> {
        self.get_raw(name, diagnostics)
            .map(ParamValue::into_filter_value)
    }

    /// First value only, for parameters that are single by nature
    pub fn get_single(&self, name: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        match self.get_raw(name, diagnostics)? {
            ParamValue::Single(v) => Some(v),
            ParamValue::Multiple(vs) => vs.into_iter().next(),
        }
    }
}
