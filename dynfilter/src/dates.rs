//! Date and datetime parsing against an ordered list of candidate formats.
//!
//! The first format that parses wins, so ambiguity (`01/02/2023`) is resolved
//! by list order, not by specificity. The lists are owned by the caller and
//! travel with the [`FilterConfig`](crate::config::FilterConfig); register
//! extra formats while building the configuration, before any filtering runs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Default date formats, in priority order
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",   // 2023-01-31
    "%d-%m-%Y",   // 31-01-2023
    "%m/%d/%Y",   // 01/31/2023
    "%d/%m/%Y",   // 31/01/2023
    "%Y/%m/%d",   // 2023/01/31
    "%b %d, %Y",  // Jan 31, 2023
    "%d %b %Y",   // 31 Jan 2023
    "%B %d, %Y",  // January 31, 2023
    "%d %B %Y",   // 31 January 2023
];

/// Default datetime formats, in priority order
pub const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Which candidate list a format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Date,
    DateTime,
}

/// Ordered `strftime` format lists for dates and datetimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateParser {
    date_formats: Vec<String>,
    datetime_formats: Vec<String>,
}

impl Default for DateParser {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(ToString::to_string).collect(),
            datetime_formats: DEFAULT_DATETIME_FORMATS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl DateParser {
    /// Parser with explicit format lists, tried in the given order
    #[must_use]
    pub fn new<D, T>(date_formats: D, datetime_formats: T) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            date_formats: date_formats.into_iter().map(Into::into).collect(),
            datetime_formats: datetime_formats.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a format ahead of every existing one.
    ///
    /// A format already in the list keeps its current position.
    pub fn register_format(&mut self, format: impl Into<String>, kind: FormatKind) {
        let format = format.into();
        let formats = match kind {
            FormatKind::Date => &mut self.date_formats,
            FormatKind::DateTime => &mut self.datetime_formats,
        };
        if !formats.contains(&format) {
            formats.insert(0, format);
        }
    }

    #[must_use]
    pub fn date_formats(&self) -> &[String] {
        &self.date_formats
    }

    #[must_use]
    pub fn datetime_formats(&self) -> &[String] {
        &self.datetime_formats
    }

    /// Parse a calendar date; `None` when no format matches
    #[must_use]
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let parsed = self
            .date_formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok());
        if parsed.is_none() {
            tracing::debug!(value = %value, "Could not parse date");
        }
        parsed
    }

    /// Parse a datetime; `None` when no format matches.
    ///
    /// Date-only input is not accepted here.
    #[must_use]
    pub fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let parsed = self
            .datetime_formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok());
        if parsed.is_none() {
            tracing::debug!(value = %value, "Could not parse datetime");
        }
        parsed
    }
}
