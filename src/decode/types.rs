//! Decoder types and traits
//!
//! Defines the core decoder abstractions.

use crate::error::Result;
use crate::response::QueryResponse;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A dot-separated path into a JSON document (`events.attributes.entities`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dot path; empty segments are skipped
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether the path selects the document itself
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// One decoded record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A JSON value: a list element, a scalar, or a whole page
    Value(Value),
    /// A `(key, value)` entry of a selected mapping
    Entry(String, Value),
    /// CSV column names
    CsvHeader(Vec<String>),
    /// One CSV data row keyed by column name
    CsvRow(HashMap<String, String>),
}

impl Record {
    /// Whether this record counts toward a paging limit
    pub fn is_countable(&self) -> bool {
        !matches!(self, Record::CsvHeader(_))
    }
}

/// Trait for decoding one response page into records
pub trait RecordDecoder: Send + Sync {
    /// Decode the response into records
    fn decode(&self, response: &QueryResponse) -> Result<Vec<Record>>;
}
