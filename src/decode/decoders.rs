//! Decoder implementations
//!
//! Each decoder handles a specific response format.

use super::types::{FieldPath, Record, RecordDecoder};
use crate::error::{Error, Result};
use crate::response::QueryResponse;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Dot-path Resolution
// ============================================================================

/// Resolve a dot path against a JSON document.
///
/// Each segment indexes a mapping, or is broadcast over every element when
/// the current value is a list. The final value is flattened: a list yields
/// its elements, a mapping its `(key, value)` entries, a scalar itself.
/// Returns `None` when any segment is missing.
pub fn dot_index(path: &FieldPath, data: &Value) -> Option<Vec<Record>> {
    let mut current = data.clone();

    for key in path.segments() {
        current = match current {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.get(key).cloned())
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(mut map) => map.remove(key)?,
            _ => return None,
        };
    }

    Some(match current {
        Value::Array(items) => items.into_iter().map(Record::Value).collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| Record::Entry(k, v))
            .collect(),
        scalar => vec![Record::Value(scalar)],
    })
}

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional field extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    field: Option<FieldPath>,
}

impl JsonDecoder {
    /// Create a decoder yielding the whole page
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder yielding the items under a dot path
    pub fn with_field(field: FieldPath) -> Self {
        Self { field: Some(field) }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, response: &QueryResponse) -> Result<Vec<Record>> {
        let body = response.json().ok_or_else(|| Error::JsonParse {
            status: response.status(),
            message: "Expected a JSON body".to_string(),
            body: response.text().unwrap_or_default().to_string(),
        })?;

        match &self.field {
            Some(field) => match dot_index(field, body) {
                Some(records) => Ok(records),
                None => {
                    tracing::debug!("Field {field} not present in response page");
                    Ok(Vec::new())
                }
            },
            None => Ok(vec![Record::Value(body.clone())]),
        }
    }
}

// ============================================================================
// CSV Decoder
// ============================================================================

/// CSV decoder: a header record followed by one record per data row
#[derive(Debug, Clone, Default)]
pub struct CsvDecoder;

impl CsvDecoder {
    /// Create a new CSV decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for CsvDecoder {
    fn decode(&self, response: &QueryResponse) -> Result<Vec<Record>> {
        let mut reader = response
            .csv_reader()
            .ok_or_else(|| Error::Other("Expected a CSV body".to_string()))?;

        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut records = vec![Record::CsvHeader(header.clone())];

        for row in reader.records() {
            let row = row?;
            let mapped: HashMap<String, String> = header
                .iter()
                .cloned()
                .zip(row.iter().map(String::from))
                .collect();
            records.push(Record::CsvRow(mapped));
        }

        Ok(records)
    }
}
