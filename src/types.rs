//! Common types used throughout rfapi
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Extra query-string parameters for a request
pub type Params = HashMap<String, String>;

// ============================================================================
// Query Kinds
// ============================================================================

/// The top-level key identifying what a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Instance,
    Reference,
    Source,
    Cluster,
    Entity,
    Status,
    Metadata,
}

impl QueryKind {
    /// Detection order: the first key found in a query decides its kind
    pub const ALL: [QueryKind; 7] = [
        QueryKind::Instance,
        QueryKind::Reference,
        QueryKind::Source,
        QueryKind::Cluster,
        QueryKind::Entity,
        QueryKind::Status,
        QueryKind::Metadata,
    ];

    /// JSON key used on the wire
    pub fn key(self) -> &'static str {
        match self {
            QueryKind::Instance => "instance",
            QueryKind::Reference => "reference",
            QueryKind::Source => "source",
            QueryKind::Cluster => "cluster",
            QueryKind::Entity => "entity",
            QueryKind::Status => "status",
            QueryKind::Metadata => "metadata",
        }
    }

    /// Whether results of this kind can be fetched page by page
    pub fn is_pageable(self) -> bool {
        !matches!(self, QueryKind::Status | QueryKind::Metadata)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// Content Types
// ============================================================================

/// Broad content type of a response body, taken from the `content-type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    /// JSON body
    #[default]
    Json,
    /// CSV body
    Csv,
    /// XML body (STIX and friends)
    Xml,
    /// Anything else
    Other,
}

impl ContentType {
    /// Classify a raw `content-type` header value
    pub fn from_header(value: &str) -> Self {
        let value = value.to_ascii_lowercase();
        if value.contains("json") {
            ContentType::Json
        } else if value.contains("csv") {
            ContentType::Csv
        } else if value.contains("xml") {
            ContentType::Xml
        } else {
            ContentType::Other
        }
    }
}

// ============================================================================
// API Versions
// ============================================================================

/// Which API surface a client talks to; decides the token header layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiVersion {
    /// Raw query API (POST)
    #[default]
    V1,
    /// Connect API (GET)
    V2,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("application/json; charset=utf-8", ContentType::Json)]
    #[test_case("text/csv", ContentType::Csv)]
    #[test_case("application/xml", ContentType::Xml)]
    #[test_case("text/plain", ContentType::Other)]
    fn test_content_type_from_header(header: &str, expected: ContentType) {
        assert_eq!(ContentType::from_header(header), expected);
    }

    #[test]
    fn test_query_kind_keys() {
        assert_eq!(QueryKind::Cluster.key(), "cluster");
        assert_eq!(QueryKind::Entity.to_string(), "entity");
        assert!(QueryKind::Reference.is_pageable());
        assert!(!QueryKind::Status.is_pageable());
        assert!(!QueryKind::Metadata.is_pageable());
    }
}
