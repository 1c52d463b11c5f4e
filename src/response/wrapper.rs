//! Query response wrapper

use crate::query::Entity;
use crate::types::ContentType;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::Value;

/// Number of items in this response
pub const RETURNED_COUNT_HEADER: &str = "X-RF-RETURNED-COUNT";

/// Number of items matching the query
pub const TOTAL_COUNT_HEADER: &str = "X-RF-TOTAL-COUNT";

/// Cursor for the next page
pub const NEXT_PAGE_START_HEADER: &str = "X-RF-NEXT-PAGE-START";

/// SHA-256 of a fusion file, sent on HEAD requests
pub const CONTENT_SHA256_HEADER: &str = "X-RF-Content-SHA256";

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON
    Json(Value),
    /// CSV, XML or other text, kept as-is
    Text(String),
}

/// One API response. Immutable once built.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    status: u16,
    headers: HeaderMap,
    body: ResponseBody,
}

impl QueryResponse {
    /// Wrap a status, headers and a decoded body
    pub fn new(status: u16, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decoded body
    pub fn result(&self) -> &ResponseBody {
        &self.body
    }

    /// Take the decoded body
    pub fn into_result(self) -> ResponseBody {
        self.body
    }

    /// JSON body, if the response was decoded as JSON
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Text body, if the response was kept as text
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            ResponseBody::Json(_) => None,
        }
    }

    /// Whether the body was decoded as JSON
    pub fn is_json(&self) -> bool {
        matches!(self.body, ResponseBody::Json(_))
    }

    /// Content type from the `content-type` header.
    ///
    /// Without the header, a JSON body counts as JSON and anything else as `Other`.
    pub fn content_type(&self) -> ContentType {
        match self.header_str(CONTENT_TYPE.as_str()) {
            Some(value) => ContentType::from_header(value),
            None if self.is_json() => ContentType::Json,
            None => ContentType::Other,
        }
    }

    /// Number of items returned in this response
    pub fn returned_count(&self) -> Option<u64> {
        self.header_u64(RETURNED_COUNT_HEADER)
            .or_else(|| self.embedded_count("returned"))
            .or_else(|| self.json().and_then(|v| v.get("count")).and_then(as_u64))
    }

    /// Total number of items matching the query
    pub fn total_count(&self) -> Option<u64> {
        self.header_u64(TOTAL_COUNT_HEADER)
            .or_else(|| self.embedded_count("total"))
            .or_else(|| {
                self.json()
                    .and_then(|v| v.get("total_count"))
                    .and_then(as_u64)
            })
    }

    /// Cursor to pass as `page_start` for the next page
    pub fn next_page_start(&self) -> Option<String> {
        let from_body = self
            .json()
            .and_then(|v| v.get("next_page_start"))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        from_body.or_else(|| self.header_str(NEXT_PAGE_START_HEADER).map(String::from))
    }

    /// Whether the server has more results after this page
    pub fn has_more_results(&self) -> bool {
        if self.next_page_start().is_none() {
            return false;
        }
        match (self.returned_count(), self.total_count()) {
            (Some(returned), Some(total)) => returned != total,
            _ => true,
        }
    }

    /// CSV reader over a text body; `None` for JSON bodies.
    ///
    /// Rows must all have the header's width.
    pub fn csv_reader(&self) -> Option<csv::Reader<&[u8]>> {
        self.text().map(|text| {
            csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(text.as_bytes())
        })
    }

    /// Entity details for one id from an entity query result.
    ///
    /// A missing id yields `None`, not an error.
    pub fn get_entity(&self, entity_id: &str) -> Option<Entity> {
        let details = self.json()?.get("entity_details")?.get(entity_id)?;
        Entity::from_details(entity_id, details.clone())
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn header_u64(&self, name: &str) -> Option<u64> {
        self.header_str(name).and_then(|s| s.trim().parse().ok())
    }

    /// `counts.<field>`, then `count.<field>`, then the first `count.<kind>.<field>`
    fn embedded_count(&self, field: &str) -> Option<u64> {
        let body = self.json()?;

        if let Some(n) = body
            .get("counts")
            .and_then(|c| c.get(field))
            .and_then(as_u64)
        {
            return Some(n);
        }

        match body.get("count") {
            Some(Value::Object(count)) => count
                .get(field)
                .and_then(as_u64)
                .or_else(|| count.values().find_map(|v| v.get(field).and_then(as_u64))),
            _ => None,
        }
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
