//! Pagination types
//!
//! Defines the options, yielded items and running state of a paged query.

use crate::decode::{FieldPath, Record};
use crate::response::QueryResponse;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Page size requested per call unless told otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options for a paged query
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Maximum number of items to yield
    pub limit: Option<usize>,
    /// Page size requested per call
    pub batch_size: usize,
    /// Dot path selecting items inside each JSON page
    pub field: Option<FieldPath>,
    /// Skip items already yielded
    pub unique: bool,
    /// Yield whole responses instead of items
    pub raw: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            limit: None,
            batch_size: DEFAULT_BATCH_SIZE,
            field: None,
            unique: false,
            raw: false,
        }
    }
}

impl PageOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after this many items
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page size
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Select items with a dot path
    #[must_use]
    pub fn field(mut self, path: &str) -> Self {
        self.field = Some(FieldPath::parse(path));
        self
    }

    /// Deduplicate items
    #[must_use]
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Yield whole responses
    #[must_use]
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Limit sent to the server on every page.
    ///
    /// Fixed for the whole run so only `page_start` changes between pages;
    /// items past `limit` are dropped on the client.
    pub fn page_limit(&self) -> usize {
        match self.limit {
            Some(limit) => self.batch_size.min(limit),
            None => self.batch_size,
        }
    }
}

/// One item of a paged query
#[derive(Debug, Clone)]
pub enum PagedItem {
    /// A JSON item or a whole JSON page
    Value(Value),
    /// A `(key, value)` entry of a selected mapping
    Entry(String, Value),
    /// CSV column names, yielded once before the first row
    CsvHeader(Vec<String>),
    /// One CSV row keyed by column name
    CsvRow(HashMap<String, String>),
    /// A whole response (raw mode, or a body that cannot be itemized)
    Response(QueryResponse),
}

impl PagedItem {
    /// JSON value, for `Value` items
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PagedItem::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Take the JSON value, for `Value` items
    pub fn into_value(self) -> Option<Value> {
        match self {
            PagedItem::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Key used for deduplication
    pub(crate) fn dedup_key(&self) -> Option<String> {
        match self {
            PagedItem::Value(v) => Some(v.to_string()),
            PagedItem::Entry(k, v) => Some(format!("{}:{v}", Value::String(k.clone()))),
            PagedItem::CsvRow(row) => {
                let mut pairs: Vec<_> = row.iter().collect();
                pairs.sort();
                Some(format!("{pairs:?}"))
            }
            PagedItem::CsvHeader(_) | PagedItem::Response(_) => None,
        }
    }
}

impl From<Record> for PagedItem {
    fn from(record: Record) -> Self {
        match record {
            Record::Value(v) => PagedItem::Value(v),
            Record::Entry(k, v) => PagedItem::Entry(k, v),
            Record::CsvHeader(h) => PagedItem::CsvHeader(h),
            Record::CsvRow(r) => PagedItem::CsvRow(r),
        }
    }
}

/// Running state of a paged query
#[derive(Debug, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: u32,
    /// Items counted toward the limit
    pub yielded: usize,
    /// Whether the CSV header has been emitted
    pub header_sent: bool,
    /// Dedup keys of items already yielded
    pub seen: HashSet<String>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Whether a limit has been reached
    pub fn limit_reached(&self, limit: Option<usize>) -> bool {
        limit.is_some_and(|limit| self.yielded >= limit)
    }

    /// Record a key; false if it was seen before
    pub fn first_sighting(&mut self, key: String) -> bool {
        self.seen.insert(key)
    }
}
