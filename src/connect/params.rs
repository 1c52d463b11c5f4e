//! Search and lookup parameters

use crate::error::{Error, Result};
use crate::types::Params;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::LazyLock;

/// Risk score interval such as `[25,50)`, `(,60]` or `[80,)`
static RISK_SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[(](\d+,\d+|,\d+|\d+,)[)\]]$").expect("Invalid regex")
});

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Parameters of a category search.
///
/// Field names follow the wire format once serialized; a few are renamed
/// because the server uses `from`, `list`, `range` and `orderby`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Fields to include in each result
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "comma_joined")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "from", skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Interval, ex `[25,50)` for 25 <= risk score < 50
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(rename = "list", skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_rule: Option<String>,
    #[serde(rename = "orderby", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// IP range as `start-end` or CIDR (ip search)
    #[serde(rename = "range", skip_serializing_if = "Option::is_none")]
    pub ip_range: Option<String>,
    /// Parent domain (domain search)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Hash algorithm (hash search)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freetext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<String>,
    /// Anything else, passed through as-is
    #[serde(flatten)]
    pub extra: Params,
}

impl SearchParams {
    /// Empty search
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned fields
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn risk_score(mut self, interval: impl Into<String>) -> Self {
        self.risk_score = Some(interval.into());
        self
    }

    #[must_use]
    pub fn risk_rule(mut self, rule: impl Into<String>) -> Self {
        self.risk_rule = Some(rule.into());
        self
    }

    #[must_use]
    pub fn list_id(mut self, list: impl Into<String>) -> Self {
        self.list_id = Some(list.into());
        self
    }

    /// Sort by a field
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(field.into());
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: bool) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a parameter not covered by a field
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validate and flatten into query-string parameters
    pub fn to_params(&self) -> Result<Params> {
        if let Some(score) = &self.risk_score {
            if !RISK_SCORE_RE.is_match(score) {
                return Err(Error::config(format!(
                    "Invalid risk score interval {score:?}, expected something like [25,50)"
                )));
            }
        }
        flatten(self)
    }
}

/// Parameters of a single entity lookup
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupParams {
    /// Fields to include in the result
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "comma_joined")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl LookupParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned fields
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: bool) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Flatten into query-string parameters
    pub fn to_params(&self) -> Result<Params> {
        flatten(self)
    }
}

fn comma_joined<S: Serializer>(fields: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&fields.join(","))
}

/// Serialize to a flat string map; strings stay bare, the rest use JSON text
fn flatten<T: Serialize>(params: &T) -> Result<Params> {
    let Value::Object(map) = serde_json::to_value(params)? else {
        return Ok(Params::new());
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
