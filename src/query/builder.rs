//! Query value object

use crate::error::{Error, Result};
use crate::types::{JsonObject, QueryKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `output` section of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Response format: `json`, `csv`, `csv/splunk`, `xml/stix`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Aggregation spec; its presence makes the query an aggregate query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    /// Ask for usage statistics (status queries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<bool>,
    /// Inline entity details in the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_entities: Option<bool>,
    /// Anything else the server understands
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Output {
    /// Output with the given format
    pub fn format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            ..Default::default()
        }
    }

    /// Requested format, `json` when unset
    pub fn format_name(&self) -> &str {
        self.format.as_deref().unwrap_or("json")
    }

    /// Whether the response body will be JSON
    pub fn expects_json(&self) -> bool {
        self.format_name() == "json"
    }
}

/// A raw API query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(JsonObject);

impl Query {
    /// Query of a given kind with the given body
    pub fn new(kind: QueryKind, body: Value) -> Self {
        let mut map = JsonObject::new();
        map.insert(kind.key().to_string(), body);
        Self(map)
    }

    /// Entity query
    pub fn entity(body: Value) -> Self {
        Self::new(QueryKind::Entity, body)
    }

    /// Reference query
    pub fn reference(body: Value) -> Self {
        Self::new(QueryKind::Reference, body)
    }

    /// Instance query (older name for references)
    pub fn instance(body: Value) -> Self {
        Self::new(QueryKind::Instance, body)
    }

    /// Event query; events live under the `cluster` key
    pub fn cluster(body: Value) -> Self {
        Self::new(QueryKind::Cluster, body)
    }

    /// Source query
    pub fn source(body: Value) -> Self {
        Self::new(QueryKind::Source, body)
    }

    /// Token usage query
    pub fn status() -> Self {
        Self::new(QueryKind::Status, Value::Object(JsonObject::new()))
    }

    /// Type and event metadata query
    pub fn metadata() -> Self {
        Self::new(QueryKind::Metadata, Value::Object(JsonObject::new()))
    }

    /// Wrap any JSON object; the kind is not checked here
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::invalid_query("Query must be a JSON object", other)),
        }
    }

    /// Set the output section
    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        match serde_json::to_value(output) {
            Ok(value) => {
                self.0.insert("output".to_string(), value);
            }
            Err(e) => tracing::warn!("Dropping unserializable output section: {e}"),
        }
        self
    }

    /// Kind of this query, by detection order
    pub fn kind(&self) -> Option<QueryKind> {
        QueryKind::ALL
            .into_iter()
            .find(|kind| self.0.contains_key(kind.key()))
    }

    /// Output section; defaults when absent or malformed
    pub fn output(&self) -> Output {
        self.0
            .get("output")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Whether the query asks for server-side aggregation
    pub fn is_aggregate(&self) -> bool {
        matches!(self.0.get("output"), Some(Value::Object(out)) if out.contains_key("count"))
    }

    /// Body under the kind key
    pub fn kind_body(&self) -> Option<&JsonObject> {
        let kind = self.kind()?;
        self.0.get(kind.key()).and_then(Value::as_object)
    }

    /// Mutable body under the kind key; a non-object body is replaced by `{}`
    fn kind_body_mut(&mut self) -> Option<&mut JsonObject> {
        let kind = self.kind()?;
        let slot = self.0.get_mut(kind.key())?;
        if !slot.is_object() {
            *slot = Value::Object(JsonObject::new());
        }
        slot.as_object_mut()
    }

    /// Set a field in the kind body
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let snapshot = self.to_value();
        let body = self
            .kind_body_mut()
            .ok_or_else(|| Error::invalid_query("Query has no recognized kind", snapshot))?;
        body.insert(key.into(), value.into());
        Ok(())
    }

    /// Remove a field from the kind body
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.kind_body_mut()?.remove(key)
    }

    /// A scan search, which must never replay a cursor
    pub fn is_scan(&self) -> bool {
        self.kind_body()
            .and_then(|b| b.get("searchtype"))
            .and_then(Value::as_str)
            == Some("scan")
    }

    /// Current cursor
    pub fn page_start(&self) -> Option<&str> {
        self.kind_body()?.get("page_start")?.as_str()
    }

    /// `limit` set directly in the kind body
    pub fn embedded_limit(&self) -> Option<&Value> {
        self.kind_body()?.get("limit")
    }

    /// Top-level mapping
    pub fn as_map(&self) -> &JsonObject {
        &self.0
    }

    /// JSON value sent on the wire
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<JsonObject> for Query {
    fn from(map: JsonObject) -> Self {
        Self(map)
    }
}
