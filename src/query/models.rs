//! Typed views over query results

use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entity as found in `entity_details`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity id (filled from the `entity_details` key when absent)
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    /// Remaining attributes
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Entity {
    /// Build from one `entity_details` entry; `None` when it is not an object
    pub fn from_details(id: &str, details: Value) -> Option<Self> {
        if !details.is_object() {
            return None;
        }
        let mut entity: Entity = serde_json::from_value(details).ok()?;
        if entity.id.is_empty() {
            entity.id = id.to_string();
        }
        Some(entity)
    }

    /// Attribute by name, looking in `attributes` when present
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.extra
            .get("attributes")
            .and_then(|attrs| attrs.get(name))
            .or_else(|| self.extra.get(name))
    }
}

/// A reference (document fragment mentioning entities)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub fragment: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub document: Option<Value>,
    #[serde(default)]
    pub attributes: JsonObject,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// An event (cluster of references)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub attributes: JsonObject,
    #[serde(flatten)]
    pub extra: JsonObject,
}
