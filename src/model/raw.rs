// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Raw engine wire types.
//!
//! These mirror the engine's own JSON. Bloat fields the engine attaches on read
//! (version shadows, share records, pin data) are captured in `extra` so a raw
//! passthrough is faithful, and deliberately not re-emitted by the codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source node name → output kind → per-output-index target lists.
///
/// Output-index gaps (empty lists at lower indices) are legal and preserved.
pub type ConnectionMap = BTreeMap<String, BTreeMap<String, Vec<Vec<ConnectionTarget>>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Target node name.
    pub node: String,
    /// Output kind, mirrored from the source side ("main" or a typed stream).
    #[serde(rename = "type")]
    pub kind: String,
    /// Target input index.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRef {
    /// Engine-side credential identifier. The empty string means "resolve by name".
    #[serde(default)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique within the workflow; connection endpoints reference nodes by name.
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Kept as a raw JSON number so integer and fractional versions round-trip
    /// byte-identically (the engine uses both, e.g. `1` and `2.2`).
    #[serde(rename = "typeVersion", default = "default_type_version")]
    pub type_version: serde_json::Number,
    #[serde(default)]
    pub position: [f64; 2],
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub credentials: BTreeMap<String, CredentialRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(rename = "onError", default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

pub(crate) fn default_type_version() -> serde_json::Number {
    serde_json::Number::from(1u32)
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            node_type: node_type.into(),
            type_version: default_type_version(),
            position: [0.0, 0.0],
            parameters: Value::Object(serde_json::Map::new()),
            credentials: BTreeMap::new(),
            disabled: false,
            on_error: None,
            notes: None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: ConnectionMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    /// Tags arrive either as plain strings or `{id, name}` records; both are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Workflow {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    /// Tag display names, regardless of whether tags arrived as strings or records.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .iter()
            .flatten()
            .filter_map(|tag| match tag {
                Value::String(name) => Some(name.clone()),
                Value::Object(fields) => fields
                    .get("name")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowList {
    pub data: Vec<Workflow>,
    #[serde(rename = "nextCursor", default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_round_trips_fractional_type_version() {
        let json = serde_json::json!({
            "name": "Edit Fields",
            "type": "n8n-nodes-base.set",
            "typeVersion": 3.4,
            "position": [250.0, 300.0],
            "parameters": {}
        });
        let node: Node = serde_json::from_value(json).expect("node");
        assert_eq!(node.type_version.to_string(), "3.4");

        let back = serde_json::to_value(&node).expect("value");
        assert_eq!(back["typeVersion"], serde_json::json!(3.4));
    }

    #[test]
    fn node_defaults_omitted_fields() {
        let json = serde_json::json!({
            "name": "Webhook",
            "type": "n8n-nodes-base.webhook"
        });
        let node: Node = serde_json::from_value(json).expect("node");
        assert_eq!(node.type_version.as_u64(), Some(1));
        assert!(!node.disabled);
        assert!(node.credentials.is_empty());

        let back = serde_json::to_value(&node).expect("value");
        assert!(back.get("disabled").is_none());
        assert!(back.get("credentials").is_none());
        assert!(back.get("onError").is_none());
    }

    #[test]
    fn workflow_tolerates_bloat_fields() {
        let json = serde_json::json!({
            "id": "w1",
            "name": "Demo",
            "active": false,
            "nodes": [],
            "connections": {},
            "versionId": "abc",
            "shared": [{"role": "workflow:owner"}],
            "pinData": {}
        });
        let workflow: Workflow = serde_json::from_value(json).expect("workflow");
        assert_eq!(workflow.extra.len(), 3);
        assert!(workflow.extra.contains_key("versionId"));
    }

    #[test]
    fn tag_names_accept_strings_and_records() {
        let json = serde_json::json!({
            "name": "Demo",
            "nodes": [],
            "connections": {},
            "tags": ["ops", {"id": "t2", "name": "billing"}]
        });
        let workflow: Workflow = serde_json::from_value(json).expect("workflow");
        assert_eq!(workflow.tag_names(), vec!["ops", "billing"]);
    }
}
