// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Lite-form types: the compact workflow projection served to agents.
//!
//! Every optional field is skipped when it holds its default, so a lite node
//! serializes to a handful of lines instead of the engine's screenful.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The default connection kind; omitted from lite connections.
pub const MAIN_CONNECTION: &str = "main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiteNode {
    pub name: String,
    /// Short-form type, e.g. `httpRequest` or `langchain:agent`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Engine-side node identity, preserved across round-trips.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_version: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Credential slot → display name. Engine-side ids are restored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<BTreeMap<String, String>>,
    /// Present only when true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Field names observed arriving at this node in a prior execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<Vec<String>>,
}

impl LiteNode {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            id: String::new(),
            type_version: None,
            parameters: None,
            credentials: None,
            disabled: None,
            on_error: None,
            notes: None,
            input_hint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiteConnection {
    pub from: String,
    pub to: String,
    /// Omitted when "main".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Omitted when 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u32>,
    /// Omitted when 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_index: Option<u32>,
}

impl LiteConnection {
    pub fn main(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: None,
            output_index: None,
            input_index: None,
        }
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(MAIN_CONNECTION)
    }

    pub fn output_index(&self) -> u32 {
        self.output_index.unwrap_or(0)
    }

    pub fn input_index(&self) -> u32 {
        self.input_index.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiteWorkflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    /// Topologically sorted when the workflow is acyclic.
    pub nodes: Vec<LiteNode>,
    #[serde(default)]
    pub connections: Vec<LiteConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Present when this node fans out over more than one output index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Focused,
    Upstream,
    Downstream,
    Parallel,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DormantNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub zone: Zone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Focused nodes this upstream node feeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs_to: Option<Vec<String>>,
    /// Focused nodes feeding this downstream node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_from: Option<Vec<String>>,
    /// Human hint describing what data this node emits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryDirection {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryConnection {
    pub from: String,
    pub to: String,
    pub direction: BoundaryDirection,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneCounts {
    pub focused: u32,
    pub upstream: u32,
    pub downstream: u32,
    pub parallel: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FocusedWorkflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub total_nodes: u32,
    /// Full detail, focused members only.
    pub focused: Vec<LiteNode>,
    /// Connections with both endpoints focused.
    pub flow: Vec<LiteConnection>,
    pub dormant: Vec<DormantNode>,
    pub boundaries: Vec<BoundaryConnection>,
    pub zones: ZoneCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub label: String,
    pub router: String,
    pub output_index: u32,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanWorkflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    pub total_nodes: u32,
    pub nodes: Vec<ScanNode>,
    pub connections: Vec<LiteConnection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Segment>,
    /// Rough size of the full lite form, in tokens.
    pub estimated_tokens: u64,
    pub focus_recommended: bool,
}
