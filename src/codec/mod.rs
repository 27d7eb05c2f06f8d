// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Compact representation codec.
//!
//! Compresses the engine's verbose workflow JSON into the lite form and
//! reconstructs engine JSON from it. Compression is lossy only in ways the
//! reconstruction can undo from context (type prefixes, default indices,
//! credential ids looked up on the original raw node).

mod connections;
mod params;

pub use connections::{compress_connections, reconstruct_connections, topo_sort};
pub use params::clean_parameters;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::model::{CredentialRef, LiteNode, LiteWorkflow, Node, Workflow};

const BASE_PREFIX: &str = "n8n-nodes-base.";
const LANGCHAIN_PREFIX: &str = "@n8n/n8n-nodes-langchain.";
const LANGCHAIN_SHORT: &str = "langchain:";

#[derive(Debug)]
pub enum CodecError {
    /// Raw input lacked a field the codec cannot synthesize.
    MissingField { field: &'static str },
    Decode { source: serde_json::Error },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "workflow JSON is missing required field '{field}'")
            }
            Self::Decode { source } => write!(f, "cannot decode workflow JSON: {source}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingField { .. } => None,
            Self::Decode { source } => Some(source),
        }
    }
}

/// Strips the recognized engine prefixes from a full node type.
///
/// Types under other packages (anything else containing a dot) pass through
/// unchanged so they survive a round-trip.
pub fn simplify_node_type(full: &str) -> String {
    if let Some(short) = full.strip_prefix(BASE_PREFIX) {
        return short.to_owned();
    }
    if let Some(short) = full.strip_prefix(LANGCHAIN_PREFIX) {
        return format!("{LANGCHAIN_SHORT}{short}");
    }
    full.to_owned()
}

/// Restores the full node type from its short form.
pub fn expand_node_type(short: &str) -> String {
    if let Some(name) = short.strip_prefix(LANGCHAIN_SHORT) {
        return format!("{LANGCHAIN_PREFIX}{name}");
    }
    if short.contains('.') || short.starts_with('@') {
        return short.to_owned();
    }
    format!("{BASE_PREFIX}{short}")
}

/// Minimum stable type-version per short type.
///
/// Reconstructing a node below these versions makes the editor reinterpret its
/// parameter format and corrupt the configuration, so new nodes of known types
/// never default below them.
fn minimum_stable_version(short_type: &str) -> Option<serde_json::Number> {
    let version: f64 = match short_type {
        "set" => 3.4,
        "if" => 2.2,
        "switch" => 3.2,
        "filter" => 2.2,
        "merge" => 3.1,
        "code" => 2.0,
        "httpRequest" => 4.2,
        "webhook" => 2.0,
        "respondToWebhook" => 1.1,
        _ => return None,
    };
    if version.fract() == 0.0 {
        return Some(serde_json::Number::from(version as u64));
    }
    serde_json::Number::from_f64(version)
}

/// Validates and decodes raw engine JSON into the typed raw model.
pub fn parse_workflow(value: Value) -> Result<Workflow, CodecError> {
    match value.get("nodes") {
        Some(Value::Array(_)) => {}
        _ => return Err(CodecError::MissingField { field: "nodes" }),
    }
    if value.get("name").and_then(Value::as_str).is_none() {
        return Err(CodecError::MissingField { field: "name" });
    }
    serde_json::from_value(value).map_err(|source| CodecError::Decode { source })
}

fn compress_node(node: &Node) -> LiteNode {
    let parameters = clean_parameters(&node.parameters);

    let credentials = if node.credentials.is_empty() {
        None
    } else {
        Some(
            node.credentials
                .iter()
                .map(|(slot, cred)| (slot.clone(), cred.name.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    };

    LiteNode {
        name: node.name.clone(),
        node_type: simplify_node_type(&node.node_type),
        id: node.id.clone().unwrap_or_default(),
        type_version: (node.type_version.as_u64() != Some(1)).then(|| node.type_version.clone()),
        parameters,
        credentials,
        disabled: node.disabled.then_some(true),
        on_error: node.on_error.clone(),
        notes: node.notes.clone(),
        input_hint: None,
    }
}

fn non_default_settings(settings: Option<&Value>) -> Option<Value> {
    let Value::Object(fields) = settings? else {
        return settings.cloned();
    };
    let trimmed: serde_json::Map<String, Value> = fields
        .iter()
        .filter(|(key, value)| {
            !(key.as_str() == "executionOrder" && value.as_str() == Some("v1"))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if trimmed.is_empty() {
        return None;
    }
    Some(Value::Object(trimmed))
}

/// Compresses a raw workflow into the lite form.
///
/// Nodes come out topologically sorted when the graph is acyclic; a cyclic
/// remainder is appended in its input order.
pub fn compress_workflow(raw: &Workflow) -> LiteWorkflow {
    let connections = compress_connections(&raw.connections);

    let names: Vec<String> = raw.nodes.iter().map(|node| node.name.clone()).collect();
    let order = topo_sort(&names, &connections);

    let by_name: BTreeMap<&str, &Node> = raw
        .nodes
        .iter()
        .map(|node| (node.name.as_str(), node))
        .collect();
    let nodes = order
        .iter()
        .filter_map(|name| by_name.get(name.as_str()))
        .map(|node| compress_node(node))
        .collect();

    let tag_names = raw.tag_names();

    LiteWorkflow {
        id: raw.id.clone(),
        name: raw.name.clone(),
        active: raw.active,
        nodes,
        connections,
        tags: (!tag_names.is_empty()).then_some(tag_names),
        settings: non_default_settings(raw.settings.as_ref()),
    }
}

fn resolve_type_version(
    lite: &LiteNode,
    short_type: &str,
    original: Option<&Node>,
) -> serde_json::Number {
    if let Some(version) = &lite.type_version {
        return version.clone();
    }
    if let Some(original) = original {
        return original.type_version.clone();
    }
    minimum_stable_version(short_type).unwrap_or_else(|| serde_json::Number::from(1u32))
}

fn reconstruct_node(lite: &LiteNode, original: Option<&Node>) -> Node {
    let node_type = expand_node_type(&lite.node_type);

    let id = if !lite.id.is_empty() {
        Some(lite.id.clone())
    } else if let Some(original) = original {
        original.id.clone()
    } else {
        Some(uuid::Uuid::new_v4().to_string())
    };

    let parameters = lite
        .parameters
        .clone()
        .or_else(|| original.map(|node| node.parameters.clone()))
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let credentials = lite
        .credentials
        .as_ref()
        .map(|slots| {
            slots
                .iter()
                .map(|(slot, display_name)| {
                    // Unknown ids fall back to the empty string, which the engine
                    // resolves by credential name.
                    let id = original
                        .and_then(|node| node.credentials.get(slot))
                        .filter(|cred| cred.name == *display_name)
                        .map(|cred| cred.id.clone())
                        .unwrap_or_default();
                    (
                        slot.clone(),
                        CredentialRef { id, name: display_name.clone() },
                    )
                })
                .collect::<BTreeMap<_, _>>()
        })
        .or_else(|| original.map(|node| node.credentials.clone()))
        .unwrap_or_default();

    Node {
        id,
        name: lite.name.clone(),
        node_type,
        type_version: resolve_type_version(lite, &lite.node_type, original),
        position: original.map(|node| node.position).unwrap_or([0.0, 0.0]),
        parameters,
        credentials,
        disabled: lite.disabled.unwrap_or(false),
        on_error: lite.on_error.clone(),
        notes: lite.notes.clone(),
        extra: BTreeMap::new(),
    }
}

/// Reconstructs engine JSON from the lite form.
///
/// `original` is the just-fetched raw workflow during an update; it supplies
/// positions, credential ids, and type versions the lite form dropped.
pub fn reconstruct_workflow(lite: &LiteWorkflow, original: Option<&Workflow>) -> Workflow {
    let original_nodes: BTreeMap<&str, &Node> = original
        .map(|workflow| {
            workflow
                .nodes
                .iter()
                .map(|node| (node.name.as_str(), node))
                .collect()
        })
        .unwrap_or_default();

    let nodes = lite
        .nodes
        .iter()
        .map(|node| reconstruct_node(node, original_nodes.get(node.name.as_str()).copied()))
        .collect();

    Workflow {
        id: lite
            .id
            .clone()
            .or_else(|| original.and_then(|workflow| workflow.id.clone())),
        name: lite.name.clone(),
        active: lite.active,
        nodes,
        connections: reconstruct_connections(&lite.connections),
        settings: lite
            .settings
            .clone()
            .or_else(|| original.and_then(|workflow| workflow.settings.clone())),
        tags: original.and_then(|workflow| workflow.tags.clone()),
        extra: BTreeMap::new(),
    }
}
