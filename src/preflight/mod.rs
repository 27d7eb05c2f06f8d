// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Preflight validation pipeline.
//!
//! Runs on the virtual post-mutation state before any remote write. Errors
//! block the mutation; warnings ride along as advice. The pipeline is pure over
//! its input, so running it twice on the same state yields the same verdict.

mod config_check;
mod expressions;
mod secrets;

pub use config_check::validate_node_config;
pub use expressions::validate_expressions;
pub use secrets::scan_secrets;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::model::{LiteConnection, LiteNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ValidationIssue {
    /// Machine-readable kind, e.g. `invalid_expression` or `credential_exposure`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip)]
    pub blocking: bool,
}

impl ValidationIssue {
    pub fn error(
        kind: &str,
        node: &str,
        field: Option<&str>,
        message: &str,
        suggestion: Option<&str>,
    ) -> Self {
        Self::new(kind, Some(node), field, message, suggestion, true)
    }

    pub fn warning(
        kind: &str,
        node: &str,
        field: Option<&str>,
        message: &str,
        suggestion: Option<&str>,
    ) -> Self {
        Self::new(kind, Some(node), field, message, suggestion, false)
    }

    pub fn workflow_error(kind: &str, message: &str, suggestion: Option<&str>) -> Self {
        Self::new(kind, None, None, message, suggestion, true)
    }

    pub fn workflow_warning(kind: &str, message: &str, suggestion: Option<&str>) -> Self {
        Self::new(kind, None, None, message, suggestion, false)
    }

    fn new(
        kind: &str,
        node: Option<&str>,
        field: Option<&str>,
        message: &str,
        suggestion: Option<&str>,
        blocking: bool,
    ) -> Self {
        Self {
            kind: kind.to_owned(),
            node: node.map(ToOwned::to_owned),
            field: field.map(ToOwned::to_owned),
            message: message.to_owned(),
            suggestion: suggestion.map(ToOwned::to_owned),
            blocking,
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub passed: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub summary: String,
    pub duration_ms: u64,
}

impl PreflightReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// True for node types that legally dangle as workflow roots.
fn is_trigger_type(short_type: &str) -> bool {
    short_type.to_lowercase().contains("trigger") || short_type == "webhook"
}

/// Runs every validation phase over the virtual workflow state.
pub fn run_preflight(
    nodes: &[LiteNode],
    connections: &[LiteConnection],
    catalog: &Catalog,
) -> PreflightReport {
    let started = Instant::now();
    let mut issues: Vec<ValidationIssue> = Vec::new();

    for node in nodes {
        validate_node_config(node, catalog, &mut issues);

        let params = node.parameters.as_ref().unwrap_or(&Value::Null);
        validate_expressions(&node.name, params, &mut issues);
        scan_secrets(&node.name, params, &mut issues);
    }

    check_structure(nodes, connections, &mut issues);
    check_duplicate_names(nodes, &mut issues);

    let (errors, warnings): (Vec<_>, Vec<_>) =
        issues.into_iter().partition(|issue| issue.blocking);

    let passed = errors.is_empty();
    let summary = if passed && warnings.is_empty() {
        format!("preflight passed for {} node(s)", nodes.len())
    } else if passed {
        format!("preflight passed with {} warning(s)", warnings.len())
    } else {
        format!(
            "preflight blocked: {} error(s), {} warning(s)",
            errors.len(),
            warnings.len()
        )
    };

    PreflightReport {
        passed,
        errors,
        warnings,
        summary,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

/// Connection endpoints must name known nodes; nodes with no connections at all
/// are suspicious in a multi-node workflow unless they are triggers.
fn check_structure(
    nodes: &[LiteNode],
    connections: &[LiteConnection],
    issues: &mut Vec<ValidationIssue>,
) {
    let known: BTreeSet<&str> = nodes.iter().map(|node| node.name.as_str()).collect();
    let mut connected: BTreeSet<&str> = BTreeSet::new();

    for conn in connections {
        if !known.contains(conn.from.as_str()) {
            issues.push(ValidationIssue::workflow_error(
                "unknown_connection_source",
                &format!("connection source '{}' is not a node in this workflow", conn.from),
                Some("remove the connection or add the node"),
            ));
        } else {
            connected.insert(conn.from.as_str());
        }
        if !known.contains(conn.to.as_str()) {
            issues.push(ValidationIssue::workflow_error(
                "unknown_connection_target",
                &format!("connection target '{}' is not a node in this workflow", conn.to),
                Some("remove the connection or add the node"),
            ));
        } else {
            connected.insert(conn.to.as_str());
        }
    }

    if nodes.len() > 1 {
        for node in nodes {
            if !connected.contains(node.name.as_str()) && !is_trigger_type(&node.node_type) {
                issues.push(ValidationIssue::warning(
                    "orphan_node",
                    &node.name,
                    None,
                    "node has no incoming or outgoing connections",
                    Some("connect it or remove it"),
                ));
            }
        }
    }
}

fn check_duplicate_names(nodes: &[LiteNode], issues: &mut Vec<ValidationIssue>) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in nodes {
        *counts.entry(node.name.as_str()).or_insert(0) += 1;
    }
    for (name, count) in counts {
        if count > 1 {
            issues.push(ValidationIssue::workflow_error(
                "duplicate_node_name",
                &format!("node name '{name}' is used {count} times; names must be unique"),
                Some("rename the duplicates"),
            ));
        }
    }
}
