// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Scan and focus view assembly.
//!
//! A scan is the whole workflow at one line per node; a focus view carries full
//! detail for a chosen subset and degrades everything else to dormant one-liners
//! with zone and relationship annotations.

mod ghost;
mod summary;

pub use ghost::{extract_run_hints, input_hint_for, NodeRunHints};
pub use summary::{humanize, node_summary, output_hint};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::codec;
use crate::graph::{self, FlowGraph};
use crate::model::{
    DormantNode, FocusedWorkflow, ScanNode, ScanWorkflow, Workflow, Zone, ZoneCounts,
};

const FOCUS_TOKEN_THRESHOLD: u64 = 8_000;
const FOCUS_NODE_THRESHOLD: usize = 30;
const TOKENS_PER_NODE_BASE: u64 = 20;

/// How the focused set is chosen.
#[derive(Debug, Clone)]
pub enum FocusSelection {
    /// Explicit node names; all must exist.
    Explicit(Vec<String>),
    /// Everything hanging off one router output, plus optional upstream levels.
    Branch {
        router: String,
        output_index: u32,
        max_depth: Option<usize>,
        upstream_levels: Option<usize>,
    },
    /// Every node on a path between two endpoints.
    Range { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusError {
    UnknownNode { name: String },
    EmptyBranch { router: String, output_index: u32 },
    EmptyRange { from: String, to: String },
}

impl fmt::Display for FocusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { name } => write!(f, "no node named '{name}' in this workflow"),
            Self::EmptyBranch { router, output_index } => {
                write!(f, "output {output_index} of '{router}' has no connections")
            }
            Self::EmptyRange { from, to } => {
                write!(f, "no path from '{from}' to '{to}'")
            }
        }
    }
}

impl std::error::Error for FocusError {}

/// Builds the one-line-per-node scan view.
pub fn scan_workflow(raw: &Workflow) -> ScanWorkflow {
    let lite = codec::compress_workflow(raw);

    let mut max_output: BTreeMap<&str, u32> = BTreeMap::new();
    for conn in &lite.connections {
        let entry = max_output.entry(conn.from.as_str()).or_insert(0);
        *entry = (*entry).max(conn.output_index());
    }

    let mut estimated_tokens = 0u64;
    let nodes: Vec<ScanNode> = lite
        .nodes
        .iter()
        .map(|node| {
            let params_len = node
                .parameters
                .as_ref()
                .and_then(|params| serde_json::to_string(params).ok())
                .map(|text| text.len() as u64)
                .unwrap_or(0);
            estimated_tokens += TOKENS_PER_NODE_BASE + params_len / 4;

            let branch_width = max_output
                .get(node.name.as_str())
                .copied()
                .filter(|max| *max >= 1)
                .map(|max| max + 1);

            ScanNode {
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                id: node.id.clone(),
                disabled: node.disabled,
                summary: Some(node_summary(&node.node_type, node.parameters.as_ref())),
                outputs: branch_width,
            }
        })
        .collect();

    let node_types: BTreeMap<String, String> = lite
        .nodes
        .iter()
        .map(|node| (node.name.clone(), node.node_type.clone()))
        .collect();
    let segments = graph::detect_segments(&node_types, &lite.connections);

    let focus_recommended =
        estimated_tokens > FOCUS_TOKEN_THRESHOLD || lite.nodes.len() > FOCUS_NODE_THRESHOLD;

    ScanWorkflow {
        id: lite.id,
        name: lite.name,
        active: lite.active,
        total_nodes: nodes.len() as u32,
        nodes,
        connections: lite.connections,
        segments,
        estimated_tokens,
        focus_recommended,
    }
}

/// Resolves a selection into the focused set of node names.
fn resolve_selection(
    selection: &FocusSelection,
    known: &BTreeSet<String>,
    flow_graph: &FlowGraph,
) -> Result<BTreeSet<String>, FocusError> {
    match selection {
        FocusSelection::Explicit(names) => {
            let mut focused = BTreeSet::new();
            for name in names {
                if !known.contains(name) {
                    return Err(FocusError::UnknownNode { name: name.clone() });
                }
                focused.insert(name.clone());
            }
            Ok(focused)
        }
        FocusSelection::Branch { router, output_index, max_depth, upstream_levels } => {
            if !known.contains(router) {
                return Err(FocusError::UnknownNode { name: router.clone() });
            }
            let targets: Vec<&str> = flow_graph
                .outgoing(router)
                .iter()
                .filter(|edge| edge.output_index == *output_index)
                .map(|edge| edge.node.as_str())
                .collect();
            if targets.is_empty() {
                return Err(FocusError::EmptyBranch {
                    router: router.clone(),
                    output_index: *output_index,
                });
            }

            let mut focused = flow_graph.bfs_forward(targets, *max_depth, &BTreeSet::new());
            focused.insert(router.clone());
            if let Some(levels) = upstream_levels {
                focused.extend(flow_graph.bfs_backward([router.as_str()], Some(*levels), &BTreeSet::new()));
            }
            Ok(focused)
        }
        FocusSelection::Range { from, to } => {
            for name in [from, to] {
                if !known.contains(name) {
                    return Err(FocusError::UnknownNode { name: name.clone() });
                }
            }
            let reachable = flow_graph.bfs_forward([from.as_str()], None, &BTreeSet::new());
            if from != to && !reachable.contains(to) {
                return Err(FocusError::EmptyRange { from: from.clone(), to: to.clone() });
            }
            Ok(flow_graph.nodes_between(from, to))
        }
    }
}

/// Builds the zoned focus view, with ghost-payload hints when run data is given.
pub fn focus_workflow(
    raw: &Workflow,
    selection: &FocusSelection,
    run_data: Option<&Value>,
) -> Result<FocusedWorkflow, FocusError> {
    let lite = codec::compress_workflow(raw);
    let known: BTreeSet<String> = lite.nodes.iter().map(|node| node.name.clone()).collect();
    let flow_graph = FlowGraph::new(&lite.connections);

    let focused_set = resolve_selection(selection, &known, &flow_graph)?;

    let all_names: Vec<String> = lite.nodes.iter().map(|node| node.name.clone()).collect();
    let zones = graph::classify_zones(&all_names, &focused_set, &lite.connections);

    let hints = run_data.map(extract_run_hints).unwrap_or_default();

    let mut counts = ZoneCounts::default();
    let mut focused = Vec::new();
    let mut dormant = Vec::new();

    for node in &lite.nodes {
        let zone = zones.get(&node.name).copied().unwrap_or(Zone::Parallel);
        match zone {
            Zone::Focused => {
                counts.focused += 1;
                let mut detail = node.clone();
                if !hints.is_empty() {
                    detail.input_hint = input_hint_for(&node.name, &flow_graph, &hints);
                }
                focused.push(detail);
            }
            Zone::Upstream | Zone::Downstream | Zone::Parallel => {
                match zone {
                    Zone::Upstream => counts.upstream += 1,
                    Zone::Downstream => counts.downstream += 1,
                    _ => counts.parallel += 1,
                }

                let outputs_to = (zone == Zone::Upstream).then(|| {
                    flow_graph
                        .outgoing(&node.name)
                        .iter()
                        .filter(|edge| focused_set.contains(&edge.node))
                        .map(|edge| edge.node.clone())
                        .collect::<Vec<_>>()
                });
                let inputs_from = (zone == Zone::Downstream).then(|| {
                    flow_graph
                        .incoming(&node.name)
                        .iter()
                        .filter(|edge| focused_set.contains(&edge.node))
                        .map(|edge| edge.node.clone())
                        .collect::<Vec<_>>()
                });

                dormant.push(DormantNode {
                    name: node.name.clone(),
                    node_type: node.node_type.clone(),
                    zone,
                    summary: Some(node_summary(&node.node_type, node.parameters.as_ref())),
                    outputs_to: outputs_to.filter(|targets| !targets.is_empty()),
                    inputs_from: inputs_from.filter(|sources| !sources.is_empty()),
                    output_hint: (zone == Zone::Upstream)
                        .then(|| output_hint(&node.node_type, node.parameters.as_ref()))
                        .flatten(),
                });
            }
        }
    }

    let flow = lite
        .connections
        .iter()
        .filter(|conn| focused_set.contains(&conn.from) && focused_set.contains(&conn.to))
        .cloned()
        .collect();
    let boundaries = graph::boundary_connections(&focused_set, &lite.connections);

    Ok(FocusedWorkflow {
        id: lite.id,
        name: lite.name,
        total_nodes: lite.nodes.len() as u32,
        focused,
        flow,
        dormant,
        boundaries,
        zones: counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundaryDirection;
    use serde_json::json;

    fn chain_workflow(len: usize) -> Workflow {
        let nodes: Vec<Value> = (1..=len)
            .map(|i| {
                json!({
                    "id": format!("id{i}"),
                    "name": format!("N{i}"),
                    "type": "n8n-nodes-base.noOp",
                    "typeVersion": 1,
                    "position": [0.0, 0.0],
                    "parameters": {}
                })
            })
            .collect();
        let mut connections = serde_json::Map::new();
        for i in 1..len {
            connections.insert(
                format!("N{i}"),
                json!({"main": [[{"node": format!("N{}", i + 1), "type": "main", "index": 0}]]}),
            );
        }
        serde_json::from_value(json!({
            "id": "w",
            "name": "chain",
            "nodes": nodes,
            "connections": connections
        }))
        .expect("chain workflow")
    }

    #[test]
    fn focus_mid_chain_partitions_zones() {
        let raw = chain_workflow(10);
        let view = focus_workflow(
            &raw,
            &FocusSelection::Explicit(vec!["N5".to_owned()]),
            None,
        )
        .expect("focus");

        assert_eq!(view.zones.focused, 1);
        assert_eq!(view.zones.upstream, 4);
        assert_eq!(view.zones.downstream, 5);
        assert_eq!(view.zones.parallel, 0);
        assert_eq!(view.focused.len(), 1);
        assert_eq!(view.boundaries.len(), 2);

        let entry = view
            .boundaries
            .iter()
            .find(|b| b.direction == BoundaryDirection::Entry)
            .expect("entry boundary");
        assert_eq!(entry.from, "N4");

        let n4 = view.dormant.iter().find(|d| d.name == "N4").expect("N4");
        assert_eq!(n4.outputs_to.as_deref(), Some(&["N5".to_owned()][..]));
        let n6 = view.dormant.iter().find(|d| d.name == "N6").expect("N6");
        assert_eq!(n6.inputs_from.as_deref(), Some(&["N5".to_owned()][..]));
    }

    #[test]
    fn range_focus_covers_convergence() {
        let raw: Workflow = serde_json::from_value(json!({
            "name": "diamond",
            "nodes": (["A", "B", "C", "D", "E"].iter().map(|n| json!({
                "id": *n, "name": *n, "type": "n8n-nodes-base.noOp",
                "typeVersion": 1, "position": [0.0, 0.0], "parameters": {}
            })).collect::<Vec<_>>()),
            "connections": {
                "A": {"main": [[
                    {"node": "B", "type": "main", "index": 0},
                    {"node": "C", "type": "main", "index": 0}
                ]]},
                "B": {"main": [[{"node": "D", "type": "main", "index": 0}]]},
                "C": {"main": [[{"node": "D", "type": "main", "index": 0}]]},
                "D": {"main": [[{"node": "E", "type": "main", "index": 0}]]}
            }
        }))
        .expect("diamond");

        let view = focus_workflow(
            &raw,
            &FocusSelection::Range { from: "A".to_owned(), to: "D".to_owned() },
            None,
        )
        .expect("focus");

        let focused: BTreeSet<&str> =
            view.focused.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(focused, ["A", "B", "C", "D"].into_iter().collect());
        assert_eq!(view.zones.downstream, 1);
        assert_eq!(view.zones.parallel, 0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let raw = chain_workflow(3);
        let err = focus_workflow(
            &raw,
            &FocusSelection::Explicit(vec!["Ghost".to_owned()]),
            None,
        )
        .expect_err("unknown node");
        assert_eq!(err, FocusError::UnknownNode { name: "Ghost".to_owned() });
    }

    #[test]
    fn empty_branch_is_rejected() {
        let raw = chain_workflow(3);
        let err = focus_workflow(
            &raw,
            &FocusSelection::Branch {
                router: "N1".to_owned(),
                output_index: 4,
                max_depth: None,
                upstream_levels: None,
            },
            None,
        )
        .expect_err("empty branch");
        assert!(matches!(err, FocusError::EmptyBranch { .. }));
    }

    #[test]
    fn unreachable_range_is_rejected() {
        let raw = chain_workflow(3);
        let err = focus_workflow(
            &raw,
            &FocusSelection::Range { from: "N3".to_owned(), to: "N1".to_owned() },
            None,
        )
        .expect_err("no path");
        assert!(matches!(err, FocusError::EmptyRange { .. }));
    }

    #[test]
    fn ghost_hints_attach_to_focused_nodes() {
        let raw = chain_workflow(3);
        let run_data = json!({
            "N1": [{"data": {"main": [[{"json": {"lead_id": 7, "email": "a@b.c"}}]]}}]
        });

        let view = focus_workflow(
            &raw,
            &FocusSelection::Explicit(vec!["N2".to_owned()]),
            Some(&run_data),
        )
        .expect("focus");

        let hint = view.focused[0].input_hint.as_deref().expect("hint");
        assert_eq!(hint, ["email".to_owned(), "lead_id".to_owned()]);
    }

    #[test]
    fn scan_flags_large_workflows() {
        let small = scan_workflow(&chain_workflow(3));
        assert!(!small.focus_recommended);
        assert_eq!(small.total_nodes, 3);
        assert!(small.nodes.iter().all(|node| node
            .summary
            .as_deref()
            .is_some_and(|s| !s.is_empty())));

        let large = scan_workflow(&chain_workflow(31));
        assert!(large.focus_recommended);
    }
}
