// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Ghost payload: field names inferred from a prior execution trace.
//!
//! Hints, not contracts: they reflect only the most recent recorded run and
//! may be stale. Each output is capped at twenty keys with an explicit
//! truncation marker so consumers know there may be more.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::graph::FlowGraph;
use crate::model::MAIN_CONNECTION;

const KEY_CAP: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRunHints {
    /// Error message when the recorded run failed; such runs carry no keys.
    pub error: Option<String>,
    /// Keys per output index. Routers keep every branch separately so a
    /// downstream consumer wired to output `i` sees exactly branch `i`.
    pub outputs: Vec<Vec<String>>,
}

/// Walks `resultData.runData`, taking the last run per node.
pub fn extract_run_hints(run_data: &Value) -> BTreeMap<String, NodeRunHints> {
    let mut hints = BTreeMap::new();
    let Value::Object(nodes) = run_data else {
        return hints;
    };

    for (node_name, runs) in nodes {
        let Some(last_run) = runs.as_array().and_then(|runs| runs.last()) else {
            continue;
        };

        if let Some(error) = last_run.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("error")
                .to_owned();
            hints.insert(
                node_name.clone(),
                NodeRunHints { error: Some(message), outputs: Vec::new() },
            );
            continue;
        }

        let branches = last_run
            .get("data")
            .and_then(|data| data.get(MAIN_CONNECTION))
            .and_then(Value::as_array);
        let Some(branches) = branches else {
            continue;
        };

        let outputs = branches.iter().map(branch_keys).collect();
        hints.insert(node_name.clone(), NodeRunHints { error: None, outputs });
    }

    hints
}

/// Union of JSON keys across all items of one output branch, capped.
fn branch_keys(items: &Value) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    for item in items.as_array().into_iter().flatten() {
        if let Some(Value::Object(fields)) = item.get("json") {
            for key in fields.keys() {
                seen.insert(key.clone());
            }
        }
    }

    let total = seen.len();
    let mut keys: Vec<String> = seen.into_iter().take(KEY_CAP).collect();
    if total > KEY_CAP {
        keys.push(format!("...+{} more", total - KEY_CAP));
    }
    keys
}

/// The hint for a focused node: the union of its upstream nodes' output keys at
/// the relevant output index. Trigger nodes (no incoming edges) get none.
pub fn input_hint_for(
    node: &str,
    graph: &FlowGraph,
    hints: &BTreeMap<String, NodeRunHints>,
) -> Option<Vec<String>> {
    let incoming = graph.incoming(node);
    if incoming.is_empty() {
        return None;
    }

    let mut seen = std::collections::BTreeSet::new();
    let mut merged = Vec::new();
    for edge in incoming {
        if edge.kind != MAIN_CONNECTION {
            continue;
        }
        let Some(source_hints) = hints.get(&edge.node) else {
            continue;
        };
        let Some(keys) = source_hints.outputs.get(edge.output_index as usize) else {
            continue;
        };
        for key in keys {
            if seen.insert(key.clone()) {
                merged.push(key.clone());
            }
        }
    }

    (!merged.is_empty()).then_some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LiteConnection;
    use serde_json::json;

    fn item(fields: Value) -> Value {
        json!({"json": fields})
    }

    #[test]
    fn takes_last_run_and_unions_item_keys() {
        let run_data = json!({
            "Fetch": [
                {"data": {"main": [[item(json!({"old": 1}))]]}},
                {"data": {"main": [[item(json!({"id": 1})), item(json!({"id": 2, "name": "x"}))]]}}
            ]
        });

        let hints = extract_run_hints(&run_data);
        assert_eq!(hints["Fetch"].outputs, vec![vec!["id".to_owned(), "name".to_owned()]]);
    }

    #[test]
    fn failed_runs_carry_error_and_no_keys() {
        let run_data = json!({
            "Fetch": [{"error": {"message": "connection refused"}}]
        });
        let hints = extract_run_hints(&run_data);
        assert_eq!(hints["Fetch"].error.as_deref(), Some("connection refused"));
        assert!(hints["Fetch"].outputs.is_empty());
    }

    #[test]
    fn truncation_exposes_twenty_one_entries() {
        let fields: serde_json::Map<String, Value> =
            (0..25).map(|i| (format!("k{i:02}"), json!(i))).collect();
        let run_data = json!({"Wide": [{"data": {"main": [[item(Value::Object(fields))]]}}]});

        let hints = extract_run_hints(&run_data);
        let keys = &hints["Wide"].outputs[0];
        assert_eq!(keys.len(), 21);
        assert_eq!(keys.last().map(String::as_str), Some("...+5 more"));
    }

    #[test]
    fn router_branches_stay_separate() {
        let run_data = json!({
            "IF": [{"data": {"main": [
                [item(json!({"valid": true}))],
                [item(json!({"reason": "missing email"}))]
            ]}}]
        });
        let hints = extract_run_hints(&run_data);
        assert_eq!(hints["IF"].outputs[0], vec!["valid"]);
        assert_eq!(hints["IF"].outputs[1], vec!["reason"]);

        // A consumer on output 1 sees only the false branch.
        let mut false_edge = LiteConnection::main("IF", "Recover");
        false_edge.output_index = Some(1);
        let graph = FlowGraph::new(&[false_edge]);
        let hint = input_hint_for("Recover", &graph, &hints).expect("hint");
        assert_eq!(hint, vec!["reason"]);
    }

    #[test]
    fn trigger_nodes_get_no_hint() {
        let graph = FlowGraph::new(&[LiteConnection::main("A", "B")]);
        let hints = BTreeMap::new();
        assert!(input_hint_for("A", &graph, &hints).is_none());
    }
}
