// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions:
/// error mapping, surgical op application, node placement, run summaries.

fn map_api_error(err: ApiError) -> ErrorData {
    match &err {
        ApiError::Http { status: 404, body: _ } => {
            ErrorData::resource_not_found(format!("Error: {err}"), None)
        }
        _ => ErrorData::internal_error(format!("Error: {err}"), None),
    }
}

fn map_codec_error(err: CodecError) -> ErrorData {
    ErrorData::invalid_params(err.to_string(), None)
}

fn map_store_error(err: StoreError) -> ErrorData {
    ErrorData::internal_error(err.to_string(), None)
}

fn map_focus_error(err: FocusError) -> ErrorData {
    match &err {
        FocusError::UnknownNode { name } => ErrorData::resource_not_found(
            err.to_string(),
            Some(serde_json::json!({ "node": name })),
        ),
        _ => ErrorData::invalid_params(err.to_string(), None),
    }
}

fn workflow_summary(workflow: &Workflow) -> WorkflowSummary {
    WorkflowSummary {
        id: workflow.id.clone(),
        name: workflow.name.clone(),
        active: workflow.active,
        nodes: workflow.nodes.len() as u32,
        tags: workflow.tag_names(),
    }
}

fn execution_summary(execution: &Execution) -> ExecutionSummary {
    let id = match &execution.id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    ExecutionSummary {
        id,
        status: execution.status.clone(),
        finished: execution.finished,
        workflow_id: execution.workflow_id.clone(),
        started_at: execution.started_at,
        stopped_at: execution.stopped_at,
        mode: execution.mode.clone(),
    }
}

/// Compact per-node view of `resultData.runData`: last run, first main output.
fn run_summaries(execution: &Execution) -> Vec<NodeRunSummary> {
    let Some(Value::Object(nodes)) = execution.run_data() else {
        return Vec::new();
    };

    nodes
        .iter()
        .filter_map(|(name, runs)| {
            let last = runs.as_array()?.last()?;
            if let Some(error) = last.get("error") {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("error")
                    .to_owned();
                return Some(NodeRunSummary {
                    node: name.clone(),
                    status: "error".to_owned(),
                    items: 0,
                    error: Some(message),
                });
            }
            let items = last
                .get("data")
                .and_then(|data| data.get("main"))
                .and_then(Value::as_array)
                .and_then(|outputs| outputs.first())
                .and_then(Value::as_array)
                .map(|items| items.len() as u32)
                .unwrap_or(0);
            Some(NodeRunSummary {
                node: name.clone(),
                status: "success".to_owned(),
                items,
                error: None,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OpError {
    NodeExists { name: String },
    NodeMissing { name: String },
    ConnectionMissing { from: String, to: String },
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeExists { name } => write!(f, "a node named '{name}' already exists"),
            Self::NodeMissing { name } => write!(f, "no node named '{name}' in this workflow"),
            Self::ConnectionMissing { from, to } => {
                write!(f, "no connection from '{from}' to '{to}'")
            }
        }
    }
}

fn map_op_error(err: OpError) -> ErrorData {
    match &err {
        OpError::NodeMissing { name } => ErrorData::resource_not_found(
            err.to_string(),
            Some(serde_json::json!({ "node": name })),
        ),
        _ => ErrorData::invalid_params(err.to_string(), None),
    }
}

#[derive(Debug, Default)]
struct OpOutcome {
    summaries: Vec<String>,
    /// Explicit editor positions for added nodes.
    placements: BTreeMap<String, [f64; 2]>,
}

fn has_node(lite: &LiteWorkflow, name: &str) -> bool {
    lite.nodes.iter().any(|node| node.name == name)
}

/// Applies surgical operations to the virtual lite state, in order.
///
/// Renames are mirrored onto `original` (the just-fetched raw copy) so the
/// codec still resolves credentials and positions under the new name.
fn apply_operations(
    lite: &mut LiteWorkflow,
    original: &mut Workflow,
    operations: &[NodeOperation],
) -> Result<OpOutcome, OpError> {
    let mut outcome = OpOutcome::default();

    for operation in operations {
        match operation {
            NodeOperation::AddNode { node, position } => {
                if has_node(lite, &node.name) {
                    return Err(OpError::NodeExists { name: node.name.clone() });
                }
                if let Some(position) = position {
                    outcome.placements.insert(node.name.clone(), *position);
                }
                outcome
                    .summaries
                    .push(format!("add node '{}' ({})", node.name, node.node_type));
                lite.nodes.push(node.clone());
            }
            NodeOperation::RemoveNode { name } => {
                if !has_node(lite, name) {
                    return Err(OpError::NodeMissing { name: name.clone() });
                }
                lite.nodes.retain(|node| node.name != *name);
                lite.connections
                    .retain(|conn| conn.from != *name && conn.to != *name);
                outcome.summaries.push(format!("remove node '{name}'"));
            }
            NodeOperation::UpdateNode { name, parameters, type_version, notes, credentials } => {
                let node = lite
                    .nodes
                    .iter_mut()
                    .find(|node| node.name == *name)
                    .ok_or_else(|| OpError::NodeMissing { name: name.clone() })?;
                if let Some(parameters) = parameters {
                    node.parameters = Some(parameters.clone());
                }
                if let Some(type_version) = type_version {
                    node.type_version = Some(type_version.clone());
                }
                if let Some(notes) = notes {
                    node.notes = Some(notes.clone());
                }
                if let Some(credentials) = credentials {
                    node.credentials = Some(credentials.clone());
                }
                outcome.summaries.push(format!("update node '{name}'"));
            }
            NodeOperation::AddConnection { from, to, kind, output_index, input_index } => {
                for endpoint in [from, to] {
                    if !has_node(lite, endpoint) {
                        return Err(OpError::NodeMissing { name: endpoint.clone() });
                    }
                }
                lite.connections.push(LiteConnection {
                    from: from.clone(),
                    to: to.clone(),
                    kind: kind.clone().filter(|kind| kind != MAIN_CONNECTION),
                    output_index: output_index.filter(|index| *index > 0),
                    input_index: *input_index,
                });
                outcome.summaries.push(format!("connect '{from}' -> '{to}'"));
            }
            NodeOperation::RemoveConnection { from, to, kind, output_index } => {
                let before = lite.connections.len();
                lite.connections.retain(|conn| {
                    let matches = conn.from == *from
                        && conn.to == *to
                        && kind.as_deref().map_or(true, |kind| conn.kind() == kind)
                        && output_index.map_or(true, |index| conn.output_index() == index);
                    !matches
                });
                if lite.connections.len() == before {
                    return Err(OpError::ConnectionMissing {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
                outcome
                    .summaries
                    .push(format!("disconnect '{from}' -> '{to}'"));
            }
            NodeOperation::SetNodeEnabled { name, enabled } => {
                let node = lite
                    .nodes
                    .iter_mut()
                    .find(|node| node.name == *name)
                    .ok_or_else(|| OpError::NodeMissing { name: name.clone() })?;
                node.disabled = (!enabled).then_some(true);
                let verb = if *enabled { "enable" } else { "disable" };
                outcome.summaries.push(format!("{verb} node '{name}'"));
            }
            NodeOperation::RenameNode { from, to } => {
                if !has_node(lite, from) {
                    return Err(OpError::NodeMissing { name: from.clone() });
                }
                if has_node(lite, to) {
                    return Err(OpError::NodeExists { name: to.clone() });
                }

                for node in &mut lite.nodes {
                    if node.name == *from {
                        node.name = to.clone();
                    }
                }
                for conn in &mut lite.connections {
                    if conn.from == *from {
                        conn.from = to.clone();
                    }
                    if conn.to == *from {
                        conn.to = to.clone();
                    }
                }
                rename_in_raw(original, from, to);
                outcome.summaries.push(format!("rename '{from}' -> '{to}'"));
            }
        }
    }

    Ok(outcome)
}

/// Mirrors a rename onto a raw workflow copy: node list plus every connection
/// endpoint.
fn rename_in_raw(workflow: &mut Workflow, from: &str, to: &str) {
    for node in &mut workflow.nodes {
        if node.name == from {
            node.name = to.to_owned();
        }
    }

    let connections = std::mem::take(&mut workflow.connections);
    workflow.connections = connections
        .into_iter()
        .map(|(source, kinds)| {
            let source = if source == from { to.to_owned() } else { source };
            let kinds = kinds
                .into_iter()
                .map(|(kind, mut outputs)| {
                    for targets in &mut outputs {
                        for target in targets {
                            if target.node == from {
                                target.node = to.to_owned();
                            }
                        }
                    }
                    (kind, outputs)
                })
                .collect();
            (source, kinds)
        })
        .collect();
}

/// Gives every node that was not in the fetched original a real editor
/// position: the explicit placement when one was given, otherwise one column
/// right of the current rightmost node, at the mean lane of its feeders.
fn place_new_nodes(
    workflow: &mut Workflow,
    original_names: &BTreeSet<String>,
    placements: &BTreeMap<String, [f64; 2]>,
) {
    let max_x = workflow
        .nodes
        .iter()
        .map(|node| node.position[0])
        .fold(f64::NEG_INFINITY, f64::max);
    let next_x = if max_x.is_finite() { max_x + 250.0 } else { 250.0 };

    let positions: BTreeMap<String, [f64; 2]> = workflow
        .nodes
        .iter()
        .map(|node| (node.name.clone(), node.position))
        .collect();
    let mut feeder_y: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (source, kinds) in &workflow.connections {
        let Some(source_position) = positions.get(source) else {
            continue;
        };
        for outputs in kinds.values() {
            for targets in outputs {
                for target in targets {
                    feeder_y
                        .entry(target.node.clone())
                        .or_default()
                        .push(source_position[1]);
                }
            }
        }
    }

    for node in &mut workflow.nodes {
        if original_names.contains(&node.name) {
            continue;
        }
        if let Some(explicit) = placements.get(&node.name) {
            node.position = *explicit;
            continue;
        }
        let y = feeder_y
            .get(&node.name)
            .filter(|lanes| !lanes.is_empty())
            .map(|lanes| lanes.iter().sum::<f64>() / lanes.len() as f64)
            .unwrap_or(300.0);
        node.position = [next_x, y];
    }
}

fn providers_response(catalog: &Catalog) -> ListProvidersResponse {
    ListProvidersResponse {
        providers: catalog
            .providers()
            .into_iter()
            .map(|(source, nodes)| ProviderSummary { source, nodes: nodes as u32 })
            .collect(),
    }
}
