// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The MCP tool surface.
//!
//! Mutation flow: approval gate → fetch → snapshot → virtual edit → preflight →
//! engine write → audit. Preflight errors return a structured blocked result
//! with the snapshot already on disk; snapshot and audit failures are logged
//! and swallowed, never surfaced as mutation failures.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::approval::{ApprovalDecision, ApprovalGate};
use crate::catalog::{Catalog, SearchMode};
use crate::client::{ApiError, EngineClient};
use crate::codec::{self, CodecError};
use crate::config::Config;
use crate::focus::{self, FocusError, FocusSelection};
use crate::graph::FlowGraph;
use crate::layout::auto_layout;
use crate::model::{
    Execution, LiteConnection, LiteWorkflow, ScanWorkflow, Workflow, MAIN_CONNECTION,
};
use crate::preflight::{run_preflight, PreflightReport};
use crate::store::{AuditEntry, SnapshotStore, SnapshotTrigger, StoreError};

use super::types::*;

const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug)]
struct ServerState {
    store: SnapshotStore,
    gate: ApprovalGate,
}

#[derive(Clone)]
pub struct ProteusMcp {
    state: Arc<Mutex<ServerState>>,
    client: EngineClient,
    catalog: Arc<Catalog>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ProteusMcp {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            EngineClient::new(&config.host, &config.api_key, config.timeout),
            SnapshotStore::new(config.state_dir.clone()),
            ApprovalGate::new(config.require_approval),
            Catalog::load(),
        )
    }

    pub fn with_parts(
        client: EngineClient,
        store: SnapshotStore,
        gate: ApprovalGate,
        catalog: Catalog,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState { store, gate })),
            client,
            catalog: Arc::new(catalog),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Appends one audit line; failures are logged and swallowed.
    async fn audit(
        &self,
        tool: &str,
        workflow_id: Option<&str>,
        summary: &str,
        approved: bool,
        result: Option<String>,
    ) {
        let entry = AuditEntry {
            timestamp: chrono::Utc::now(),
            tool: tool.to_owned(),
            workflow_id: workflow_id.map(ToOwned::to_owned),
            summary: summary.to_owned(),
            approved,
            result,
        };
        let state = self.state.lock().await;
        if let Err(err) = state.store.append_audit(&entry) {
            tracing::warn!(tool, "audit append failed: {err}");
        }
    }

    /// Gate step of the two-phase commit. `Some` short-circuits the handler
    /// with a pending response; `None` means proceed.
    async fn check_approval(
        &self,
        tool: &str,
        workflow_id: Option<&str>,
        summary: &str,
        approve: Option<&str>,
    ) -> Result<Option<Json<MutationResponse>>, ErrorData> {
        let decision = {
            let mut state = self.state.lock().await;
            state.gate.check(tool, summary, approve)
        };
        match decision {
            ApprovalDecision::Proceed => Ok(None),
            ApprovalDecision::Pending { token } => {
                self.audit(tool, workflow_id, summary, false, None).await;
                Ok(Some(Json(MutationResponse::Pending(PendingApproval {
                    pending: true,
                    approve_token: token,
                    summary: summary.to_owned(),
                }))))
            }
            ApprovalDecision::Rejected { reason } => Err(ErrorData::invalid_params(reason, None)),
        }
    }

    /// Writes a pre-mutation snapshot; failures are logged and swallowed so
    /// they never block the mutation itself.
    async fn snapshot_quiet(
        &self,
        workflow: &Value,
        trigger: SnapshotTrigger,
        description: &str,
    ) -> Option<String> {
        let state = self.state.lock().await;
        match state.store.save_snapshot(workflow, trigger, description) {
            Ok(meta) => Some(meta.id),
            Err(err) => {
                tracing::warn!("snapshot write failed: {err}");
                None
            }
        }
    }

    async fn fetch_raw(&self, id: &str) -> Result<(Value, Workflow), ErrorData> {
        let value = self.client.get_workflow(id).await.map_err(map_api_error)?;
        let workflow = codec::parse_workflow(value.clone()).map_err(map_codec_error)?;
        Ok((value, workflow))
    }

    async fn run_data_for(&self, execution_id: &str) -> Result<Option<Value>, ErrorData> {
        let execution = self
            .client
            .get_execution(execution_id, true)
            .await
            .map_err(map_api_error)?;
        Ok(execution.run_data().cloned())
    }

    // ------------------------------------------------------------------ read

    /// List workflows on the engine, paginated. Start here to find ids for
    /// `scan_workflow` and `focus_workflow`.
    #[tool(name = "list_workflows")]
    async fn list_workflows(
        &self,
        params: Parameters<ListWorkflowsParams>,
    ) -> Result<Json<ListWorkflowsResponse>, ErrorData> {
        let ListWorkflowsParams { limit, cursor, active, tags } = params.0;
        let list = self
            .client
            .list_workflows(limit, cursor.as_deref(), active, tags.as_deref())
            .await
            .map_err(map_api_error)?;

        Ok(Json(ListWorkflowsResponse {
            workflows: list.data.iter().map(workflow_summary).collect(),
            next_cursor: list.next_cursor,
        }))
    }

    /// One line per node: names, types, summaries, branch segments, and a
    /// token estimate. Use before `get_workflow` on anything non-trivial; the
    /// response says when focusing is recommended.
    #[tool(name = "scan_workflow")]
    async fn scan_workflow(
        &self,
        params: Parameters<WorkflowIdParams>,
    ) -> Result<Json<ScanWorkflow>, ErrorData> {
        let (_, workflow) = self.fetch_raw(&params.0.id).await?;
        Ok(Json(focus::scan_workflow(&workflow)))
    }

    /// The whole workflow in lite form: compact nodes, flat connection list,
    /// topologically sorted.
    #[tool(name = "get_workflow")]
    async fn get_workflow(
        &self,
        params: Parameters<WorkflowIdParams>,
    ) -> Result<Json<LiteWorkflow>, ErrorData> {
        let (_, workflow) = self.fetch_raw(&params.0.id).await?;
        Ok(Json(codec::compress_workflow(&workflow)))
    }

    /// The engine's raw JSON, untouched. Expensive in tokens; prefer
    /// `get_workflow` unless byte fidelity matters.
    #[tool(name = "get_workflow_raw")]
    async fn get_workflow_raw(
        &self,
        params: Parameters<WorkflowIdParams>,
    ) -> Result<Json<Value>, ErrorData> {
        let value = self
            .client
            .get_workflow(&params.0.id)
            .await
            .map_err(map_api_error)?;
        Ok(Json(value))
    }

    /// Full detail for a chosen subset (explicit nodes, a router branch, or a
    /// from/to range); everything else degrades to one-line dormant entries
    /// with zone annotations. Pass `execution_id` to attach ghost-payload
    /// field hints from a prior run.
    #[tool(name = "focus_workflow")]
    async fn focus_workflow(
        &self,
        params: Parameters<FocusWorkflowParams>,
    ) -> Result<Json<crate::model::FocusedWorkflow>, ErrorData> {
        let FocusWorkflowParams { id, nodes, branch, range, execution_id } = params.0;

        let selectors =
            usize::from(nodes.is_some()) + usize::from(branch.is_some()) + usize::from(range.is_some());
        if selectors != 1 {
            return Err(ErrorData::invalid_params(
                "provide exactly one of 'nodes', 'branch', or 'range'",
                None,
            ));
        }

        let selection = if let Some(names) = nodes {
            FocusSelection::Explicit(names)
        } else if let Some(branch) = branch {
            FocusSelection::Branch {
                router: branch.router,
                output_index: branch.output_index,
                max_depth: branch.max_depth.map(|depth| depth as usize),
                upstream_levels: branch.upstream_levels.map(|levels| levels as usize),
            }
        } else {
            let range = range.expect("selector count checked above");
            FocusSelection::Range { from: range.from, to: range.to }
        };

        let (_, workflow) = self.fetch_raw(&id).await?;
        let run_data = match execution_id {
            Some(execution_id) => self.run_data_for(&execution_id).await?,
            None => None,
        };

        focus::focus_workflow(&workflow, &selection, run_data.as_ref())
            .map(Json)
            .map_err(map_focus_error)
    }

    /// Re-focus with a widened set: the previous focused names plus new ones,
    /// optionally grown by N upstream/downstream levels.
    #[tool(name = "expand_focus")]
    async fn expand_focus(
        &self,
        params: Parameters<ExpandFocusParams>,
    ) -> Result<Json<crate::model::FocusedWorkflow>, ErrorData> {
        let ExpandFocusParams { id, nodes, add_upstream, add_downstream, execution_id } = params.0;
        if nodes.is_empty() {
            return Err(ErrorData::invalid_params("'nodes' must not be empty", None));
        }

        let (_, workflow) = self.fetch_raw(&id).await?;
        let lite = codec::compress_workflow(&workflow);
        let graph = FlowGraph::new(&lite.connections);

        let mut union: BTreeSet<String> = nodes.iter().cloned().collect();
        let starts: Vec<&str> = nodes.iter().map(String::as_str).collect();
        if let Some(levels) = add_upstream {
            union.extend(graph.bfs_backward(
                starts.iter().copied(),
                Some(levels as usize),
                &BTreeSet::new(),
            ));
        }
        if let Some(levels) = add_downstream {
            union.extend(graph.bfs_forward(
                starts.iter().copied(),
                Some(levels as usize),
                &BTreeSet::new(),
            ));
        }

        let run_data = match execution_id {
            Some(execution_id) => self.run_data_for(&execution_id).await?,
            None => None,
        };

        let selection = FocusSelection::Explicit(union.into_iter().collect());
        focus::focus_workflow(&workflow, &selection, run_data.as_ref())
            .map(Json)
            .map_err(map_focus_error)
    }

    // ----------------------------------------------------------------- write

    /// Create a workflow from lite form. Positions are auto-laid-out; the
    /// mutation is preflighted and snapshotted first.
    #[tool(name = "create_workflow")]
    async fn create_workflow(
        &self,
        params: Parameters<CreateWorkflowParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let CreateWorkflowParams { workflow, approve } = params.0;
        let summary = format!(
            "create workflow '{}' ({} nodes)",
            workflow.name,
            workflow.nodes.len()
        );
        if let Some(pending) = self
            .check_approval("create_workflow", None, &summary, approve.as_deref())
            .await?
        {
            return Ok(pending);
        }

        let report = run_preflight(&workflow.nodes, &workflow.connections, &self.catalog);

        let mut raw = codec::reconstruct_workflow(&workflow, None);
        let names: Vec<String> = raw.nodes.iter().map(|node| node.name.clone()).collect();
        let positions = auto_layout(&names, &workflow.connections);
        for node in &mut raw.nodes {
            if let Some(position) = positions.get(&node.name) {
                node.position = *position;
            }
        }

        let candidate = serde_json::to_value(&raw)
            .map_err(|err| ErrorData::internal_error(err.to_string(), None))?;
        let snapshot_id = self
            .snapshot_quiet(&candidate, SnapshotTrigger::PreCreate, &summary)
            .await;

        if !report.passed {
            self.audit("create_workflow", None, &summary, true, Some("blocked".to_owned()))
                .await;
            return Ok(blocked_response(report, snapshot_id));
        }

        let created = self
            .client
            .create_workflow(&raw)
            .await
            .map_err(map_api_error)?;
        let id = created
            .get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        self.audit(
            "create_workflow",
            id.as_deref(),
            &summary,
            true,
            Some("created".to_owned()),
        )
        .await;

        Ok(Json(MutationResponse::Applied(MutationApplied {
            id,
            name: Some(workflow.name.clone()),
            nodes: Some(workflow.nodes.len() as u32),
            snapshot_id,
            warnings: report.warnings,
            message: format!("created '{}'", workflow.name),
        })))
    }

    /// Replace a workflow wholesale with the given lite form. Prefer
    /// `update_nodes` for targeted edits.
    #[tool(name = "update_workflow")]
    async fn update_workflow(
        &self,
        params: Parameters<UpdateWorkflowParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let UpdateWorkflowParams { id, workflow, approve } = params.0;
        let summary = format!("replace workflow {id} ({} nodes)", workflow.nodes.len());
        if let Some(pending) = self
            .check_approval("update_workflow", Some(&id), &summary, approve.as_deref())
            .await?
        {
            return Ok(pending);
        }

        let (raw_value, original) = self.fetch_raw(&id).await?;
        let snapshot_id = self
            .snapshot_quiet(&raw_value, SnapshotTrigger::PreUpdateWorkflow, &summary)
            .await;

        let report = run_preflight(&workflow.nodes, &workflow.connections, &self.catalog);
        if !report.passed {
            self.audit("update_workflow", Some(&id), &summary, true, Some("blocked".to_owned()))
                .await;
            return Ok(blocked_response(report, snapshot_id));
        }

        let mut raw = codec::reconstruct_workflow(&workflow, Some(&original));
        let original_names: BTreeSet<String> =
            original.nodes.iter().map(|node| node.name.clone()).collect();
        place_new_nodes(&mut raw, &original_names, &BTreeMap::new());

        self.client
            .update_workflow(&id, &raw)
            .await
            .map_err(map_api_error)?;
        self.audit("update_workflow", Some(&id), &summary, true, Some("updated".to_owned()))
            .await;

        Ok(Json(MutationResponse::Applied(MutationApplied {
            id: Some(id),
            name: Some(workflow.name.clone()),
            nodes: Some(workflow.nodes.len() as u32),
            snapshot_id,
            warnings: report.warnings,
            message: format!("updated '{}'", workflow.name),
        })))
    }

    /// Apply surgical operations (add/remove/update node, connect/disconnect,
    /// enable/disable, rename) to a workflow fetched just-in-time.
    #[tool(name = "update_nodes")]
    async fn update_nodes(
        &self,
        params: Parameters<UpdateNodesParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let UpdateNodesParams { id, operations, approve } = params.0;
        if operations.is_empty() {
            return Err(ErrorData::invalid_params("'operations' must not be empty", None));
        }
        let summary = format!("apply {} operation(s) to workflow {id}", operations.len());
        if let Some(pending) = self
            .check_approval("update_nodes", Some(&id), &summary, approve.as_deref())
            .await?
        {
            return Ok(pending);
        }

        let (raw_value, original) = self.fetch_raw(&id).await?;
        let snapshot_id = self
            .snapshot_quiet(&raw_value, SnapshotTrigger::PreUpdateNodes, &summary)
            .await;

        let mut lite = codec::compress_workflow(&original);
        let mut lookup = original.clone();
        let outcome = apply_operations(&mut lite, &mut lookup, &operations).map_err(map_op_error)?;

        let report = run_preflight(&lite.nodes, &lite.connections, &self.catalog);
        if !report.passed {
            self.audit("update_nodes", Some(&id), &summary, true, Some("blocked".to_owned()))
                .await;
            return Ok(blocked_response(report, snapshot_id));
        }

        let mut raw = codec::reconstruct_workflow(&lite, Some(&lookup));
        let original_names: BTreeSet<String> =
            lookup.nodes.iter().map(|node| node.name.clone()).collect();
        place_new_nodes(&mut raw, &original_names, &outcome.placements);

        self.client
            .update_workflow(&id, &raw)
            .await
            .map_err(map_api_error)?;
        self.audit(
            "update_nodes",
            Some(&id),
            &summary,
            true,
            Some(outcome.summaries.join("; ")),
        )
        .await;

        Ok(Json(MutationResponse::Applied(MutationApplied {
            id: Some(id),
            name: Some(lite.name.clone()),
            nodes: Some(lite.nodes.len() as u32),
            snapshot_id,
            warnings: report.warnings,
            message: outcome.summaries.join("; "),
        })))
    }

    /// Permanently delete a workflow. Requires `confirm: true`; a final
    /// snapshot is written first.
    #[tool(name = "delete_workflow")]
    async fn delete_workflow(
        &self,
        params: Parameters<DeleteWorkflowParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let DeleteWorkflowParams { id, confirm, approve } = params.0;
        if !confirm {
            return Err(ErrorData::invalid_params(
                "deletion is permanent; pass confirm: true to proceed",
                None,
            ));
        }
        let summary = format!("delete workflow {id}");
        if let Some(pending) = self
            .check_approval("delete_workflow", Some(&id), &summary, approve.as_deref())
            .await?
        {
            return Ok(pending);
        }

        let (raw_value, original) = self.fetch_raw(&id).await?;
        let snapshot_id = self
            .snapshot_quiet(&raw_value, SnapshotTrigger::PreDelete, &summary)
            .await;

        self.client
            .delete_workflow(&id)
            .await
            .map_err(map_api_error)?;
        self.audit("delete_workflow", Some(&id), &summary, true, Some("deleted".to_owned()))
            .await;

        Ok(Json(MutationResponse::Applied(MutationApplied {
            id: Some(id),
            name: Some(original.name.clone()),
            nodes: None,
            snapshot_id,
            warnings: Vec::new(),
            message: format!("deleted '{}'", original.name),
        })))
    }

    // ------------------------------------------------------------ activation

    /// Enable the workflow's automatic triggers.
    #[tool(name = "activate_workflow")]
    async fn activate_workflow(
        &self,
        params: Parameters<ActivationParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        self.set_active(params.0, true).await
    }

    /// Disable the workflow's automatic triggers.
    #[tool(name = "deactivate_workflow")]
    async fn deactivate_workflow(
        &self,
        params: Parameters<ActivationParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        self.set_active(params.0, false).await
    }

    // ------------------------------------------------------------- execution

    /// List executions, optionally filtered by workflow and status.
    #[tool(name = "list_executions")]
    async fn list_executions(
        &self,
        params: Parameters<ListExecutionsParams>,
    ) -> Result<Json<ListExecutionsResponse>, ErrorData> {
        let ListExecutionsParams { workflow_id, status, limit } = params.0;
        let list = self
            .client
            .list_executions(workflow_id.as_deref(), status.as_deref(), limit)
            .await
            .map_err(map_api_error)?;

        Ok(Json(ListExecutionsResponse {
            executions: list.data.iter().map(execution_summary).collect(),
            next_cursor: list.next_cursor,
        }))
    }

    /// One execution with a compact per-node run summary; set `include_data`
    /// for the raw per-node output payloads.
    #[tool(name = "get_execution")]
    async fn get_execution(
        &self,
        params: Parameters<GetExecutionParams>,
    ) -> Result<Json<GetExecutionResponse>, ErrorData> {
        let GetExecutionParams { id, include_data } = params.0;
        let execution = self
            .client
            .get_execution(&id, true)
            .await
            .map_err(map_api_error)?;

        let nodes = run_summaries(&execution);
        let data = include_data
            .unwrap_or(false)
            .then(|| execution.data.clone())
            .flatten();

        Ok(Json(GetExecutionResponse {
            execution: execution_summary(&execution),
            nodes,
            data,
        }))
    }

    /// POST to a webhook trigger; `test: true` targets the test endpoint that
    /// only listens while the editor waits for an event.
    #[tool(name = "trigger_webhook")]
    async fn trigger_webhook(
        &self,
        params: Parameters<TriggerWebhookParams>,
    ) -> Result<Json<Value>, ErrorData> {
        let TriggerWebhookParams { path, payload, test } = params.0;
        let response = self
            .client
            .trigger_webhook(&path, payload.as_ref(), test.unwrap_or(false))
            .await
            .map_err(map_api_error)?;
        Ok(Json(response))
    }

    /// Dry-run one node: a throwaway webhook→node workflow is created,
    /// activated, triggered with the payload, and deleted again.
    #[tool(name = "test_node")]
    async fn test_node(
        &self,
        params: Parameters<TestNodeParams>,
    ) -> Result<Json<TestNodeResponse>, ErrorData> {
        let TestNodeParams { node, payload } = params.0;
        let path = format!(
            "proteus-test-{}",
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );

        let mut trigger = crate::model::LiteNode::new("Test Trigger", "webhook");
        trigger.parameters = Some(serde_json::json!({
            "path": path,
            "httpMethod": "POST",
            "responseMode": "lastNode",
        }));

        let node_name = node.name.clone();
        let lite = LiteWorkflow {
            id: None,
            name: format!("proteus dry-run: {node_name}"),
            active: false,
            nodes: vec![trigger, node],
            connections: vec![LiteConnection::main("Test Trigger", node_name.clone())],
            tags: None,
            settings: None,
        };

        let mut raw = codec::reconstruct_workflow(&lite, None);
        let names: Vec<String> = raw.nodes.iter().map(|node| node.name.clone()).collect();
        let positions = auto_layout(&names, &lite.connections);
        for node in &mut raw.nodes {
            if let Some(position) = positions.get(&node.name) {
                node.position = *position;
            }
        }

        let created = self
            .client
            .create_workflow(&raw)
            .await
            .map_err(map_api_error)?;
        let Some(id) = created
            .get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
        else {
            return Err(ErrorData::internal_error(
                "engine did not return an id for the throwaway workflow",
                None,
            ));
        };

        // Trigger, then always clean up, then report the trigger outcome.
        let activation = self.client.activate_workflow(&id).await;
        let response = match activation {
            Ok(_) => self.client.trigger_webhook(&path, payload.as_ref(), false).await,
            Err(err) => Err(err),
        };
        if let Err(err) = self.client.delete_workflow(&id).await {
            tracing::warn!("dry-run cleanup failed for workflow {id}: {err}");
        }
        self.audit(
            "test_node",
            Some(&id),
            &format!("dry-run node '{node_name}'"),
            true,
            Some(if response.is_ok() { "ok" } else { "trigger failed" }.to_owned()),
        )
        .await;

        let response = response.map_err(map_api_error)?;
        Ok(Json(TestNodeResponse { response, workflow_id: Some(id) }))
    }

    // ------------------------------------------------------------ versioning

    /// Pre-mutation snapshots for a workflow, newest first.
    #[tool(name = "list_snapshots")]
    async fn list_snapshots(
        &self,
        params: Parameters<ListSnapshotsParams>,
    ) -> Result<Json<ListSnapshotsResponse>, ErrorData> {
        let ListSnapshotsParams { id, limit } = params.0;
        let state = self.state.lock().await;
        let snapshots = state
            .store
            .list_snapshots(&id, limit.map(|limit| limit as usize))
            .map_err(map_store_error)?;
        Ok(Json(ListSnapshotsResponse { snapshots }))
    }

    /// Restore a workflow from a snapshot. The current state is captured as a
    /// fresh safety snapshot before the restore is written.
    #[tool(name = "rollback_workflow")]
    async fn rollback_workflow(
        &self,
        params: Parameters<RollbackParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let RollbackParams { id, snapshot_id, approve } = params.0;
        let summary = format!("rollback workflow {id} to snapshot {snapshot_id}");
        if let Some(pending) = self
            .check_approval("rollback_workflow", Some(&id), &summary, approve.as_deref())
            .await?
        {
            return Ok(pending);
        }

        let (raw_value, _) = self.fetch_raw(&id).await?;

        let stored = {
            let state = self.state.lock().await;
            state
                .store
                .get_snapshot(&id, &snapshot_id)
                .map_err(map_store_error)?
        };
        let Some(stored) = stored else {
            return Err(ErrorData::resource_not_found(
                format!("no snapshot '{snapshot_id}' for workflow '{id}'"),
                Some(serde_json::json!({ "snapshotId": snapshot_id })),
            ));
        };

        let safety_id = self
            .snapshot_quiet(&raw_value, SnapshotTrigger::Manual, "safety snapshot before rollback")
            .await;

        let restored = codec::parse_workflow(stored.workflow.clone()).map_err(map_codec_error)?;
        self.client
            .update_workflow(&id, &restored)
            .await
            .map_err(map_api_error)?;
        self.audit("rollback_workflow", Some(&id), &summary, true, Some("restored".to_owned()))
            .await;

        Ok(Json(MutationResponse::Applied(MutationApplied {
            id: Some(id),
            name: Some(restored.name.clone()),
            nodes: Some(restored.nodes.len() as u32),
            snapshot_id: safety_id,
            warnings: Vec::new(),
            message: format!(
                "restored {} nodes from snapshot '{snapshot_id}'",
                restored.nodes.len()
            ),
        })))
    }

    // ------------------------------------------------------------- knowledge

    /// Scored search over the node index. Mode AND (default), OR, or FUZZY.
    #[tool(name = "search_nodes")]
    async fn search_nodes(
        &self,
        params: Parameters<SearchNodesParams>,
    ) -> Result<Json<SearchNodesResponse>, ErrorData> {
        let SearchNodesParams { query, mode, limit, source } = params.0;
        let results = self.catalog.search_nodes(
            &query,
            mode.unwrap_or(SearchMode::And),
            limit.map(|limit| limit as usize).unwrap_or(DEFAULT_SEARCH_LIMIT),
            source.as_deref(),
        );
        Ok(Json(SearchNodesResponse { results }))
    }

    /// One node schema by full type, short type, or display name.
    #[tool(name = "get_node")]
    async fn get_node(
        &self,
        params: Parameters<GetNodeParams>,
    ) -> Result<Json<crate::catalog::NodeSchema>, ErrorData> {
        let query = params.0.query;
        match self.catalog.get_node(&query) {
            Some(schema) => Ok(Json(schema.clone())),
            None => Err(ErrorData::resource_not_found(
                format!("no node matching '{query}'; try search_nodes"),
                Some(serde_json::json!({ "query": query })),
            )),
        }
    }

    /// Keyword search over pattern recipes.
    #[tool(name = "search_patterns")]
    async fn search_patterns(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<Json<SearchPatternsResponse>, ErrorData> {
        let patterns = self
            .catalog
            .search_patterns(&params.0.query)
            .into_iter()
            .cloned()
            .collect();
        Ok(Json(SearchPatternsResponse { patterns }))
    }

    /// One pattern recipe by name.
    #[tool(name = "get_pattern")]
    async fn get_pattern(
        &self,
        params: Parameters<GetPatternParams>,
    ) -> Result<Json<crate::catalog::Pattern>, ErrorData> {
        let name = params.0.name;
        match self.catalog.get_pattern(&name) {
            Some(pattern) => Ok(Json(pattern.clone())),
            None => Err(ErrorData::resource_not_found(
                format!("no pattern named '{name}'; try search_patterns"),
                Some(serde_json::json!({ "name": name })),
            )),
        }
    }

    /// Known webhook payload shapes for a service.
    #[tool(name = "get_payload_schema")]
    async fn get_payload_schema(
        &self,
        params: Parameters<PayloadSchemaParams>,
    ) -> Result<Json<PayloadSchemasResponse>, ErrorData> {
        let payloads = self
            .catalog
            .payload_schemas(&params.0.service)
            .into_iter()
            .cloned()
            .collect();
        Ok(Json(PayloadSchemasResponse { payloads }))
    }

    /// Documented quirks for a node type or keyword.
    #[tool(name = "get_quirks")]
    async fn get_quirks(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<Json<GetQuirksResponse>, ErrorData> {
        let quirks = self
            .catalog
            .quirks_for(&params.0.query)
            .into_iter()
            .cloned()
            .collect();
        Ok(Json(GetQuirksResponse { quirks }))
    }

    /// Expression cookbook search.
    #[tool(name = "search_expressions")]
    async fn search_expressions(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<Json<SearchExpressionsResponse>, ErrorData> {
        let expressions = self
            .catalog
            .search_expressions(&params.0.query)
            .into_iter()
            .cloned()
            .collect();
        Ok(Json(SearchExpressionsResponse { expressions }))
    }

    /// Node packages in the index with their node counts.
    #[tool(name = "list_providers")]
    async fn list_providers(&self) -> Result<Json<ListProvidersResponse>, ErrorData> {
        Ok(Json(providers_response(&self.catalog)))
    }

    // -------------------------------------------------------------- approval

    /// Toggle the two-phase approval gate at runtime.
    #[tool(name = "set_approval_mode")]
    async fn set_approval_mode(
        &self,
        params: Parameters<SetApprovalModeParams>,
    ) -> Result<Json<SetApprovalModeResponse>, ErrorData> {
        let enabled = params.0.enabled;
        let mut state = self.state.lock().await;
        state.gate.set_enabled(enabled);
        Ok(Json(SetApprovalModeResponse {
            enabled,
            pending_operations: state.gate.pending_count() as u32,
        }))
    }
}

impl ProteusMcp {
    async fn set_active(
        &self,
        params: ActivationParams,
        active: bool,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let ActivationParams { id, approve } = params;
        let (tool, verb) = if active {
            ("activate_workflow", "activate")
        } else {
            ("deactivate_workflow", "deactivate")
        };
        let summary = format!("{verb} workflow {id}");
        if let Some(pending) = self
            .check_approval(tool, Some(&id), &summary, approve.as_deref())
            .await?
        {
            return Ok(pending);
        }

        let result = if active {
            self.client.activate_workflow(&id).await
        } else {
            self.client.deactivate_workflow(&id).await
        };
        result.map_err(map_api_error)?;
        self.audit(tool, Some(&id), &summary, true, Some(format!("{verb}d")))
            .await;

        Ok(Json(MutationResponse::Applied(MutationApplied {
            id: Some(id),
            name: None,
            nodes: None,
            snapshot_id: None,
            warnings: Vec::new(),
            message: format!("{verb}d"),
        })))
    }
}

fn blocked_response(report: PreflightReport, snapshot_id: Option<String>) -> Json<MutationResponse> {
    Json(MutationResponse::Blocked(BlockedMutation {
        blocked: true,
        message: report.summary,
        errors: report.errors,
        warnings: report.warnings,
        snapshot_id,
    }))
}

#[tool_handler]
impl ServerHandler for ProteusMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "proteus".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Implementation::default()
            },
            instructions: Some(
                "Workflow mediation server for an n8n-compatible engine. Read tools: list_workflows, scan_workflow, get_workflow, get_workflow_raw, focus_workflow, expand_focus. Write tools (preflighted, snapshotted, optionally approval-gated): create_workflow, update_workflow, update_nodes, delete_workflow. Activation: activate_workflow, deactivate_workflow. Executions: list_executions, get_execution, trigger_webhook, test_node. Versioning: list_snapshots, rollback_workflow. Knowledge: search_nodes, get_node, search_patterns, get_pattern, get_payload_schema, get_quirks, search_expressions, list_providers. Approval: set_approval_mode. Start with scan_workflow; focus before fetching large workflows."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Extracted mapping/op-application helpers for MCP tool handlers.
include!("server/helpers.rs");

#[cfg(test)]
mod tests;
