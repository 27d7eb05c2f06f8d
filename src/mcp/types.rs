// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::SearchMode;
use crate::model::{LiteNode, LiteWorkflow};
use crate::preflight::ValidationIssue;
use crate::store::SnapshotMeta;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListWorkflowsParams {
    /// Page size; the engine caps it server-side.
    pub limit: Option<u32>,
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Filter by active state.
    pub active: Option<bool>,
    /// Keep only workflows carrying every listed tag name.
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub active: bool,
    pub nodes: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListWorkflowsResponse {
    pub workflows: Vec<WorkflowSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WorkflowIdParams {
    /// Workflow identity on the engine.
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchSelector {
    /// The branching node.
    pub router: String,
    pub output_index: u32,
    /// Stop following the branch after this many hops.
    pub max_depth: Option<u32>,
    /// Also include this many levels upstream of the router.
    pub upstream_levels: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RangeSelector {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FocusWorkflowParams {
    pub id: String,
    /// Explicit node names to focus. Exactly one of nodes/branch/range.
    pub nodes: Option<Vec<String>>,
    pub branch: Option<BranchSelector>,
    pub range: Option<RangeSelector>,
    /// Execution to harvest ghost-payload hints from (fetched with data).
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpandFocusParams {
    pub id: String,
    /// The focused set so far, plus any new names to include.
    pub nodes: Vec<String>,
    /// Widen by this many upstream levels from the given set.
    pub add_upstream: Option<u32>,
    /// Widen by this many downstream levels from the given set.
    pub add_downstream: Option<u32>,
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateWorkflowParams {
    pub workflow: LiteWorkflow,
    /// Approval token from a previous pending response (gate on only).
    pub approve: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateWorkflowParams {
    pub id: String,
    /// Full replacement in lite form.
    pub workflow: LiteWorkflow,
    pub approve: Option<String>,
}

/// One surgical edit. Operations apply in order against a just-fetched copy.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NodeOperation {
    AddNode {
        node: LiteNode,
        /// Editor position; computed from the graph when omitted.
        position: Option<[f64; 2]>,
    },
    RemoveNode {
        name: String,
    },
    UpdateNode {
        name: String,
        /// Replaces the node's parameter map wholesale.
        parameters: Option<Value>,
        type_version: Option<serde_json::Number>,
        notes: Option<String>,
        credentials: Option<BTreeMap<String, String>>,
    },
    AddConnection {
        from: String,
        to: String,
        kind: Option<String>,
        output_index: Option<u32>,
        input_index: Option<u32>,
    },
    RemoveConnection {
        from: String,
        to: String,
        /// Narrow the match; all from→to connections are removed when omitted.
        kind: Option<String>,
        output_index: Option<u32>,
    },
    SetNodeEnabled {
        name: String,
        enabled: bool,
    },
    RenameNode {
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateNodesParams {
    pub id: String,
    pub operations: Vec<NodeOperation>,
    pub approve: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteWorkflowParams {
    pub id: String,
    /// Deletion is permanent; the engine keeps no trash.
    pub confirm: bool,
    pub approve: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    /// Always true; marks the two-phase handshake.
    pub pending: bool,
    /// Echo this as `approve` to execute the mutation.
    pub approve_token: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockedMutation {
    /// Always true.
    pub blocked: bool,
    pub message: String,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// The pre-mutation snapshot, already written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutationApplied {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Advisory preflight findings; never blocking.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationIssue>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum MutationResponse {
    Pending(PendingApproval),
    Blocked(BlockedMutation),
    Applied(MutationApplied),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ActivationParams {
    pub id: String,
    /// Approval token from a previous pending response (gate on only).
    pub approve: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListExecutionsParams {
    pub workflow_id: Option<String>,
    /// e.g. "success", "error", "waiting".
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListExecutionsResponse {
    pub executions: Vec<ExecutionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetExecutionParams {
    pub id: String,
    /// Attach the raw per-node run data instead of the compact summary only.
    pub include_data: Option<bool>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeRunSummary {
    pub node: String,
    /// "success" or "error".
    pub status: String,
    /// Items on the first main output.
    pub items: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetExecutionResponse {
    pub execution: ExecutionSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeRunSummary>,
    /// Raw run data, present only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TriggerWebhookParams {
    /// Webhook path as configured on the trigger node.
    pub path: String,
    pub payload: Option<Value>,
    /// Use the test endpoint (only live while the editor is listening).
    pub test: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TestNodeParams {
    /// The node to dry-run inside a throwaway workflow.
    pub node: LiteNode,
    /// Body for the temporary webhook trigger.
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestNodeResponse {
    pub response: Value,
    /// The throwaway workflow, already deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListSnapshotsParams {
    pub id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListSnapshotsResponse {
    pub snapshots: Vec<SnapshotMeta>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RollbackParams {
    pub id: String,
    pub snapshot_id: String,
    pub approve: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchNodesParams {
    pub query: String,
    /// AND (default), OR, or FUZZY.
    pub mode: Option<SearchMode>,
    pub limit: Option<u32>,
    /// Restrict to one package: "core" or "langchain".
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchNodesResponse {
    pub results: Vec<crate::catalog::SearchHit>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetNodeParams {
    /// Full type, short type, or display name.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryParams {
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetPatternParams {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PayloadSchemaParams {
    /// Service name, e.g. "stripe" or "github".
    pub service: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub source: String,
    pub nodes: u32,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchPatternsResponse {
    pub patterns: Vec<crate::catalog::Pattern>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PayloadSchemasResponse {
    pub payloads: Vec<crate::catalog::PayloadSchema>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetQuirksResponse {
    pub quirks: Vec<crate::catalog::Quirk>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchExpressionsResponse {
    pub expressions: Vec<crate::catalog::ExpressionRecipe>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetApprovalModeParams {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetApprovalModeResponse {
    pub enabled: bool,
    /// Pending tokens outstanding at the time of the switch.
    pub pending_operations: u32,
}
