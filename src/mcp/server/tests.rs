// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;
use crate::model::LiteNode;
use serde_json::json;
use std::time::Duration;

fn temp_store(test_name: &str) -> SnapshotStore {
    use std::time::{SystemTime, UNIX_EPOCH};

    let mut dir = std::env::temp_dir();
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock is monotonic")
        .as_nanos();
    dir.push(format!("proteus-mcp-{test_name}-{pid}-{nanos}"));
    SnapshotStore::new(dir)
}

fn offline_mcp(test_name: &str, approval: bool) -> ProteusMcp {
    // Port 9 (discard) is never listened on; these tests exercise only the
    // paths that never reach the engine.
    ProteusMcp::with_parts(
        EngineClient::new("http://127.0.0.1:9", "test-key", Duration::from_millis(250)),
        temp_store(test_name),
        ApprovalGate::new(approval),
        Catalog::load(),
    )
}

fn lite_node(name: &str, node_type: &str) -> LiteNode {
    let mut node = LiteNode::new(name, node_type);
    node.id = format!("id-{name}");
    node
}

fn fixture_lite() -> LiteWorkflow {
    LiteWorkflow {
        id: Some("w1".to_owned()),
        name: "Fixture".to_owned(),
        active: false,
        nodes: vec![
            lite_node("Webhook", "webhook"),
            lite_node("Score", "code"),
            lite_node("Notify", "slack"),
        ],
        connections: vec![
            LiteConnection::main("Webhook", "Score"),
            LiteConnection::main("Score", "Notify"),
        ],
        tags: None,
        settings: None,
    }
}

fn fixture_raw() -> Workflow {
    codec::reconstruct_workflow(&fixture_lite(), None)
}

mod operations {
    use super::*;

    #[test]
    fn add_node_rejects_duplicates_and_records_placement() {
        let mut lite = fixture_lite();
        let mut raw = fixture_raw();

        let err = apply_operations(
            &mut lite,
            &mut raw,
            &[NodeOperation::AddNode { node: lite_node("Score", "set"), position: None }],
        )
        .expect_err("duplicate name");
        assert_eq!(err, OpError::NodeExists { name: "Score".to_owned() });

        let outcome = apply_operations(
            &mut lite,
            &mut raw,
            &[NodeOperation::AddNode {
                node: lite_node("Archive", "postgres"),
                position: Some([900.0, 420.0]),
            }],
        )
        .expect("add");
        assert_eq!(outcome.placements["Archive"], [900.0, 420.0]);
        assert!(lite.nodes.iter().any(|node| node.name == "Archive"));
    }

    #[test]
    fn remove_node_drops_its_connections() {
        let mut lite = fixture_lite();
        let mut raw = fixture_raw();

        apply_operations(&mut lite, &mut raw, &[NodeOperation::RemoveNode {
            name: "Score".to_owned(),
        }])
        .expect("remove");

        assert_eq!(lite.nodes.len(), 2);
        assert!(lite.connections.is_empty());

        let err = apply_operations(&mut lite, &mut raw, &[NodeOperation::RemoveNode {
            name: "Score".to_owned(),
        }])
        .expect_err("already gone");
        assert_eq!(err, OpError::NodeMissing { name: "Score".to_owned() });
    }

    #[test]
    fn update_node_replaces_parameters_wholesale() {
        let mut lite = fixture_lite();
        let mut raw = fixture_raw();

        apply_operations(&mut lite, &mut raw, &[NodeOperation::UpdateNode {
            name: "Score".to_owned(),
            parameters: Some(json!({"jsCode": "return [];"})),
            type_version: None,
            notes: Some("rescored".to_owned()),
            credentials: None,
        }])
        .expect("update");

        let score = lite.nodes.iter().find(|node| node.name == "Score").expect("score");
        assert_eq!(score.parameters, Some(json!({"jsCode": "return [];"})));
        assert_eq!(score.notes.as_deref(), Some("rescored"));
    }

    #[test]
    fn connections_add_and_remove_with_matching() {
        let mut lite = fixture_lite();
        let mut raw = fixture_raw();

        apply_operations(&mut lite, &mut raw, &[NodeOperation::AddConnection {
            from: "Webhook".to_owned(),
            to: "Notify".to_owned(),
            kind: None,
            output_index: None,
            input_index: None,
        }])
        .expect("connect");
        assert_eq!(lite.connections.len(), 3);

        let err = apply_operations(&mut lite, &mut raw, &[NodeOperation::AddConnection {
            from: "Webhook".to_owned(),
            to: "Ghost".to_owned(),
            kind: None,
            output_index: None,
            input_index: None,
        }])
        .expect_err("unknown endpoint");
        assert_eq!(err, OpError::NodeMissing { name: "Ghost".to_owned() });

        apply_operations(&mut lite, &mut raw, &[NodeOperation::RemoveConnection {
            from: "Webhook".to_owned(),
            to: "Notify".to_owned(),
            kind: None,
            output_index: None,
        }])
        .expect("disconnect");
        assert_eq!(lite.connections.len(), 2);

        let err = apply_operations(&mut lite, &mut raw, &[NodeOperation::RemoveConnection {
            from: "Webhook".to_owned(),
            to: "Notify".to_owned(),
            kind: None,
            output_index: None,
        }])
        .expect_err("nothing left to remove");
        assert!(matches!(err, OpError::ConnectionMissing { .. }));
    }

    #[test]
    fn enable_disable_toggles_the_flag() {
        let mut lite = fixture_lite();
        let mut raw = fixture_raw();

        apply_operations(&mut lite, &mut raw, &[NodeOperation::SetNodeEnabled {
            name: "Score".to_owned(),
            enabled: false,
        }])
        .expect("disable");
        let score = lite.nodes.iter().find(|node| node.name == "Score").expect("score");
        assert_eq!(score.disabled, Some(true));

        apply_operations(&mut lite, &mut raw, &[NodeOperation::SetNodeEnabled {
            name: "Score".to_owned(),
            enabled: true,
        }])
        .expect("enable");
        let score = lite.nodes.iter().find(|node| node.name == "Score").expect("score");
        assert_eq!(score.disabled, None);
    }

    #[test]
    fn rename_rewrites_lite_and_raw_copies() {
        let mut lite = fixture_lite();
        let mut raw = fixture_raw();

        apply_operations(&mut lite, &mut raw, &[NodeOperation::RenameNode {
            from: "Score".to_owned(),
            to: "Qualify".to_owned(),
        }])
        .expect("rename");

        assert!(lite.nodes.iter().any(|node| node.name == "Qualify"));
        assert!(lite
            .connections
            .iter()
            .any(|conn| conn.from == "Qualify" || conn.to == "Qualify"));
        assert!(lite.connections.iter().all(|conn| conn.from != "Score" && conn.to != "Score"));

        // The raw lookup copy follows, so credentials and positions resolve
        // under the new name on reconstruction.
        assert!(raw.node("Qualify").is_some());
        assert!(raw.node("Score").is_none());
        assert!(raw.connections.contains_key("Qualify"));
        let webhook_targets = &raw.connections["Webhook"]["main"][0];
        assert!(webhook_targets.iter().any(|target| target.node == "Qualify"));

        let err = apply_operations(&mut lite, &mut raw, &[NodeOperation::RenameNode {
            from: "Webhook".to_owned(),
            to: "Qualify".to_owned(),
        }])
        .expect_err("target name taken");
        assert_eq!(err, OpError::NodeExists { name: "Qualify".to_owned() });
    }

    #[test]
    fn operations_deserialize_from_wire_shape() {
        let op: NodeOperation = serde_json::from_value(json!({
            "type": "add_connection",
            "from": "A",
            "to": "B",
            "outputIndex": 1
        }))
        .expect("op");
        assert!(matches!(op, NodeOperation::AddConnection { output_index: Some(1), .. }));

        let op: NodeOperation = serde_json::from_value(json!({
            "type": "rename_node", "from": "Old", "to": "New"
        }))
        .expect("op");
        assert!(matches!(op, NodeOperation::RenameNode { .. }));
    }
}

mod placement {
    use super::*;

    fn original_names(raw: &Workflow) -> BTreeSet<String> {
        raw.nodes.iter().map(|node| node.name.clone()).collect()
    }

    #[test]
    fn new_nodes_land_right_of_the_frontier() {
        let mut raw = fixture_raw();
        for (index, node) in raw.nodes.iter_mut().enumerate() {
            node.position = [250.0 * (index as f64 + 1.0), 300.0];
        }
        let known = original_names(&raw);

        raw.nodes.push(crate::model::Node::new("Fresh", "n8n-nodes-base.set"));
        raw.connections
            .entry("Notify".to_owned())
            .or_default()
            .entry("main".to_owned())
            .or_default()
            .push(vec![crate::model::ConnectionTarget {
                node: "Fresh".to_owned(),
                kind: "main".to_owned(),
                index: 0,
            }]);

        place_new_nodes(&mut raw, &known, &BTreeMap::new());

        let fresh = raw.node("Fresh").expect("fresh node");
        assert_eq!(fresh.position, [1000.0, 300.0]);
    }

    #[test]
    fn explicit_placements_win_and_originals_stay_put() {
        let mut raw = fixture_raw();
        let known = original_names(&raw);
        let anchored = raw.nodes[0].position;

        raw.nodes.push(crate::model::Node::new("Pinned", "n8n-nodes-base.set"));

        let mut placements = BTreeMap::new();
        placements.insert("Pinned".to_owned(), [123.0, 456.0]);
        place_new_nodes(&mut raw, &known, &placements);

        assert_eq!(raw.node("Pinned").expect("pinned").position, [123.0, 456.0]);
        assert_eq!(raw.nodes[0].position, anchored);
    }
}

mod summaries {
    use super::*;

    #[test]
    fn run_summaries_report_items_and_errors() {
        let execution: Execution = serde_json::from_value(json!({
            "id": 9,
            "status": "error",
            "finished": true,
            "data": {"resultData": {"runData": {
                "Fetch": [{"data": {"main": [[{"json": {"a": 1}}, {"json": {"a": 2}}]]}}],
                "Parse": [{"error": {"message": "boom"}}]
            }}}
        }))
        .expect("execution");

        let mut summaries = run_summaries(&execution);
        summaries.sort_by(|a, b| a.node.cmp(&b.node));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].node, "Fetch");
        assert_eq!(summaries[0].status, "success");
        assert_eq!(summaries[0].items, 2);
        assert_eq!(summaries[1].status, "error");
        assert_eq!(summaries[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn workflow_summary_counts_nodes_and_tags() {
        let workflow: Workflow = serde_json::from_value(json!({
            "id": "w7",
            "name": "Tagged",
            "active": true,
            "nodes": [{"name": "A", "type": "n8n-nodes-base.noOp"}],
            "connections": {},
            "tags": [{"id": "t", "name": "ops"}]
        }))
        .expect("workflow");

        let summary = workflow_summary(&workflow);
        assert_eq!(summary.nodes, 1);
        assert_eq!(summary.tags, vec!["ops"]);
        assert!(summary.active);
    }
}

mod responses {
    use super::*;

    #[test]
    fn pending_and_blocked_serialize_distinctly() {
        let pending = MutationResponse::Pending(PendingApproval {
            pending: true,
            approve_token: "ap-1-x".to_owned(),
            summary: "delete workflow w1".to_owned(),
        });
        let value = serde_json::to_value(&pending).expect("value");
        assert_eq!(value["pending"], json!(true));
        assert_eq!(value["approveToken"], json!("ap-1-x"));

        let report = run_preflight(
            &[{
                let mut node = lite_node("Bad", "httpRequest");
                node.parameters = Some(json!({"url": "{{$json.u}}"}));
                node
            }],
            &[],
            &Catalog::load(),
        );
        let blocked = blocked_response(report, Some("snap-1".to_owned()));
        let value = serde_json::to_value(&blocked.0).expect("value");
        assert_eq!(value["blocked"], json!(true));
        assert_eq!(value["snapshotId"], json!("snap-1"));
        assert!(value["errors"].as_array().is_some_and(|errors| !errors.is_empty()));
    }
}

mod gate_flow {
    use super::*;

    #[tokio::test]
    async fn approval_handshake_audits_both_phases() {
        let mcp = offline_mcp("handshake", true);

        let first = mcp
            .check_approval("delete_workflow", Some("w1"), "delete workflow w1", None)
            .await
            .expect("gate");
        let Some(Json(MutationResponse::Pending(pending))) = first else {
            panic!("expected pending response");
        };

        let second = mcp
            .check_approval(
                "delete_workflow",
                Some("w1"),
                "delete workflow w1",
                Some(&pending.approve_token),
            )
            .await
            .expect("gate");
        assert!(second.is_none(), "valid token proceeds");
        mcp.audit("delete_workflow", Some("w1"), "delete workflow w1", true, Some("deleted".to_owned()))
            .await;

        let audit_path = {
            let state = mcp.state.lock().await;
            state.store.audit_path()
        };
        let text = std::fs::read_to_string(audit_path).expect("audit log");
        let entries: Vec<AuditEntry> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("audit line"))
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].approved);
        assert!(entries[1].approved);
    }

    #[tokio::test]
    async fn stale_token_is_rejected() {
        let mcp = offline_mcp("stale", true);
        let result = mcp
            .check_approval("update_workflow", Some("w1"), "edit", Some("ap-0-nope"))
            .await;
        let Err(err) = result else {
            panic!("expected rejection for a stale token");
        };
        assert!(err.message.contains("unknown or expired"));
    }

    #[tokio::test]
    async fn disabled_gate_proceeds_without_pending() {
        let mcp = offline_mcp("disabled", false);
        let outcome = mcp
            .check_approval("update_workflow", Some("w1"), "edit", None)
            .await
            .expect("gate");
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn set_approval_mode_toggles_at_runtime() {
        let mcp = offline_mcp("toggle", false);
        let response = mcp
            .set_approval_mode(Parameters(SetApprovalModeParams { enabled: true }))
            .await
            .expect("toggle");
        assert!(response.0.enabled);
        assert_eq!(response.0.pending_operations, 0);
    }
}

mod snapshots_tool {
    use super::*;

    #[tokio::test]
    async fn list_snapshots_reads_the_store() {
        let mcp = offline_mcp("snapshots", false);
        {
            let state = mcp.state.lock().await;
            state
                .store
                .save_snapshot(
                    &json!({"id": "w1", "name": "Demo", "nodes": [], "connections": {}}),
                    SnapshotTrigger::PreUpdateWorkflow,
                    "before edit",
                )
                .expect("snapshot");
        }

        let response = mcp
            .list_snapshots(Parameters(ListSnapshotsParams { id: "w1".to_owned(), limit: None }))
            .await
            .expect("list");
        assert_eq!(response.0.snapshots.len(), 1);
        assert_eq!(response.0.snapshots[0].workflow_name, "Demo");
    }

    #[tokio::test]
    async fn snapshot_quiet_swallows_failures() {
        let mcp = offline_mcp("quiet", false);
        let id = mcp
            .snapshot_quiet(
                &json!({"id": "w1", "name": "Demo"}),
                SnapshotTrigger::Manual,
                "manual",
            )
            .await;
        assert!(id.is_some());
    }
}

mod info {
    use super::*;

    #[test]
    fn get_info_advertises_name_and_tools() {
        let mcp = offline_mcp("info", false);
        let info = mcp.get_info();

        assert_eq!(info.server_info.name, "proteus");
        let instructions = info.instructions.expect("instructions");
        for tool in [
            "list_workflows",
            "scan_workflow",
            "focus_workflow",
            "expand_focus",
            "update_nodes",
            "rollback_workflow",
            "search_nodes",
            "set_approval_mode",
        ] {
            assert!(instructions.contains(tool), "{tool} missing from instructions");
        }
    }
}

mod knowledge_tools {
    use super::*;

    #[tokio::test]
    async fn misses_point_at_the_search_tool() {
        let mcp = offline_mcp("knowledge", false);

        let result = mcp
            .get_node(Parameters(GetNodeParams { query: "nonexistent".to_owned() }))
            .await;
        let Err(err) = result else {
            panic!("expected unknown node to be rejected");
        };
        assert!(err.message.contains("search_nodes"));

        let result = mcp
            .get_pattern(Parameters(GetPatternParams { name: "nonexistent".to_owned() }))
            .await;
        let Err(err) = result else {
            panic!("expected unknown pattern to be rejected");
        };
        assert!(err.message.contains("search_patterns"));
    }

    #[tokio::test]
    async fn search_and_providers_round_trip() {
        let mcp = offline_mcp("search", false);

        let response = mcp
            .search_nodes(Parameters(SearchNodesParams {
                query: "webhook".to_owned(),
                mode: None,
                limit: Some(5),
                source: None,
            }))
            .await
            .expect("search");
        assert!(!response.0.results.is_empty());

        let providers = mcp.list_providers().await.expect("providers");
        assert!(providers
            .0
            .providers
            .iter()
            .any(|provider| provider.source == "core"));
    }
}
