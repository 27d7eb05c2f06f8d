// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Snapshot store and audit log.
//!
//! One directory per workflow under the store root, a JSON file per snapshot,
//! and an `_index.json` of metadata in newest-first order, pruned to the twenty
//! most recent. The audit log is a sibling append-only JSONL file.
//!
//! Layout:
//! ```text
//! <root>/
//!   <workflowId>/
//!     _index.json
//!     <snapshotId>.json
//!   audit.log
//! ```

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const INDEX_FILENAME: &str = "_index.json";
const AUDIT_FILENAME: &str = "audit.log";
const MAX_SNAPSHOTS_PER_WORKFLOW: usize = 20;

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotTrigger {
    PreCreate,
    PreUpdateWorkflow,
    PreUpdateNodes,
    PreDelete,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub timestamp: DateTime<Utc>,
    pub trigger: SnapshotTrigger,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    /// The full raw workflow JSON as captured.
    pub workflow: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub summary: String,
    pub approved: bool,
    pub result: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

/// Workflow ids come from the engine and are not trusted as path segments.
fn encode_path_segment(segment: &str) -> String {
    let safe = segment
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
    if safe && !segment.is_empty() {
        return segment.to_owned();
    }

    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(1 + segment.len() * 2);
    out.push('~');
    for &byte in segment.as_bytes() {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default root, relative to the running executable.
    ///
    /// The process launch directory is deliberately not used: on several hosts
    /// it is read-only, and a store that cannot write loses every snapshot.
    pub fn default_root() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(std::env::temp_dir)
            .join("proteus-state")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workflow_dir(&self, workflow_id: &str) -> PathBuf {
        self.root.join(encode_path_segment(workflow_id))
    }

    fn index_path(&self, workflow_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id).join(INDEX_FILENAME)
    }

    fn snapshot_path(&self, workflow_id: &str, snapshot_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id)
            .join(format!("{}.json", encode_path_segment(snapshot_id)))
    }

    pub fn audit_path(&self) -> PathBuf {
        self.root.join(AUDIT_FILENAME)
    }

    fn load_index(&self, workflow_id: &str) -> Result<Vec<SnapshotMeta>, StoreError> {
        let index_path = self.index_path(workflow_id);
        let text = match fs::read_to_string(&index_path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: index_path, source }),
        };
        serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: index_path,
            source,
        })
    }

    fn save_index(&self, workflow_id: &str, index: &[SnapshotMeta]) -> Result<(), StoreError> {
        let index_path = self.index_path(workflow_id);
        let text = serde_json::to_string_pretty(index).map_err(|source| StoreError::Json {
            path: index_path.clone(),
            source,
        })?;
        write_atomic(&index_path, format!("{text}\n").as_bytes())
    }

    /// Captures the raw workflow JSON before a mutation.
    ///
    /// Writes the snapshot file, prepends its metadata to the index, then
    /// prunes index and files down to the twenty newest.
    pub fn save_snapshot(
        &self,
        workflow: &Value,
        trigger: SnapshotTrigger,
        description: &str,
    ) -> Result<SnapshotMeta, StoreError> {
        let workflow_id = workflow
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("unsaved")
            .to_owned();
        let workflow_name = workflow
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_owned();

        let timestamp = Utc::now();
        let id = format!(
            "snap-{:013}-{}",
            timestamp.timestamp_millis().max(0),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );

        let snapshot_path = self.snapshot_path(&workflow_id, &id);
        let body = serde_json::to_string_pretty(workflow).map_err(|source| StoreError::Json {
            path: snapshot_path.clone(),
            source,
        })?;
        write_atomic(&snapshot_path, format!("{body}\n").as_bytes())?;

        let meta = SnapshotMeta {
            id,
            workflow_id: workflow_id.clone(),
            workflow_name,
            timestamp,
            trigger,
            description: description.to_owned(),
        };

        let mut index = self.load_index(&workflow_id)?;
        index.insert(0, meta.clone());

        while index.len() > MAX_SNAPSHOTS_PER_WORKFLOW {
            let dropped = index.pop().expect("index longer than cap");
            let dropped_path = self.snapshot_path(&workflow_id, &dropped.id);
            match fs::remove_file(&dropped_path) {
                Ok(()) => {}
                Err(source) if source.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path: dropped_path, source }),
            }
        }

        self.save_index(&workflow_id, &index)?;
        Ok(meta)
    }

    /// Metadata only, newest first.
    pub fn list_snapshots(
        &self,
        workflow_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SnapshotMeta>, StoreError> {
        let mut index = self.load_index(workflow_id)?;
        if let Some(limit) = limit {
            index.truncate(limit);
        }
        Ok(index)
    }

    /// Metadata plus the stored raw JSON, or `None` when unknown.
    pub fn get_snapshot(
        &self,
        workflow_id: &str,
        snapshot_id: &str,
    ) -> Result<Option<Snapshot>, StoreError> {
        let index = self.load_index(workflow_id)?;
        let Some(meta) = index.into_iter().find(|meta| meta.id == snapshot_id) else {
            return Ok(None);
        };

        let snapshot_path = self.snapshot_path(workflow_id, snapshot_id);
        let text = match fs::read_to_string(&snapshot_path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: snapshot_path, source }),
        };
        let workflow = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: snapshot_path,
            source,
        })?;

        Ok(Some(Snapshot { meta, workflow }))
    }

    /// Appends one JSON line to the audit log.
    ///
    /// Callers swallow the error: an unwritable audit log must never block a
    /// mutation.
    pub fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let audit_path = self.audit_path();
        let line = serde_json::to_string(entry).map_err(|source| StoreError::Json {
            path: audit_path.clone(),
            source,
        })?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&audit_path)
            .map_err(|source| StoreError::Io { path: audit_path.clone(), source })?;
        file.write_all(format!("{line}\n").as_bytes())
            .map_err(|source| StoreError::Io { path: audit_path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store(test_name: &str) -> SnapshotStore {
        use std::time::{SystemTime, UNIX_EPOCH};

        let mut dir = std::env::temp_dir();
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock is monotonic")
            .as_nanos();
        dir.push(format!("proteus-{test_name}-{pid}-{nanos}"));
        SnapshotStore::new(dir)
    }

    fn workflow(id: &str, marker: u64) -> Value {
        json!({"id": id, "name": "Demo", "nodes": [], "connections": {}, "marker": marker})
    }

    #[test]
    fn save_then_list_then_get_round_trips() {
        let store = temp_store("roundtrip");
        let meta = store
            .save_snapshot(&workflow("w1", 1), SnapshotTrigger::PreUpdateWorkflow, "before edit")
            .expect("save");

        let listed = store.list_snapshots("w1", None).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], meta);

        let snapshot = store
            .get_snapshot("w1", &meta.id)
            .expect("get")
            .expect("present");
        assert_eq!(snapshot.workflow["marker"], json!(1));

        assert!(store.get_snapshot("w1", "snap-nope").expect("get").is_none());
        assert!(store.list_snapshots("unknown", None).expect("list").is_empty());
    }

    #[test]
    fn prunes_to_twenty_dropping_the_oldest() {
        let store = temp_store("prune");
        let mut first_id = None;
        for marker in 0..21u64 {
            let meta = store
                .save_snapshot(&workflow("w1", marker), SnapshotTrigger::PreUpdateNodes, "edit")
                .expect("save");
            if marker == 0 {
                first_id = Some(meta.id);
            }
        }

        let listed = store.list_snapshots("w1", None).expect("list");
        assert_eq!(listed.len(), 20);

        let first_id = first_id.expect("captured first id");
        assert!(listed.iter().all(|meta| meta.id != first_id));
        assert!(store.get_snapshot("w1", &first_id).expect("get").is_none());

        // Newest first.
        let newest = store
            .get_snapshot("w1", &listed[0].id)
            .expect("get")
            .expect("present");
        assert_eq!(newest.workflow["marker"], json!(20));
    }

    #[test]
    fn limit_truncates_listing() {
        let store = temp_store("limit");
        for marker in 0..5u64 {
            store
                .save_snapshot(&workflow("w1", marker), SnapshotTrigger::Manual, "m")
                .expect("save");
        }
        assert_eq!(store.list_snapshots("w1", Some(2)).expect("list").len(), 2);
    }

    #[test]
    fn hostile_workflow_ids_are_encoded() {
        let store = temp_store("encode");
        let meta = store
            .save_snapshot(&workflow("../evil", 1), SnapshotTrigger::PreDelete, "d")
            .expect("save");
        assert_eq!(meta.workflow_id, "../evil");

        let listed = store.list_snapshots("../evil", None).expect("list");
        assert_eq!(listed.len(), 1);
        // Nothing escaped the store root.
        assert!(store.root().join("..").join("evil").metadata().is_err()
            || !store.root().join("..").join("evil").join(INDEX_FILENAME).exists());
    }

    #[test]
    fn audit_appends_one_line_per_entry() {
        let store = temp_store("audit");
        for approved in [true, false] {
            store
                .append_audit(&AuditEntry {
                    timestamp: Utc::now(),
                    tool: "update_workflow".to_owned(),
                    workflow_id: Some("w1".to_owned()),
                    summary: "edit".to_owned(),
                    approved,
                    result: approved.then(|| "ok".to_owned()),
                })
                .expect("append");
        }

        let text = fs::read_to_string(store.audit_path()).expect("read audit");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let entry: AuditEntry = serde_json::from_str(line).expect("valid json line");
            assert_eq!(entry.tool, "update_workflow");
        }
    }
}
