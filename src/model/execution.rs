// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Engine execution records.
//!
//! Only the envelope is typed; the per-node run data is navigated as raw JSON by
//! the ghost-payload extractor, since its shape varies per node type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub finished: bool,
    #[serde(rename = "workflowId", default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(rename = "startedAt", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "stoppedAt", default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Present only when requested with include-data; holds `resultData.runData`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Execution {
    /// The `resultData.runData` map, when execution data was included.
    pub fn run_data(&self) -> Option<&Value> {
        self.data.as_ref()?.get("resultData")?.get("runData")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionList {
    pub data: Vec<Execution>,
    #[serde(rename = "nextCursor", default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_data_navigates_result_envelope() {
        let execution: Execution = serde_json::from_value(serde_json::json!({
            "id": 42,
            "status": "success",
            "finished": true,
            "data": {"resultData": {"runData": {"Webhook": []}}}
        }))
        .expect("execution");

        let run_data = execution.run_data().expect("run data");
        assert!(run_data.get("Webhook").is_some());
    }

    #[test]
    fn run_data_absent_without_data() {
        let execution: Execution =
            serde_json::from_value(serde_json::json!({"id": "7"})).expect("execution");
        assert!(execution.run_data().is_none());
    }
}
