// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Typed client for the engine's REST API.
//!
//! Thin by design: per-call timeout, API-key header, status/body error mapping,
//! and no retries. Retry policy, when appropriate, belongs to callers.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::model::{ExecutionList, Workflow, WorkflowList};

const API_PREFIX: &str = "/api/v1";
const API_KEY_HEADER: &str = "X-N8N-API-KEY";

#[derive(Debug)]
pub enum ApiError {
    /// Non-2xx response from the engine.
    Http { status: u16, body: String },
    Timeout { url: String },
    Transport { source: reqwest::Error },
    Decode { source: reqwest::Error },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, body } => write!(f, "engine returned {status}: {body}"),
            Self::Timeout { url } => write!(f, "engine request timed out: {url}"),
            Self::Transport { source } => write!(f, "engine request failed: {source}"),
            Self::Decode { source } => write!(f, "cannot decode engine response: {source}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http { .. } | Self::Timeout { .. } => None,
            Self::Transport { source } | Self::Decode { source } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl EngineClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            timeout,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    async fn send(&self, builder: reqwest::RequestBuilder, url: &str) -> Result<Value, ApiError> {
        let response = builder
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    ApiError::Timeout { url: url.to_owned() }
                } else {
                    ApiError::Transport { source }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Decode { source })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|_| ApiError::Http {
            status: status.as_u16(),
            body: format!("non-JSON response body: {}", truncate(&body, 200)),
        })
    }

    /// GET /workflows with cursor pagination and filters. Tag names are sent
    /// as one comma-separated query value, the shape the engine expects.
    pub async fn list_workflows(
        &self,
        limit: Option<u32>,
        cursor: Option<&str>,
        active: Option<bool>,
        tags: Option<&[String]>,
    ) -> Result<WorkflowList, ApiError> {
        let url = self.api_url("/workflows");
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_owned()));
        }
        if let Some(active) = active {
            query.push(("active", active.to_string()));
        }
        if let Some(tags) = tags.filter(|tags| !tags.is_empty()) {
            query.push(("tags", tags.join(",")));
        }

        let value = self.send(self.http.get(&url).query(&query), &url).await?;
        decode(value)
    }

    /// GET /workflows/{id}, returned as raw JSON for the codec to parse.
    pub async fn get_workflow(&self, id: &str) -> Result<Value, ApiError> {
        let url = self.api_url(&format!("/workflows/{id}"));
        self.send(self.http.get(&url), &url).await
    }

    /// POST /workflows; the engine mints the identity.
    pub async fn create_workflow(&self, workflow: &Workflow) -> Result<Value, ApiError> {
        let url = self.api_url("/workflows");
        let body = write_payload(workflow);
        self.send(self.http.post(&url).json(&body), &url).await
    }

    /// PUT /workflows/{id}: full replacement.
    pub async fn update_workflow(&self, id: &str, workflow: &Workflow) -> Result<Value, ApiError> {
        let url = self.api_url(&format!("/workflows/{id}"));
        let body = write_payload(workflow);
        self.send(self.http.put(&url).json(&body), &url).await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<Value, ApiError> {
        let url = self.api_url(&format!("/workflows/{id}"));
        self.send(self.http.delete(&url), &url).await
    }

    pub async fn activate_workflow(&self, id: &str) -> Result<Value, ApiError> {
        let url = self.api_url(&format!("/workflows/{id}/activate"));
        self.send(self.http.post(&url), &url).await
    }

    pub async fn deactivate_workflow(&self, id: &str) -> Result<Value, ApiError> {
        let url = self.api_url(&format!("/workflows/{id}/deactivate"));
        self.send(self.http.post(&url), &url).await
    }

    /// GET /executions with optional workflow and status filters.
    pub async fn list_executions(
        &self,
        workflow_id: Option<&str>,
        status: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ExecutionList, ApiError> {
        let url = self.api_url("/executions");
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(workflow_id) = workflow_id {
            query.push(("workflowId", workflow_id.to_owned()));
        }
        if let Some(status) = status {
            query.push(("status", status.to_owned()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let value = self.send(self.http.get(&url).query(&query), &url).await?;
        decode(value)
    }

    /// GET /executions/{id}; include-data opts in per-node output.
    pub async fn get_execution(
        &self,
        id: &str,
        include_data: bool,
    ) -> Result<crate::model::Execution, ApiError> {
        let url = self.api_url(&format!("/executions/{id}"));
        let query = [("includeData", include_data.to_string())];
        let value = self.send(self.http.get(&url).query(&query), &url).await?;
        decode(value)
    }

    /// POST /webhook/{path} (production) or /webhook-test/{path}.
    pub async fn trigger_webhook(
        &self,
        path: &str,
        payload: Option<&Value>,
        test: bool,
    ) -> Result<Value, ApiError> {
        let prefix = if test { "/webhook-test" } else { "/webhook" };
        let url = format!(
            "{}{prefix}/{}",
            self.base_url,
            path.trim_start_matches('/')
        );

        let mut builder = self.http.post(&url);
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }
        self.send(builder, &url).await
    }
}

/// The engine's update surface accepts exactly name/nodes/connections/settings;
/// identity travels in the URL and read-side bloat is rejected on write.
fn write_payload(workflow: &Workflow) -> Value {
    serde_json::json!({
        "name": workflow.name,
        "nodes": workflow.nodes,
        "connections": workflow.connections,
        "settings": workflow.settings.clone().unwrap_or_else(|| serde_json::json!({})),
    })
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value.clone()).map_err(|source| ApiError::Http {
        status: 200,
        body: format!("unexpected response shape: {source}; body head: {}",
            truncate(&value.to_string(), 200)),
    })
}

fn truncate(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
