// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Two-phase commit gate for mutating tools.
//!
//! Tokens live only in process memory: a restart drops every pending operation,
//! which doubles as a safety valve. Expired tokens are purged lazily whenever a
//! new one is minted.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

const TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub token: String,
    pub tool: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Execute now (gate off, or a valid token was presented).
    Proceed,
    /// Gate on and no token given: the caller must confirm with this token.
    Pending { token: String },
    /// The presented token is unknown or expired.
    Rejected { reason: String },
}

#[derive(Debug, Default)]
pub struct ApprovalGate {
    enabled: bool,
    pending: BTreeMap<String, PendingOperation>,
}

impl ApprovalGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, pending: BTreeMap::new() }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// First call records a pending operation; the second call with the minted
    /// token consumes it.
    pub fn check(&mut self, tool: &str, summary: &str, approve: Option<&str>) -> ApprovalDecision {
        self.check_at(Utc::now(), tool, summary, approve)
    }

    fn check_at(
        &mut self,
        now: DateTime<Utc>,
        tool: &str,
        summary: &str,
        approve: Option<&str>,
    ) -> ApprovalDecision {
        if !self.enabled {
            return ApprovalDecision::Proceed;
        }

        self.purge_expired(now);

        if let Some(token) = approve {
            return match self.pending.remove(token) {
                Some(_) => ApprovalDecision::Proceed,
                None => ApprovalDecision::Rejected {
                    reason: "approve token is unknown or expired; request the mutation again"
                        .to_owned(),
                },
            };
        }

        // Time-sortable prefix, random tail.
        let token = format!(
            "ap-{:013}-{}",
            now.timestamp_millis().max(0),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        self.pending.insert(
            token.clone(),
            PendingOperation {
                token: token.clone(),
                tool: tool.to_owned(),
                summary: summary.to_owned(),
                created_at: now,
            },
        );
        ApprovalDecision::Pending { token }
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) {
        let ttl = Duration::minutes(TOKEN_TTL_MINUTES);
        self.pending
            .retain(|_, operation| now - operation.created_at < ttl);
    }
}
