// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Environment configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::store::SnapshotStore;

pub const ENV_HOST: &str = "N8N_HOST";
pub const ENV_API_KEY: &str = "N8N_API_KEY";
pub const ENV_TIMEOUT_MS: &str = "PROTEUS_TIMEOUT_MS";
pub const ENV_STATE_DIR: &str = "PROTEUS_STATE_DIR";
pub const ENV_REQUIRE_APPROVAL: &str = "PROTEUS_REQUIRE_APPROVAL";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Engine base URL; `/api/v1` is appended per call.
    pub host: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Root for snapshots and the audit log.
    pub state_dir: PathBuf,
    /// Initial state of the approval gate.
    pub require_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVariable { name: &'static str },
    InvalidTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { name } => {
                write!(f, "required environment variable {name} is not set")
            }
            Self::InvalidTimeout { value } => {
                write!(f, "{ENV_TIMEOUT_MS} must be a positive integer, got {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(ENV_HOST)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVariable { name: ENV_HOST })?;
        let api_key = lookup(ENV_API_KEY)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVariable { name: ENV_API_KEY })?;

        let timeout = match lookup(ENV_TIMEOUT_MS) {
            Some(raw) => {
                let millis: u64 = raw
                    .parse()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .ok_or(ConfigError::InvalidTimeout { value: raw })?;
                Duration::from_millis(millis)
            }
            None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        let state_dir = lookup(ENV_STATE_DIR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(SnapshotStore::default_root);

        let require_approval = lookup(ENV_REQUIRE_APPROVAL)
            .map(|value| value == "true" || value == "1")
            .unwrap_or(false);

        Ok(Self { host, api_key, timeout, state_dir, require_approval })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn minimal_environment_uses_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_HOST, "http://engine.local"),
            (ENV_API_KEY, "key"),
        ]))
        .expect("config");

        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert!(!config.require_approval);
    }

    #[test]
    fn missing_host_is_named() {
        let err = Config::from_lookup(lookup_from(&[(ENV_API_KEY, "key")]))
            .expect_err("missing host");
        assert_eq!(err, ConfigError::MissingVariable { name: ENV_HOST });
    }

    #[test]
    fn timeout_and_approval_parse() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_HOST, "http://engine.local"),
            (ENV_API_KEY, "key"),
            (ENV_TIMEOUT_MS, "5000"),
            (ENV_REQUIRE_APPROVAL, "1"),
            (ENV_STATE_DIR, "/var/lib/proteus"),
        ]))
        .expect("config");

        assert_eq!(config.timeout, Duration::from_millis(5_000));
        assert!(config.require_approval);
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/proteus"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            (ENV_HOST, "h"),
            (ENV_API_KEY, "k"),
            (ENV_TIMEOUT_MS, "soon"),
        ]))
        .expect_err("bad timeout");
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
    }

    #[test]
    fn approval_accepts_true_and_one_only() {
        for (value, expected) in [("true", true), ("1", true), ("yes", false), ("0", false)] {
            let config = Config::from_lookup(lookup_from(&[
                (ENV_HOST, "h"),
                (ENV_API_KEY, "k"),
                (ENV_REQUIRE_APPROVAL, value),
            ]))
            .expect("config");
            assert_eq!(config.require_approval, expected, "{value}");
        }
    }
}
