// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::sync;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables owned by a single synchronizer instance
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Restrict the collection to one namespace, `None` watches all namespaces
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
    /// Period of forced full re-lists, `Duration::ZERO` disables them
    pub resync_period: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Attempts for a full list before the failure is reported
    pub max_list_attempts: u32,
    pub watch_timeout_secs: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            label_selector: None,
            field_selector: None,
            resync_period: Duration::from_secs(sync::RESYNC_PERIOD_SECS),
            initial_backoff: Duration::from_millis(sync::INITIAL_BACKOFF_MILLIS),
            max_backoff: Duration::from_secs(sync::MAX_BACKOFF_SECS),
            max_list_attempts: sync::MAX_LIST_ATTEMPTS,
            watch_timeout_secs: sync::WATCH_TIMEOUT_SECS,
        }
    }
}

/// Launcher configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to a kubeconfig, when unset the in-cluster configuration is used
    pub kubeconfig: Option<PathBuf>,
    /// Namespace and name of the object fetched with a single GET
    pub example_namespace: String,
    pub example_name: String,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let resync_period = match non_empty("RESYNC_PERIOD_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .with_context(|| format!("RESYNC_PERIOD_SECS is not a number: {}", v))?,
            ),
            None => Duration::from_secs(sync::RESYNC_PERIOD_SECS),
        };

        Ok(Config {
            kubeconfig: non_empty("KUBECONFIG").map(PathBuf::from),
            example_namespace: non_empty("EXAMPLE_NAMESPACE")
                .unwrap_or_else(|| "default".to_string()),
            example_name: non_empty("EXAMPLE_NAME").unwrap_or_else(|| "example1".to_string()),
            sync: SyncConfig {
                namespace: non_empty("WATCH_NAMESPACE"),
                label_selector: non_empty("LABEL_SELECTOR"),
                field_selector: non_empty("FIELD_SELECTOR"),
                resync_period,
                ..SyncConfig::default()
            },
        })
    }
}
