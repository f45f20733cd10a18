// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration persistence for ocsql
//!
//! All ocsql data is stored under ~/.ocsql/:
//! - ~/.ocsql/config.json - connection settings and error policy
//! - ~/.ocsql/log/ - rolling log files
//! - ~/.ocsql/history - REPL command history

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::openshift::DEFAULT_ALLOWED_CONTEXT;
use crate::openshift::policy::ErrorPolicyConfig;

/// Get the base ocsql directory (~/.ocsql/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".ocsql"))
        .context("Could not determine home directory")
}

fn default_allowed_contexts() -> Vec<String> {
    vec![DEFAULT_ALLOWED_CONTEXT.to_string()]
}

/// How to reach the cluster
///
/// Immutable once loaded; doubles as the memoization key for resolved clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Path to a kubeconfig file (falls back to KUBE_CONFIG, KUBERNETES_MASTER, ~/.kube/config)
    #[serde(default)]
    pub config_path: Option<String>,
    /// Context to use instead of the kubeconfig's current-context
    #[serde(default)]
    pub config_context: Option<String>,
    /// Glob patterns a current-context must match when no override is given
    #[serde(default = "default_allowed_contexts")]
    pub allowed_contexts: Vec<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            config_context: None,
            allowed_contexts: default_allowed_contexts(),
        }
    }
}

impl ConnectionConfig {
    /// Apply command-line overrides on top of the stored values
    pub fn with_overrides(mut self, config_path: Option<&str>, context: Option<&str>) -> Self {
        if let Some(path) = config_path {
            self.config_path = Some(path.to_string());
        }
        if let Some(ctx) = context {
            self.config_context = Some(ctx.to_string());
        }
        self
    }
}

/// ocsql configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub errors: ErrorPolicyConfig,
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Get the config file path (~/.ocsql/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }
}
