// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for client resolution and API access

use std::path::PathBuf;
use std::sync::Arc;

use kube::config::KubeconfigError;

/// Failure while turning connection configuration into a client handle
///
/// Cloneable so a memoized failure can be handed to every waiting caller.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ResolveError {
    #[error("could not determine home directory to expand '{path}'")]
    HomeDirUnavailable { path: String },

    #[error("failed to read kubeconfig '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: Arc<KubeconfigError>,
    },

    #[error(
        "openshift cluster details are unavailable in: {} (current context: {})",
        path.display(),
        current_context.as_deref().unwrap_or("<none>")
    )]
    NoClusterConfig {
        path: PathBuf,
        current_context: Option<String>,
    },

    #[error("failed to build client for context '{context}': {source}")]
    ClientBuild {
        context: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors surfaced to a query
#[derive(thiserror::Error, Debug)]
pub enum OpenShiftError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{table}: API request failed: {source}")]
    Api {
        table: &'static str,
        #[source]
        source: kube::Error,
    },
}

impl OpenShiftError {
    pub fn api(table: &'static str, source: kube::Error) -> Self {
        Self::Api { table, source }
    }
}
