// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubeconfig resolution and client memoization
//!
//! Resolution order for the kubeconfig path:
//! 1. `config_path` from the connection config
//! 2. `KUBE_CONFIG` environment variable
//! 3. `KUBERNETES_MASTER` environment variable
//! 4. `~/.kube/config`
//!
//! A resolved client is cached per [`ConnectionConfig`] for the life of the
//! process. Concurrent first callers share one resolution; failures are cached
//! as well.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::context_policy::ContextPolicy;
use super::error::ResolveError;
use crate::config::ConnectionConfig;
use crate::progress::ProgressHandle;

/// Fallback kubeconfig location
pub const DEFAULT_KUBECONFIG: &str = "~/.kube/config";

/// Environment variables consulted, in order, when no path is configured
pub const KUBECONFIG_ENV_VARS: &[&str] = &["KUBE_CONFIG", "KUBERNETES_MASTER"];

/// Timeout for connecting to the API server
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading API responses
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Pick the kubeconfig path from config, environment, or the default
pub fn kubeconfig_path<F>(config_path: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = config_path {
        return path.to_string();
    }
    KUBECONFIG_ENV_VARS
        .iter()
        .filter_map(|var| env(var))
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_KUBECONFIG.to_string())
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str, home: Option<&Path>) -> Result<PathBuf, ResolveError> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(path)),
    };
    let home = home.ok_or_else(|| ResolveError::HomeDirUnavailable {
        path: path.to_string(),
    })?;
    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}

/// Resolved cluster endpoint and credentials
pub struct ResolvedClient {
    context: String,
    source: PathBuf,
    config: Config,
    client: OnceCell<Client>,
}

impl std::fmt::Debug for ResolvedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedClient")
            .field("context", &self.context)
            .field("source", &self.source)
            .field("cluster_url", &self.config.cluster_url)
            .finish()
    }
}

impl ResolvedClient {
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The API client, built on first use
    pub async fn client(&self) -> Result<Client, ResolveError> {
        self.client
            .get_or_try_init(|| async {
                Client::try_from(self.config.clone()).map_err(|e| ResolveError::ClientBuild {
                    context: self.context.clone(),
                    source: Arc::new(e),
                })
            })
            .await
            .cloned()
    }
}

type ResolveCell = Arc<OnceCell<Result<Arc<ResolvedClient>, ResolveError>>>;

/// Memoizing client resolver
pub struct ClientResolver {
    cells: Mutex<HashMap<ConnectionConfig, ResolveCell>>,
    resolutions: AtomicUsize,
    progress: Option<ProgressHandle>,
}

impl Default for ClientResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientResolver {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
            resolutions: AtomicUsize::new(0),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Number of resolutions actually executed (cache misses)
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    /// Resolve using the process environment and home directory
    pub async fn resolve(
        &self,
        connection: &ConnectionConfig,
    ) -> Result<Arc<ResolvedClient>, ResolveError> {
        self.resolve_with(connection, |var| std::env::var(var).ok(), dirs::home_dir())
            .await
    }

    /// Resolve with an explicit environment lookup and home directory
    pub async fn resolve_with<F>(
        &self,
        connection: &ConnectionConfig,
        env: F,
        home: Option<PathBuf>,
    ) -> Result<Arc<ResolvedClient>, ResolveError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cell = {
            let mut cells = self
                .cells
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(cells.entry(connection.clone()).or_default())
        };

        cell.get_or_init(|| async {
            let resolutions = self.resolutions.fetch_add(1, Ordering::SeqCst) + 1;
            let path = kubeconfig_path(connection.config_path.as_deref(), &env);
            debug!(kubeconfig = %path, resolutions, "Resolving cluster client");
            let result = resolve_uncached(connection, &path, home.as_deref(), self.progress.as_ref())
                .await
                .map(Arc::new);
            if let Err(ref e) = result {
                debug!(error = %e, resolutions = self.resolution_count(), "Client resolution failed");
            }
            result
        })
        .await
        .clone()
    }
}

async fn resolve_uncached(
    connection: &ConnectionConfig,
    path: &str,
    home: Option<&Path>,
    progress: Option<&ProgressHandle>,
) -> Result<ResolvedClient, ResolveError> {
    let start = Instant::now();
    let path = expand_home(path, home)?;
    if let Some(progress) = progress {
        progress.resolving(&path.display().to_string());
    }

    let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| ResolveError::ConfigRead {
        path: path.clone(),
        source: Arc::new(e),
    })?;

    let context = match connection.config_context {
        Some(ref ctx) => ctx.clone(),
        None => {
            let current = kubeconfig.current_context.clone();
            match current {
                Some(ref ctx) if ContextPolicy::new(&connection.allowed_contexts).allows(ctx) => {
                    ctx.clone()
                }
                _ => {
                    return Err(ResolveError::NoClusterConfig {
                        path,
                        current_context: current,
                    });
                }
            }
        }
    };

    let mut config = Config::from_custom_kubeconfig(
        kubeconfig,
        &KubeConfigOptions {
            context: Some(context.clone()),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| ResolveError::ClientBuild {
        context: context.clone(),
        source: Arc::new(e),
    })?;

    config.connect_timeout = Some(CONNECT_TIMEOUT);
    config.read_timeout = Some(READ_TIMEOUT);

    info!(
        context = %context,
        kubeconfig = %path.display(),
        cluster = %config.cluster_url,
        elapsed_ms = start.elapsed().as_millis(),
        "Resolved cluster client"
    );
    if let Some(progress) = progress {
        progress.resolved(&context, start.elapsed().as_millis() as u64);
    }

    Ok(ResolvedClient {
        context,
        source: path,
        config,
        client: OnceCell::new(),
    })
}
