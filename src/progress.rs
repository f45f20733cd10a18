// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Progress reporting for long-running operations
//!
//! The resolver and table providers publish updates on a broadcast channel;
//! the REPL subscribes and renders them on a spinner.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Create a spinner with consistent styling
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Progress update message
#[derive(Clone, Debug)]
pub enum ProgressUpdate {
    // === Connection phases ===
    /// Reading a kubeconfig
    Resolving { kubeconfig: String },
    /// Client configuration ready
    Resolved { context: String, elapsed_ms: u64 },

    // === Query phases ===
    StartingQuery { table: String },
    /// One list page (or a single get) came back
    PageFetched {
        table: String,
        page: u32,
        rows: usize,
    },
    QueryComplete {
        table: String,
        rows: usize,
        elapsed_ms: u64,
    },
}

impl ProgressUpdate {
    /// Short human readable description for a spinner
    pub fn message(&self) -> String {
        match self {
            ProgressUpdate::Resolving { kubeconfig } => format!("Reading {}...", kubeconfig),
            ProgressUpdate::Resolved {
                context,
                elapsed_ms,
            } => format!("Using context {} ({}ms)", context, elapsed_ms),
            ProgressUpdate::StartingQuery { table } => format!("Querying {}...", table),
            ProgressUpdate::PageFetched { table, page, rows } => {
                format!("{}: page {} ({} rows so far)", table, page, rows)
            }
            ProgressUpdate::QueryComplete {
                table,
                rows,
                elapsed_ms,
            } => format!("{}: {} rows in {}ms", table, rows, elapsed_ms),
        }
    }
}

/// Global progress reporter
pub struct ProgressReporter {
    sender: broadcast::Sender<ProgressUpdate>,
    /// Pages fetched for the current query
    pages: AtomicUsize,
    /// Rows fetched for the current query
    rows: AtomicUsize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sender,
            pages: AtomicUsize::new(0),
            rows: AtomicUsize::new(0),
        }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sender.subscribe()
    }

    pub fn resolving(&self, kubeconfig: &str) {
        let _ = self.sender.send(ProgressUpdate::Resolving {
            kubeconfig: kubeconfig.to_string(),
        });
    }

    pub fn resolved(&self, context: &str, elapsed_ms: u64) {
        let _ = self.sender.send(ProgressUpdate::Resolved {
            context: context.to_string(),
            elapsed_ms,
        });
    }

    /// Report query start, resetting the counters
    pub fn start_query(&self, table: &str) {
        self.pages.store(0, Ordering::SeqCst);
        self.rows.store(0, Ordering::SeqCst);
        let _ = self.sender.send(ProgressUpdate::StartingQuery {
            table: table.to_string(),
        });
    }

    pub fn page_fetched(&self, table: &str, rows: usize) {
        let page = self.pages.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.rows.fetch_add(rows, Ordering::SeqCst) + rows;
        let _ = self.sender.send(ProgressUpdate::PageFetched {
            table: table.to_string(),
            page: u32::try_from(page).unwrap_or(u32::MAX),
            rows: total,
        });
    }

    pub fn query_complete(&self, table: &str, rows: usize, elapsed_ms: u64) {
        let _ = self.sender.send(ProgressUpdate::QueryComplete {
            table: table.to_string(),
            rows,
            elapsed_ms,
        });
    }

    /// Get current progress (pages, rows)
    pub fn progress(&self) -> (usize, usize) {
        (
            self.pages.load(Ordering::SeqCst),
            self.rows.load(Ordering::SeqCst),
        )
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle to progress reporter
pub type ProgressHandle = Arc<ProgressReporter>;

/// Create a new progress reporter handle
pub fn create_progress_handle() -> ProgressHandle {
    Arc::new(ProgressReporter::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter_new() {
        let reporter = ProgressReporter::new();
        assert_eq!(reporter.progress(), (0, 0));
    }

    #[test]
    fn test_page_fetched_accumulates() {
        let reporter = ProgressReporter::new();
        reporter.start_query("openshift_route");

        reporter.page_fetched("openshift_route", 500);
        assert_eq!(reporter.progress(), (1, 500));

        reporter.page_fetched("openshift_route", 37);
        assert_eq!(reporter.progress(), (2, 537));
    }

    #[test]
    fn test_start_query_resets_counters() {
        let reporter = ProgressReporter::new();
        reporter.start_query("openshift_build");
        reporter.page_fetched("openshift_build", 10);

        reporter.start_query("openshift_project");
        assert_eq!(reporter.progress(), (0, 0));
    }

    #[test]
    fn test_subscribe_receives_updates_in_order() {
        let reporter = ProgressReporter::new();
        let mut receiver = reporter.subscribe();

        reporter.resolving("/home/dev/.kube/config");
        reporter.resolved("openshift-prod", 3);
        reporter.start_query("openshift_route");
        reporter.page_fetched("openshift_route", 2);
        reporter.query_complete("openshift_route", 2, 40);

        let updates: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();
        assert_eq!(updates.len(), 5);
        assert!(matches!(updates[0], ProgressUpdate::Resolving { .. }));
        assert!(matches!(updates[1], ProgressUpdate::Resolved { .. }));
        assert!(matches!(updates[2], ProgressUpdate::StartingQuery { .. }));
        assert!(matches!(
            updates[3],
            ProgressUpdate::PageFetched { page: 1, rows: 2, .. }
        ));
        assert!(matches!(updates[4], ProgressUpdate::QueryComplete { .. }));
    }

    #[test]
    fn test_send_without_subscribers_is_harmless() {
        let reporter = ProgressReporter::new();
        reporter.start_query("openshift_user");
        reporter.query_complete("openshift_user", 0, 1);
    }

    #[test]
    fn test_update_message() {
        let update = ProgressUpdate::QueryComplete {
            table: "openshift_route".to_string(),
            rows: 12,
            elapsed_ms: 80,
        };
        assert_eq!(update.message(), "openshift_route: 12 rows in 80ms");
    }
}
