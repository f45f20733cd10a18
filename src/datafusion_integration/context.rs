// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! DataFusion SessionContext setup for ocsql

use std::sync::Arc;

use datafusion::arrow::array::{ArrayRef, RecordBatch, TimestampMillisecondArray};
use datafusion::arrow::datatypes::{DataType, TimeUnit};
use datafusion::arrow::util::display::array_value_to_string;
use datafusion::error::{DataFusionError, Result as DFResult};
use datafusion::execution::context::SessionContext;
use datafusion::prelude::SessionConfig;
use tracing::debug;

use crate::config::Config;
use crate::openshift::ClientResolver;
use crate::openshift::policy::ErrorPolicy;
use crate::openshift::resources::{
    Build, BuildConfig, DeploymentConfig, ImageStream, OAuthAccessToken, OpenShiftTable, Project,
    Route, TableInfo, User, all_tables,
};
use crate::output::QueryResult;
use crate::progress::ProgressHandle;

use super::provider::{ApiFactory, OpenShiftTableProvider, QueryCancel, ScanContext, cluster_api};

/// Builds one API factory per table
///
/// The live implementation resolves the cluster client; tests substitute fakes.
pub trait ApiSource {
    fn api<K: OpenShiftTable>(&self) -> ApiFactory<K>;
}

/// Resolves the cluster through a shared memoizing resolver
pub struct ClusterSource {
    pub resolver: Arc<ClientResolver>,
    pub config: Config,
}

impl ApiSource for ClusterSource {
    fn api<K: OpenShiftTable>(&self) -> ApiFactory<K> {
        cluster_api::<K>(Arc::clone(&self.resolver), self.config.connection.clone())
    }
}

/// A wrapper around DataFusion's SessionContext with every OpenShift table registered
#[derive(Clone)]
pub struct OcSessionContext {
    ctx: SessionContext,
    cancel: Arc<QueryCancel>,
}

impl OcSessionContext {
    /// Create a session querying the cluster described by `config`
    pub fn new(config: Config, progress: ProgressHandle) -> anyhow::Result<Self> {
        let resolver = Arc::new(ClientResolver::new().with_progress(Arc::clone(&progress)));
        let policy = Arc::new(ErrorPolicy::from(&config.errors));
        let source = ClusterSource { resolver, config };
        Self::with_source(&source, policy, progress)
    }

    /// Create a session whose tables talk to `source`
    pub fn with_source<S: ApiSource>(
        source: &S,
        policy: Arc<ErrorPolicy>,
        progress: ProgressHandle,
    ) -> anyhow::Result<Self> {
        let config = SessionConfig::new()
            .with_information_schema(true)
            .with_default_catalog_and_schema("ocsql", "public");
        let mut ctx = SessionContext::new_with_config(config);

        // JSON functions for querying nested columns
        datafusion_functions_json::register_all(&mut ctx)?;

        let cancel = Arc::new(QueryCancel::default());
        let scan_context = Arc::new(ScanContext {
            policy,
            progress,
            cancel: Arc::clone(&cancel),
        });

        register::<Build, _>(&ctx, source, &scan_context)?;
        register::<BuildConfig, _>(&ctx, source, &scan_context)?;
        register::<DeploymentConfig, _>(&ctx, source, &scan_context)?;
        register::<ImageStream, _>(&ctx, source, &scan_context)?;
        register::<OAuthAccessToken, _>(&ctx, source, &scan_context)?;
        register::<Project, _>(&ctx, source, &scan_context)?;
        register::<Route, _>(&ctx, source, &scan_context)?;
        register::<User, _>(&ctx, source, &scan_context)?;

        Ok(Self { ctx, cancel })
    }

    /// Execute a SQL query and return the results as Arrow RecordBatches
    pub async fn execute_sql(&self, sql: &str) -> DFResult<Vec<RecordBatch>> {
        let df = self.ctx.sql(sql).await?;
        df.collect().await
    }

    /// Execute a SQL query and return results as formatted strings (for display)
    pub async fn execute_sql_to_strings(&self, sql: &str) -> anyhow::Result<QueryResult> {
        let batches = self.execute_sql(sql).await?;
        Ok(batches_to_result(&batches)?)
    }

    /// Stop running listings at their next page boundary
    pub fn cancel_running(&self) {
        self.cancel.cancel();
    }

    /// Table registry (for SHOW TABLES)
    pub fn list_tables(&self) -> Vec<TableInfo> {
        all_tables()
    }

    /// Column layout of one table (for DESCRIBE)
    pub fn describe_table(&self, name: &str) -> Option<TableInfo> {
        let name = name.trim().trim_matches('"').to_lowercase();
        all_tables().into_iter().find(|t| t.name == name)
    }

    /// Names of registered tables and their columns, for completion
    pub fn completion_words(&self) -> Vec<String> {
        let mut words: Vec<String> = all_tables()
            .iter()
            .flat_map(|t| {
                std::iter::once(t.name.to_string())
                    .chain(t.columns.iter().map(|c| c.name.to_string()))
            })
            .collect();
        words.sort();
        words.dedup();
        words
    }
}

fn register<K: OpenShiftTable, S: ApiSource>(
    ctx: &SessionContext,
    source: &S,
    scan_context: &Arc<ScanContext>,
) -> anyhow::Result<()> {
    let provider = OpenShiftTableProvider::<K>::new(source.api::<K>(), Arc::clone(scan_context));
    ctx.register_table(K::TABLE, Arc::new(provider))?;
    debug!(table = K::TABLE, gvk = %K::info().gvk(), "Registered table");
    Ok(())
}

/// Render record batches as display strings
pub fn batches_to_result(batches: &[RecordBatch]) -> DFResult<QueryResult> {
    let Some(first) = batches.first() else {
        return Ok(QueryResult {
            columns: vec![],
            rows: vec![],
        });
    };

    let schema = first.schema();
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    let mut rows = Vec::new();
    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            let row = batch
                .columns()
                .iter()
                .map(|col| format_value(col, row_idx))
                .collect::<DFResult<Vec<_>>>()?;
            rows.push(row);
        }
    }

    Ok(QueryResult { columns, rows })
}

/// Convert an Arrow array value at a given index to a string
fn format_value(array: &ArrayRef, idx: usize) -> DFResult<String> {
    if array.is_null(idx) {
        return Ok(String::new());
    }

    // Timestamps are shown as RFC 3339 in UTC
    if let DataType::Timestamp(TimeUnit::Millisecond, _) = array.data_type()
        && let Some(arr) = array.as_any().downcast_ref::<TimestampMillisecondArray>()
        && let Some(dt) = chrono::DateTime::from_timestamp_millis(arr.value(idx))
    {
        return Ok(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    }

    array_value_to_string(array, idx).map_err(DataFusionError::from)
}
