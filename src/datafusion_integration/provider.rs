// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! DataFusion TableProvider implementation for OpenShift resources

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::catalog::Session;
use datafusion::common::ScalarValue;
use datafusion::datasource::memory::MemorySourceConfig;
use datafusion::datasource::{TableProvider, TableType};
use datafusion::error::{DataFusionError, Result};
use datafusion::logical_expr::{BinaryExpr, Operator, TableProviderFilterPushDown};
use datafusion::physical_plan::ExecutionPlan;
use datafusion::prelude::Expr;
use futures::FutureExt;
use futures::future::BoxFuture;
use kube::api::{ListParams, ObjectList};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::openshift::field_selectors::{KeyColumn, KeyQuals};
use crate::openshift::pager::{
    ClusterApi, ItemKey, ListRequest, ResourceApi, RowBuffer, get_item, list_into,
};
use crate::openshift::policy::{ErrorPolicy, RetryingApi};
use crate::openshift::resources::{Column, OpenShiftTable};
use crate::openshift::{ClientResolver, OpenShiftError, ResolveError};
use crate::progress::ProgressHandle;

use super::convert::{to_arrow_schema, to_record_batch};

type ApiFuture<K> = BoxFuture<'static, std::result::Result<Arc<dyn ResourceApi<K>>, ResolveError>>;

/// Produces the API handle a scan talks to
pub type ApiFactory<K> = Arc<dyn Fn() -> ApiFuture<K> + Send + Sync>;

/// API factory resolving the cluster client through the memoizing resolver
pub fn cluster_api<K: OpenShiftTable>(
    resolver: Arc<ClientResolver>,
    connection: ConnectionConfig,
) -> ApiFactory<K> {
    Arc::new(move || {
        let resolver = Arc::clone(&resolver);
        let connection = connection.clone();
        async move {
            let resolved = resolver.resolve(&connection).await?;
            let client = resolved.client().await?;
            debug!(
                table = K::TABLE,
                context = resolved.context(),
                kubeconfig = %resolved.source().display(),
                "Using cluster client"
            );
            Ok::<_, ResolveError>(Arc::new(ClusterApi::<K>::new(client)) as Arc<dyn ResourceApi<K>>)
        }
        .boxed()
    })
}

/// Cancellation shared by every scan of a session
///
/// Cancelling stops listings at the next page boundary; rows already fetched
/// are still returned. A fresh token is installed for the next query.
#[derive(Debug, Default)]
pub struct QueryCancel {
    current: Mutex<CancellationToken>,
}

impl QueryCancel {
    /// Token for one scan
    pub fn token(&self) -> CancellationToken {
        self.lock().child_token()
    }

    /// Cancel every running scan
    pub fn cancel(&self) {
        let mut current = self.lock();
        current.cancel();
        *current = CancellationToken::new();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// State shared by all table providers of a session
pub struct ScanContext {
    pub policy: Arc<ErrorPolicy>,
    pub progress: ProgressHandle,
    pub cancel: Arc<QueryCancel>,
}

/// Reports every fetched list page to the progress channel
struct ReportingApi<A> {
    inner: A,
    progress: ProgressHandle,
    table: &'static str,
}

#[async_trait]
impl<K, A> ResourceApi<K> for ReportingApi<A>
where
    K: Clone + Send + 'static,
    A: ResourceApi<K>,
{
    async fn list(&self, params: &ListParams) -> kube::Result<ObjectList<K>> {
        let page = self.inner.list(params).await?;
        self.progress.page_fetched(self.table, page.items.len());
        Ok(page)
    }

    async fn get(&self, namespace: Option<&str>, name: &str) -> kube::Result<K> {
        let item = self.inner.get(namespace, name).await?;
        self.progress.page_fetched(self.table, 1);
        Ok(item)
    }
}

/// Key equalities found in the pushed-down filters
#[derive(Debug, Default, PartialEq, Eq)]
struct KeyFilters {
    quals: KeyQuals,
    /// Two different values were required for the same key
    contradictory: bool,
}

impl KeyFilters {
    fn from_exprs(filters: &[Expr]) -> Self {
        let mut result = KeyFilters::default();
        for filter in filters {
            result.collect(filter);
        }
        result
    }

    fn collect(&mut self, expr: &Expr) {
        match expr {
            Expr::BinaryExpr(binary) if binary.op == Operator::And => {
                self.collect(&binary.left);
                self.collect(&binary.right);
            }
            Expr::BinaryExpr(binary) => {
                if let Some((key, value)) = key_equality(binary) {
                    self.bind(key, value);
                }
            }
            _ => {}
        }
    }

    fn bind(&mut self, key: KeyColumn, value: String) {
        let slot = match key {
            KeyColumn::Name => &mut self.quals.name,
            KeyColumn::Namespace => &mut self.quals.namespace,
        };
        match slot {
            Some(existing) if *existing != value => self.contradictory = true,
            Some(_) => {}
            None => *slot = Some(value),
        }
    }
}

/// Match `key = 'literal'` or `'literal' = key` on a key column
fn key_equality(binary: &BinaryExpr) -> Option<(KeyColumn, String)> {
    if binary.op != Operator::Eq {
        return None;
    }
    let (column, literal) = match (binary.left.as_ref(), binary.right.as_ref()) {
        (Expr::Column(col), Expr::Literal(lit, _)) | (Expr::Literal(lit, _), Expr::Column(col)) => {
            (col, lit)
        }
        _ => return None,
    };
    let key = KeyColumn::from_column(&column.name)?;
    match literal {
        ScalarValue::Utf8(Some(s))
        | ScalarValue::LargeUtf8(Some(s))
        | ScalarValue::Utf8View(Some(s)) => Some((key, s.clone())),
        _ => None,
    }
}

/// Which request a scan issues
#[derive(Debug, PartialEq, Eq)]
enum ScanPlan {
    /// Filters can never match
    Empty,
    Get(ItemKey),
    List(ListRequest),
}

/// A DataFusion TableProvider backed by one OpenShift resource kind
pub struct OpenShiftTableProvider<K: OpenShiftTable> {
    api: ApiFactory<K>,
    scan_context: Arc<ScanContext>,
    columns: Vec<Column<K>>,
    schema: SchemaRef,
}

impl<K: OpenShiftTable> OpenShiftTableProvider<K> {
    pub fn new(api: ApiFactory<K>, scan_context: Arc<ScanContext>) -> Self {
        let columns = K::columns();
        let schema = to_arrow_schema(&columns);
        Self {
            api,
            scan_context,
            columns,
            schema,
        }
    }

    /// Whether an equality on `key` is fully honoured by the API request
    fn key_pushdown_exact(key: KeyColumn) -> bool {
        K::LIST_KEY_QUALS.contains(&key) || K::get_keys() == [key]
    }

    fn plan(filters: &KeyFilters) -> ScanPlan {
        if filters.contradictory {
            return ScanPlan::Empty;
        }

        let quals = &filters.quals;
        if K::get_keys().iter().all(|key| quals.get(*key).is_some()) {
            return ScanPlan::Get(ItemKey::new(
                quals.name.clone().unwrap_or_default(),
                quals.namespace.clone().unwrap_or_default(),
            ));
        }

        ScanPlan::List(
            ListRequest::new(K::PAGE_CEILING)
                .with_field_selector(quals.field_selector(K::LIST_KEY_QUALS)),
        )
    }

    /// Run the plan and collect matching objects
    async fn fetch(&self, plan: ScanPlan, limit: Option<usize>) -> Result<Vec<K>> {
        if plan == ScanPlan::Empty {
            debug!(table = K::TABLE, "Contradictory key filters, skipping request");
            return Ok(Vec::new());
        }

        let policy = &self.scan_context.policy;
        let api = (self.api)().await.map_err(|e| external(OpenShiftError::from(e)))?;
        let api = ReportingApi {
            inner: RetryingApi::new(api, Arc::clone(policy), K::TABLE),
            progress: Arc::clone(&self.scan_context.progress),
            table: K::TABLE,
        };

        let result = match plan {
            ScanPlan::Empty => Ok(Vec::new()),
            ScanPlan::Get(key) => get_item::<K, _>(&api, &key, K::NAMESPACED)
                .await
                .map(|item| item.into_iter().collect()),
            ScanPlan::List(request) => {
                let mut sink = RowBuffer::new(limit);
                let cancel = self.scan_context.cancel.token();
                list_into::<K, _, _>(&api, &request, &mut sink, &cancel)
                    .await
                    .map(|stats| {
                        debug!(
                            table = K::TABLE,
                            pages = stats.pages,
                            items = stats.items,
                            stopped = ?stats.stopped,
                            rows = sink.len(),
                            "Listing finished"
                        );
                        sink.into_rows()
                    })
            }
        };

        match result {
            Ok(rows) => Ok(rows),
            Err(e) if policy.should_ignore(&e) => {
                debug!(table = K::TABLE, error = %e, "Ignoring API error");
                Ok(Vec::new())
            }
            Err(e) => Err(external(OpenShiftError::api(K::TABLE, e))),
        }
    }
}

fn external(err: OpenShiftError) -> DataFusionError {
    DataFusionError::External(Box::new(err))
}

impl<K: OpenShiftTable> std::fmt::Debug for OpenShiftTableProvider<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenShiftTableProvider")
            .field("table", &K::TABLE)
            .finish()
    }
}

#[async_trait]
impl<K: OpenShiftTable> TableProvider for OpenShiftTableProvider<K> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn table_type(&self) -> TableType {
        TableType::Base
    }

    fn supports_filters_pushdown(
        &self,
        filters: &[&Expr],
    ) -> Result<Vec<TableProviderFilterPushDown>> {
        // Key equalities become a field selector or a point lookup; everything
        // else is re-applied by DataFusion
        Ok(filters
            .iter()
            .map(|f| match f {
                Expr::BinaryExpr(binary)
                    if key_equality(binary)
                        .is_some_and(|(key, _)| Self::key_pushdown_exact(key)) =>
                {
                    TableProviderFilterPushDown::Exact
                }
                _ => TableProviderFilterPushDown::Inexact,
            })
            .collect())
    }

    async fn scan(
        &self,
        _state: &dyn Session,
        projection: Option<&Vec<usize>>,
        filters: &[Expr],
        limit: Option<usize>,
    ) -> Result<Arc<dyn ExecutionPlan>> {
        let key_filters = KeyFilters::from_exprs(filters);
        let plan = Self::plan(&key_filters);

        info!(
            table = K::TABLE,
            plan = ?plan,
            limit = ?limit,
            "Fetching resources from OpenShift API"
        );

        let progress = &self.scan_context.progress;
        progress.start_query(K::TABLE);
        let fetch_start = Instant::now();

        let rows = self.fetch(plan, limit).await?;
        let fetch_elapsed = fetch_start.elapsed();

        progress.query_complete(K::TABLE, rows.len(), fetch_elapsed.as_millis() as u64);
        info!(
            table = K::TABLE,
            rows = rows.len(),
            fetch_ms = fetch_elapsed.as_millis(),
            "OpenShift API fetch complete"
        );

        let batch = to_record_batch(&self.columns, self.schema.clone(), &rows)?;
        let plan = MemorySourceConfig::try_new_exec(
            &[vec![batch]],
            self.schema.clone(),
            projection.cloned(),
        )?;

        Ok(plan)
    }
}
