// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Paginated listing and point lookups
//!
//! `list_into` walks a resource collection page by page, following the
//! server's continue token, and streams each item into a [`RowSink`]. The
//! sink owns the row budget: once it reports zero rows remaining no further
//! page is requested. `get_item` fetches a single named object and refuses to
//! issue a request when the identifying keys are unbound.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use kube::api::{Api, ListParams, ObjectList};
use kube::core::DynamicResourceScope;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// List and get calls for one resource kind
#[async_trait]
pub trait ResourceApi<K: Clone>: Send + Sync {
    async fn list(&self, params: &ListParams) -> kube::Result<ObjectList<K>>;

    async fn get(&self, namespace: Option<&str>, name: &str) -> kube::Result<K>;
}

#[async_trait]
impl<K, T> ResourceApi<K> for Arc<T>
where
    K: Clone + Send + 'static,
    T: ResourceApi<K> + ?Sized,
{
    async fn list(&self, params: &ListParams) -> kube::Result<ObjectList<K>> {
        (**self).list(params).await
    }

    async fn get(&self, namespace: Option<&str>, name: &str) -> kube::Result<K> {
        (**self).get(namespace, name).await
    }
}

/// `ResourceApi` backed by a live cluster client
pub struct ClusterApi<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ClusterApi<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K> ResourceApi<K> for ClusterApi<K>
where
    K: Resource<DynamicType = (), Scope = DynamicResourceScope>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    async fn list(&self, params: &ListParams) -> kube::Result<ObjectList<K>> {
        // Always list across all namespaces; namespace filtering goes through the field selector
        let api: Api<K> = Api::all_with(self.client.clone(), &());
        api.list(params).await
    }

    async fn get(&self, namespace: Option<&str>, name: &str) -> kube::Result<K> {
        let api: Api<K> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &()),
            None => Api::all_with(self.client.clone(), &()),
        };
        api.get(name).await
    }
}

/// Destination for listed items
pub trait RowSink<K> {
    fn stream_item(&mut self, item: K);

    /// Remaining row budget, `None` when unbounded
    fn rows_remaining(&self) -> Option<usize>;
}

/// Collects items up to an optional limit
#[derive(Debug)]
pub struct RowBuffer<K> {
    rows: Vec<K>,
    limit: Option<usize>,
}

impl<K> RowBuffer<K> {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            rows: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn into_rows(self) -> Vec<K> {
        self.rows
    }
}

impl<K> RowSink<K> for RowBuffer<K> {
    fn stream_item(&mut self, item: K) {
        self.rows.push(item);
    }

    fn rows_remaining(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.rows.len()))
    }
}

/// Per-query listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Largest page the resource kind is asked for
    pub page_ceiling: u32,
    pub field_selector: Option<String>,
}

impl ListRequest {
    pub fn new(page_ceiling: u32) -> Self {
        Self {
            page_ceiling,
            field_selector: None,
        }
    }

    pub fn with_field_selector(mut self, selector: Option<String>) -> Self {
        self.field_selector = selector;
        self
    }

    fn page_size(&self, remaining: Option<usize>) -> u32 {
        match remaining {
            Some(r) => self.page_ceiling.min(u32::try_from(r).unwrap_or(u32::MAX)),
            None => self.page_ceiling,
        }
    }
}

/// Why a listing stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Server returned no continue token
    Exhausted,
    /// Sink reported zero rows remaining
    BudgetReached,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStats {
    pub pages: u32,
    pub items: usize,
    pub stopped: StopReason,
}

/// Stream every item of a collection into `sink`, in server order
///
/// Any failed page aborts the listing; items already emitted stay in the sink.
pub async fn list_into<K, A, S>(
    api: &A,
    request: &ListRequest,
    sink: &mut S,
    cancel: &CancellationToken,
) -> kube::Result<ListStats>
where
    K: Clone,
    A: ResourceApi<K> + ?Sized,
    S: RowSink<K> + Send,
{
    let mut continue_token: Option<String> = None;
    let mut pages = 0u32;
    let mut items = 0usize;

    let finish = |pages, items, stopped| ListStats {
        pages,
        items,
        stopped,
    };

    if sink.rows_remaining() == Some(0) {
        return Ok(finish(pages, items, StopReason::BudgetReached));
    }

    loop {
        if cancel.is_cancelled() {
            debug!(pages, items, "Listing cancelled");
            return Ok(finish(pages, items, StopReason::Cancelled));
        }

        let mut params = ListParams::default().limit(request.page_size(sink.rows_remaining()));
        if let Some(ref selector) = request.field_selector {
            params = params.fields(selector);
        }
        if let Some(ref token) = continue_token {
            params = params.continue_token(token);
        }

        let page = api.list(&params).await?;
        pages += 1;
        trace!(page = pages, items = page.items.len(), "Fetched page");

        for item in page.items {
            sink.stream_item(item);
            items += 1;

            if sink.rows_remaining() == Some(0) {
                return Ok(finish(pages, items, StopReason::BudgetReached));
            }
        }

        match page.metadata.continue_ {
            Some(token) if !token.is_empty() => continue_token = Some(token),
            _ => return Ok(finish(pages, items, StopReason::Exhausted)),
        }
    }
}

/// Identifying keys of a single object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemKey {
    pub name: String,
    pub namespace: String,
}

impl ItemKey {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// Fetch one object by key
///
/// Returns `Ok(None)` without touching the API when `name` is empty, or when
/// the kind is namespaced and `namespace` is empty.
pub async fn get_item<K, A>(api: &A, key: &ItemKey, namespaced: bool) -> kube::Result<Option<K>>
where
    K: Clone,
    A: ResourceApi<K> + ?Sized,
{
    if key.name.is_empty() || (namespaced && key.namespace.is_empty()) {
        return Ok(None);
    }

    let namespace = namespaced.then_some(key.namespace.as_str());
    api.get(namespace, &key.name).await.map(Some)
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeApi, api_error};
    use super::*;

    fn pages_of(sizes: &[usize]) -> Vec<Vec<u32>> {
        let mut next = 0u32;
        sizes
            .iter()
            .map(|&n| {
                let page: Vec<u32> = (next..next + n as u32).collect();
                next += n as u32;
                page
            })
            .collect()
    }

    #[tokio::test]
    async fn test_three_pages_no_limit() {
        let api = FakeApi::with_pages(pages_of(&[500, 500, 37]));
        let mut sink = RowBuffer::new(None);

        let stats = list_into(&api, &ListRequest::new(500), &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(stats.pages, 3);
        assert_eq!(stats.items, 1037);
        assert_eq!(stats.stopped, StopReason::Exhausted);
        assert_eq!(api.list_count(), 3);

        let rows = sink.into_rows();
        assert_eq!(rows.len(), 1037);
        assert!(rows.windows(2).all(|w| w[0] < w[1]), "server order preserved");

        let calls = api.list_calls.lock().unwrap();
        assert_eq!(calls[0].continue_token, None);
        assert_eq!(calls[1].continue_token.as_deref(), Some("page-1"));
        assert_eq!(calls[2].continue_token.as_deref(), Some("page-2"));
        assert!(calls.iter().all(|p| p.limit == Some(500)));
    }

    #[tokio::test]
    async fn test_budget_larger_than_total() {
        // M <= N: everything is emitted, nothing past the last page is requested
        let api = FakeApi::with_pages(pages_of(&[3, 2]));
        let mut sink = RowBuffer::new(Some(10));

        let stats = list_into(&api, &ListRequest::new(1000), &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sink.len(), 5);
        assert_eq!(stats.stopped, StopReason::Exhausted);
        assert_eq!(api.list_count(), 2);
    }

    #[tokio::test]
    async fn test_budget_smaller_than_total_stops_early() {
        // M > N: exactly N items, no further pages
        let api = FakeApi::with_pages(pages_of(&[4, 4, 4]));
        let mut sink = RowBuffer::new(Some(6));

        let stats = list_into(&api, &ListRequest::new(500), &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sink.into_rows(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(stats.stopped, StopReason::BudgetReached);
        assert_eq!(api.list_count(), 2);

        // page size shrinks with the remaining budget
        let calls = api.list_calls.lock().unwrap();
        assert_eq!(calls[0].limit, Some(6));
        assert_eq!(calls[1].limit, Some(2));
    }

    #[tokio::test]
    async fn test_budget_within_first_page() {
        let api = FakeApi::with_pages(pages_of(&[10, 10]));
        let mut sink = RowBuffer::new(Some(3));

        list_into(&api, &ListRequest::new(500), &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(api.list_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_issues_no_request() {
        let api = FakeApi::with_pages(pages_of(&[10]));
        let mut sink = RowBuffer::new(Some(0));

        let stats = list_into(&api, &ListRequest::new(500), &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(stats.stopped, StopReason::BudgetReached);
        assert_eq!(api.list_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let api = FakeApi::with_pages(pages_of(&[10]));
        let mut sink = RowBuffer::new(None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = list_into(&api, &ListRequest::new(500), &mut sink, &cancel)
            .await
            .unwrap();

        assert_eq!(stats.stopped, StopReason::Cancelled);
        assert_eq!(api.list_count(), 0);
        assert_eq!(sink.len(), 0);
    }

    /// Cancels the token after the first item lands
    struct CancellingSink {
        inner: RowBuffer<u32>,
        cancel: CancellationToken,
    }

    impl RowSink<u32> for CancellingSink {
        fn stream_item(&mut self, item: u32) {
            self.inner.stream_item(item);
            self.cancel.cancel();
        }

        fn rows_remaining(&self) -> Option<usize> {
            None
        }
    }

    #[tokio::test]
    async fn test_cancelled_between_pages() {
        let api = FakeApi::with_pages(pages_of(&[2, 2, 2]));
        let cancel = CancellationToken::new();
        let mut sink = CancellingSink {
            inner: RowBuffer::new(None),
            cancel: cancel.clone(),
        };

        let stats = list_into(&api, &ListRequest::new(500), &mut sink, &cancel)
            .await
            .unwrap();

        // the page in flight is drained, the next one is never requested
        assert_eq!(stats.stopped, StopReason::Cancelled);
        assert_eq!(stats.pages, 1);
        assert_eq!(sink.inner.len(), 2);
        assert_eq!(api.list_count(), 1);
    }

    #[tokio::test]
    async fn test_page_error_aborts_listing() {
        let api = FakeApi::with_pages(pages_of(&[2, 2])).failing_first(vec![api_error(500)]);
        let mut sink = RowBuffer::new(None);

        let result =
            list_into(&api, &ListRequest::new(500), &mut sink, &CancellationToken::new()).await;

        assert!(matches!(result, Err(kube::Error::Api(ref e)) if e.code == 500));
        assert_eq!(api.list_count(), 1);
    }

    #[tokio::test]
    async fn test_field_selector_is_sent_on_every_page() {
        let api = FakeApi::with_pages(pages_of(&[1, 1]));
        let mut sink = RowBuffer::new(None);
        let request = ListRequest::new(1000)
            .with_field_selector(Some("metadata.name=foo,metadata.namespace=bar".to_string()));

        list_into(&api, &request, &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        let calls = api.list_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|p| p.field_selector.as_deref()
            == Some("metadata.name=foo,metadata.namespace=bar")));
    }

    #[tokio::test]
    async fn test_get_item_short_circuits_on_empty_name() {
        let api = FakeApi::with_pages(pages_of(&[1]));

        let item = get_item(&api, &ItemKey::new("", "bar"), true).await.unwrap();
        assert_eq!(item, None);
        assert_eq!(api.get_count(), 0);
    }

    #[tokio::test]
    async fn test_get_item_short_circuits_on_empty_namespace() {
        let api = FakeApi::with_pages(pages_of(&[1]));

        let item = get_item(&api, &ItemKey::new("foo", ""), true).await.unwrap();
        assert_eq!(item, None);
        assert_eq!(api.get_count(), 0);
    }

    #[tokio::test]
    async fn test_get_item_cluster_scoped_ignores_namespace() {
        let api = FakeApi::with_pages(pages_of(&[1]));

        let item = get_item(&api, &ItemKey::new("my-project", ""), false)
            .await
            .unwrap();
        assert_eq!(item, Some(0));

        let calls = api.get_calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(None, "my-project".to_string())]);
    }

    #[tokio::test]
    async fn test_get_item_namespaced() {
        let api = FakeApi::with_pages(pages_of(&[1]));

        get_item(&api, &ItemKey::new("foo", "bar"), true)
            .await
            .unwrap();

        let calls = api.get_calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(Some("bar".to_string()), "foo".to_string())]
        );
    }

    #[tokio::test]
    async fn test_get_item_propagates_not_found() {
        let api: FakeApi<u32> = FakeApi::with_pages(vec![]);

        let result = get_item(&api, &ItemKey::new("foo", "bar"), true).await;
        assert!(matches!(result, Err(kube::Error::Api(ref e)) if e.code == 404));
    }

    #[test]
    fn test_row_buffer_remaining() {
        let mut buffer = RowBuffer::new(Some(2));
        assert_eq!(buffer.rows_remaining(), Some(2));
        buffer.stream_item(1);
        assert_eq!(buffer.rows_remaining(), Some(1));
        buffer.stream_item(2);
        assert_eq!(buffer.rows_remaining(), Some(0));

        let unbounded: RowBuffer<u32> = RowBuffer::new(None);
        assert_eq!(unbounded.rows_remaining(), None);
    }
}
