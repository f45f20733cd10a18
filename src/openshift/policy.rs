// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Error classification and request retry
//!
//! Two declarative predicates drive how API failures are treated:
//! - ignore: the failure becomes an empty result (404 by default)
//! - retry: the request is reissued with exponential backoff (429 by default)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::api::{ListParams, ObjectList};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::pager::ResourceApi;

/// Longest wait between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Serializable form of [`ErrorPolicy`], stored in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorPolicyConfig {
    pub ignore_codes: Vec<u16>,
    pub retry_codes: Vec<u16>,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for ErrorPolicyConfig {
    fn default() -> Self {
        Self {
            ignore_codes: vec![404],
            retry_codes: vec![429],
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorPolicy {
    ignore_codes: Vec<u16>,
    retry_codes: Vec<u16>,
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::from(&ErrorPolicyConfig::default())
    }
}

impl From<&ErrorPolicyConfig> for ErrorPolicy {
    fn from(config: &ErrorPolicyConfig) -> Self {
        Self {
            ignore_codes: config.ignore_codes.clone(),
            retry_codes: config.retry_codes.clone(),
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl ErrorPolicy {
    fn status_code(err: &kube::Error) -> Option<u16> {
        match err {
            kube::Error::Api(response) => Some(response.code),
            _ => None,
        }
    }

    /// Failure should be reported as an empty result
    pub fn should_ignore(&self, err: &kube::Error) -> bool {
        Self::status_code(err).is_some_and(|code| self.ignore_codes.contains(&code))
    }

    /// Failure is transient and the request may be reissued
    pub fn should_retry(&self, err: &kube::Error) -> bool {
        Self::status_code(err).is_some_and(|code| self.retry_codes.contains(&code))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Wraps a [`ResourceApi`] and retries individual requests per [`ErrorPolicy`]
pub struct RetryingApi<A> {
    inner: A,
    policy: Arc<ErrorPolicy>,
    table: &'static str,
}

impl<A> RetryingApi<A> {
    pub fn new(inner: A, policy: Arc<ErrorPolicy>, table: &'static str) -> Self {
        Self {
            inner,
            policy,
            table,
        }
    }

    async fn with_retry<T, F, Fut>(&self, op: &str, mut call: F) -> kube::Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = kube::Result<T>> + Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if self.policy.should_retry(&e) && attempt + 1 < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        table = %self.table,
                        op = %op,
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retryable error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(table = %self.table, op = %op, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<K, A> ResourceApi<K> for RetryingApi<A>
where
    K: Clone + Send + 'static,
    A: ResourceApi<K>,
{
    async fn list(&self, params: &ListParams) -> kube::Result<ObjectList<K>> {
        self.with_retry("list", || self.inner.list(params)).await
    }

    async fn get(&self, namespace: Option<&str>, name: &str) -> kube::Result<K> {
        self.with_retry("get", || self.inner.get(namespace, name))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openshift::pager::testing::{FakeApi, api_error};

    fn fast_policy(max_attempts: u32) -> Arc<ErrorPolicy> {
        Arc::new(ErrorPolicy::from(&ErrorPolicyConfig {
            max_attempts,
            base_delay_ms: 1,
            ..Default::default()
        }))
    }

    #[test]
    fn test_default_predicates() {
        let policy = ErrorPolicy::default();
        assert!(policy.should_ignore(&api_error(404)));
        assert!(!policy.should_ignore(&api_error(403)));
        assert!(policy.should_retry(&api_error(429)));
        assert!(!policy.should_retry(&api_error(500)));
    }

    #[test]
    fn test_non_api_errors_are_neither_ignored_nor_retried() {
        let policy = ErrorPolicy::default();
        let err = kube::Error::SerdeError(serde_json::from_str::<u32>("x").unwrap_err());
        assert!(!policy.should_ignore(&err));
        assert!(!policy.should_retry(&err));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = ErrorPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = ErrorPolicy::default();
        assert_eq!(policy.backoff(20), MAX_BACKOFF);
        assert_eq!(policy.backoff(u32::MAX), MAX_BACKOFF);

        let policy = ErrorPolicy::from(&ErrorPolicyConfig {
            base_delay_ms: u64::MAX,
            ..Default::default()
        });
        assert_eq!(policy.backoff(0), MAX_BACKOFF);
        assert_eq!(policy.backoff(3), MAX_BACKOFF);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = ErrorPolicy::from(&ErrorPolicyConfig {
            max_attempts: 0,
            ..Default::default()
        });
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_rate_limited_request() {
        let fake = FakeApi::with_pages(vec![vec![1u32, 2]])
            .failing_first(vec![api_error(429), api_error(429)]);
        let api = RetryingApi::new(fake, fast_policy(3), "openshift_route");

        let list = api.list(&ListParams::default()).await.unwrap();
        assert_eq!(list.items, vec![1, 2]);
        assert_eq!(api.inner.list_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let fake = FakeApi::with_pages(vec![vec![1u32]]).failing_first(vec![
            api_error(429),
            api_error(429),
            api_error(429),
        ]);
        let api = RetryingApi::new(fake, fast_policy(2), "openshift_route");

        let result = api.list(&ListParams::default()).await;
        assert!(matches!(result, Err(kube::Error::Api(ref e)) if e.code == 429));
        assert_eq!(api.inner.list_count(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returned_immediately() {
        let fake = FakeApi::with_pages(vec![vec![1u32]]).failing_first(vec![api_error(403)]);
        let api = RetryingApi::new(fake, fast_policy(3), "openshift_route");

        let result = api.get(Some("ns"), "name").await;
        assert!(result.is_err());
        assert_eq!(api.inner.get_count(), 1);
    }
}
