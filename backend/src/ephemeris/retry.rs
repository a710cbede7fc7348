//! Bounded retry with per-request timeout around any [`EphemerisClient`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::client::EphemerisClient;
use super::error::{EphemerisError, EphemerisResult, ErrorContext};
use crate::models::{JulianDate, OrbitalElements};

/// How hard the retry layer tries before giving up on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Initial retry delay (doubles with each retry)
    pub retry_delay: Duration,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStats {
    /// Attempts issued to the wrapped client
    pub requests: u64,
    pub retries: u64,
    /// Requests that failed after all attempts
    pub failures: u64,
    pub timeouts: u64,
}

pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
    requests: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

impl<C: EphemerisClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            requests: self.requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    async fn with_retry<T, F, Fut>(&self, context: ErrorContext, f: F) -> EphemerisResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = EphemerisResult<T>>,
    {
        let max_retries = self.policy.max_retries;
        let mut retry_delay = self.policy.retry_delay;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                self.retries.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2; // Exponential backoff
            }

            self.requests.fetch_add(1, Ordering::Relaxed);
            let outcome = match tokio::time::timeout(self.policy.timeout, f()).await {
                Ok(result) => result,
                Err(_) => {
                    self.timeouts.fetch_add(1, Ordering::Relaxed);
                    Err(EphemerisError::timeout(
                        format!("no response within {:?}", self.policy.timeout),
                        context.clone(),
                    ))
                }
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    debug!(
                        "retrying after attempt {} of {}: {}",
                        attempt + 1,
                        max_retries + 1,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    return Err(e.with_attempt(attempt + 1));
                }
            }
        }

        self.failures.fetch_add(1, Ordering::Relaxed);
        Err(last_error.unwrap_or_else(|| {
            EphemerisError::internal("max retries exceeded with no error captured", context)
        }))
    }
}

#[async_trait]
impl<C: EphemerisClient> EphemerisClient for RetryingClient<C> {
    async fn get_longitude(&self, body_id: &str, epoch: JulianDate) -> EphemerisResult<f64> {
        let context = ErrorContext::new("get_longitude")
            .with_body(body_id)
            .with_epoch(epoch.value());
        self.with_retry(context, || self.inner.get_longitude(body_id, epoch))
            .await
    }

    async fn get_elements(
        &self,
        body_id: &str,
        epoch: JulianDate,
    ) -> EphemerisResult<OrbitalElements> {
        let context = ErrorContext::new("get_elements")
            .with_body(body_id)
            .with_epoch(epoch.value());
        self.with_retry(context, || self.inner.get_elements(body_id, epoch))
            .await
    }

    async fn get_longitudes(
        &self,
        body_ids: &[String],
        epoch: JulianDate,
    ) -> EphemerisResult<Vec<f64>> {
        let context = ErrorContext::new("get_longitudes")
            .with_body(body_ids.join(","))
            .with_epoch(epoch.value());
        self.with_retry(context, || self.inner.get_longitudes(body_ids, epoch))
            .await
    }

    async fn health_check(&self) -> EphemerisResult<bool> {
        self.with_retry(ErrorContext::new("health_check"), || {
            self.inner.health_check()
        })
        .await
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
