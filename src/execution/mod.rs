//! Resilience layer for remote calls.
//!
//! This module sits between the upload orchestration in [`crate::upload`] and the remote
//! [`crate::sheets::SheetsService`], and provides:
//!
//! - Retry with exponential backoff and jitter ([`with_retry`])
//! - Rolling-window throttling shared by every call made through one client ([`RateLimiter`])
//! - [`RequestGuard`], which applies both to a single remote call

mod rate_limiter;
mod retry;

use std::sync::Arc;
use std::time::Duration;

use crate::error::UploadResult;
use crate::observability::Logger;

pub use rate_limiter::{RateLimiter, MINUTE};
pub use retry::{with_retry, RetryPolicy, Retryable};

/// Applies rate limiting and retries to individual remote calls.
///
/// A slot is acquired from the limiter before every attempt, so retries are throttled too.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl RequestGuard {
    /// Create a guard sharing `limiter` with any other guard built from it.
    pub fn new(limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self { limiter, retry }
    }

    /// A guard with no retries and an effectively unlimited window.
    pub fn unthrottled() -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(usize::MAX, Duration::ZERO)),
            retry: RetryPolicy {
                retries: 0,
                ..RetryPolicy::default()
            },
        }
    }

    /// Retry policy applied to each call.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one remote call under the limiter and retry policy.
    pub fn call<T, F>(&self, what: &str, logger: &dyn Logger, mut op: F) -> UploadResult<T>
    where
        F: FnMut() -> UploadResult<T>,
    {
        with_retry(&self.retry, logger, || {
            let waited = self.limiter.acquire();
            if waited > Duration::ZERO {
                logger.debug(&format!("{what}: throttled for {}ms", waited.as_millis()));
            }
            op()
        })
    }
}
