use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::error::UploadError;
use crate::observability::Logger;

/// Lower/upper bounds of the multiplicative jitter applied to each backoff delay.
const JITTER_RANGE: std::ops::Range<f64> = 0.85..1.15;

/// Errors that can tell whether another attempt might succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for UploadError {
    fn is_retryable(&self) -> bool {
        UploadError::is_retryable(self)
    }
}

/// Retry configuration for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; the operation runs at most `retries + 1` times.
    pub retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_delay: Duration::from_millis(1_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the failed attempt `attempt` (0-based), before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        self.initial_delay.mul_f64(factor.max(0.0).min(1.0e9))
    }
}

/// Run `op`, retrying retryable failures with exponential backoff and jitter.
///
/// - success at any attempt returns immediately
/// - a non-retryable failure is returned at once, whatever attempts remain
/// - after `policy.retries` retries the last failure is returned unchanged
pub fn with_retry<T, E, F>(policy: &RetryPolicy, logger: &dyn Logger, op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut rng = rand::rng();
    retry_with_sleep(policy, logger, op, |d| thread::sleep(d), || rng.random_range(JITTER_RANGE))
}

/// [`with_retry`] with injected sleep and jitter sources.
pub(crate) fn retry_with_sleep<T, E, F, S, J>(
    policy: &RetryPolicy,
    logger: &dyn Logger,
    mut op: F,
    mut sleep: S,
    mut jitter: J,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
    J: FnMut() -> f64,
{
    let mut attempt: u32 = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= policy.retries || !e.is_retryable() {
                    return Err(e);
                }
                let wait = policy.base_delay(attempt).mul_f64(jitter());
                logger.warn(&format!(
                    "attempt {}/{} failed ({e}); retrying in {}ms",
                    attempt + 1,
                    policy.retries + 1,
                    wait.as_millis()
                ));
                sleep(wait);
                attempt += 1;
            }
        }
    }
}
