//! Retry with exponential backoff for transient transport failures.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;

use super::error::{TransportError, TransportResult};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// How many times to attempt a call and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
        }
    }

    /// Single attempt, no waiting.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay after the failed attempt at `attempt_index` (0-indexed):
    /// `base_delay * 2^attempt_index`, saturating.
    #[must_use]
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts.
///
/// Only network, 5xx, and timeout failures are retried. There is no wait
/// after the final attempt, and when every attempt fails the error of the
/// last attempt is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> TransportResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TransportResult<T>>,
{
    let policy = *policy;
    let max_attempts = policy.max_attempts.max(1);
    let strategy = (0..max_attempts - 1).map(move |attempt| policy.delay_for(attempt));

    let mut attempt = 0_u32;
    let condition = |error: &TransportError| {
        attempt += 1;
        let retryable = error.is_retryable();
        if retryable && attempt < max_attempts {
            tracing::debug!(attempt, max_attempts, "Transient failure, retrying: {}", error);
        }
        retryable
    };

    RetryIf::spawn(strategy, operation, condition).await
}
