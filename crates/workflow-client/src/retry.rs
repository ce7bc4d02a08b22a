//! Fixed-delay retry policy and the sleep seam.
//!
//! Every retry waits exactly `delay_ms`; there is no jitter and no growth.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

/// Attempt bound and fixed inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        RetryPolicy {
            max_attempts,
            delay_ms,
        }
    }

    /// At least one attempt is always made.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Whether another attempt follows after `failed_attempts` failures.
pub fn should_retry(failed_attempts: u32, max_attempts: u32) -> bool {
    failed_attempts < max_attempts
}

/// Suspension between attempts.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer; only the calling task is suspended.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_bound() {
        assert!(should_retry(1, 3));
        assert!(should_retry(2, 3));
        assert!(!should_retry(3, 3));
        assert!(!should_retry(4, 3));
    }

    #[test]
    fn test_single_attempt_never_retries() {
        assert!(!should_retry(1, 1));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, 10);
        assert_eq!(policy.effective_max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_delay_waits_full_duration() {
        let start = tokio::time::Instant::now();
        TokioDelay.sleep(Duration::from_millis(2_000)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(2_000));
    }
}
