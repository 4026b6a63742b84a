//! Retry Policy Module
//!
//! Exponential backoff schedule for the fetch pipeline.

use std::time::Duration;

/// Retry budget and backoff base.
///
/// Delay before retry `n` (0-based) is `base_delay * 2^n`, without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    // == Delay For ==
    /// Backoff before the retry with index `attempt_index`; saturates instead
    /// of overflowing.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// The full backoff schedule, one delay per retry.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|i| self.delay_for(i)).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(2_000))
    }
}
