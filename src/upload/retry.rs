use crate::upload::PartError;
use std::time::Duration;

/// Retries of a part upload on transient errors, off by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
        }
    }

    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Backoff before retry `attempt` (starting at 1): `base_delay * 2^(attempt-1)`
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// `attempt` is the number of retries already done
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &PartError) -> bool {
        attempt < self.retries && error.is_transient()
    }
}
