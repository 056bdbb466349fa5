//! Retry policy with exponential backoff

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::backend::BackendError;

/// Per-node retry behaviour. Only transient failures are retried; a
/// validation rejection fails the node on the first attempt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// First backoff; later attempts double it
    pub base_backoff_ms: u64,

    /// Backoff ceiling
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Whether attempt `attempt` (1-based) may be followed by another.
    pub fn should_retry(&self, error: &BackendError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }

    /// Backoff to sleep after a failed attempt `attempt` (1-based):
    /// `base * 2^(attempt-1)`, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
        let total_ms = self.base_backoff_ms.saturating_mul(multiplier);
        Duration::from_millis(total_ms.min(self.max_backoff_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_backoff_ms: 1000,
            max_backoff_ms: 60_000,
        };

        assert_eq!(policy.backoff(1).as_millis(), 1000);
        assert_eq!(policy.backoff(2).as_millis(), 2000);
        assert_eq!(policy.backoff(3).as_millis(), 4000);
        assert_eq!(policy.backoff(4).as_millis(), 8000);
        assert_eq!(policy.backoff(10).as_millis(), 60_000);
    }

    #[test]
    fn transient_errors_retry_until_attempts_exhausted() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff_ms: 100,
            max_backoff_ms: 1000,
        };
        let transient = BackendError::Transient("connection reset".into());

        assert!(policy.should_retry(&transient, 1));
        assert!(policy.should_retry(&transient, 2));
        assert!(!policy.should_retry(&transient, 3));
        assert!(!policy.should_retry(&transient, 4));
    }

    #[test]
    fn validation_and_fatal_errors_never_retry() {
        let policy = RetryPolicy::default();

        let validation = BackendError::Validation("unknown selector".into());
        let fatal = BackendError::Fatal("bad response body".into());
        assert!(!policy.should_retry(&validation, 1));
        assert!(!policy.should_retry(&fatal, 1));
    }

    #[test]
    fn huge_attempt_counts_do_not_overflow() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            base_backoff_ms: u64::MAX / 2,
            max_backoff_ms: 5_000,
        };
        assert_eq!(policy.backoff(64).as_millis(), 5_000);
    }
}
