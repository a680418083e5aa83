//! Bounded retry with linear backoff.
//!
//! An archive gets at most `max_attempts` attempts. Before attempt `n`
//! (0-indexed, `n > 0`) the manager sleeps `n * backoff_base`, so the
//! default policy waits 1s and then 2s.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use gitlab_backup_core::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! match policy.should_retry(true, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(1));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("{reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use crate::config::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS, DownloadConfig};

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `attempt` (1-indexed).
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// The attempt about to be made.
        attempt: u32,
    },

    /// Give up on this archive.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Attempt bound and backoff unit for archive downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Builds the policy described by a [`DownloadConfig`].
    #[must_use]
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(config.max_attempts(), config.backoff_base())
    }

    /// Maximum number of attempts, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt after `failed_attempts` failures.
    #[must_use]
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        self.backoff_base.saturating_mul(failed_attempts)
    }

    /// Decides what to do after attempt number `attempt` (1-indexed) failed.
    #[instrument(level = "debug", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, transient: bool, attempt: u32) -> RetryDecision {
        if !transient {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.delay_after(attempt);
        debug!(attempt, delay_ms = delay.as_millis(), "will retry");
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }
}
