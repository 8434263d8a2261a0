//! Retry policy for node initialization.

use std::time::Duration;

/// How many times a node's initialization is attempted, how long one attempt
/// may take, and how long to wait between attempts.
///
/// The delay is applied between attempts only, never after the last one. An
/// attempt that outlives `attempt_timeout` is abandoned and counts as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub delay: Duration,
    /// Upper bound on a single attempt (connect plus container check).
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Default number of attempts per node.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Default pause between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);
    /// Default bound on one attempt.
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

    /// `max_attempts` tries, `delay` apart, each bounded by
    /// [`Self::DEFAULT_ATTEMPT_TIMEOUT`].
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Replace the per-attempt bound.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// `max_attempts` tries back to back.
    pub fn no_delay(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Attempt budget actually used by the registry.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}
