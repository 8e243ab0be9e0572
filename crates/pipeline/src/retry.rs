//! Retry policy shared by the remote phases and the asset transport.

use std::time::Duration;

/// How often, and how patiently, an operation is re-attempted.
///
/// The default policy is unbounded with no delay: the operation is issued
/// again immediately until it succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (backoff cap).
    pub max_delay: Duration,
    /// Multiplier applied for each subsequent retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    /// Retries forever, immediately.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Allows at most `max_attempts` attempts in total, with no delay.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            ..Self::unbounded()
        }
    }

    /// Adds exponential backoff to this policy.
    pub fn with_backoff(
        mut self,
        initial_delay: Duration,
        max_delay: Duration,
        factor: f64,
    ) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay.max(initial_delay);
        self.backoff_factor = factor.max(1.0);
        self
    }

    /// Returns `true` if attempt number `attempt` (1-based) may be made.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }

    /// Delay to wait before retry number `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = retry.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}
