//! Retry policy and per-call backoff state

use crate::config::RetryConfig;
use std::time::Duration;

/// Retry policy shared by every call a `Requester` executes
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Wait before the first retry; also the value a rate-limit sleep resets to
    pub initial_wait: Duration,

    /// Factor applied to the wait after each server error or transient fault
    pub multiplier: f64,

    /// Server-error backoff gives up once the wait exceeds this
    pub max_server_wait: Duration,

    /// Consecutive transient faults tolerated before giving up
    pub max_transient_errors: u32,

    /// Sleep after a rate-limit response
    pub rate_limit_window: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_wait: Duration::from_secs_f64(config.initial_wait_secs),
            multiplier: config.backoff_multiplier,
            max_server_wait: Duration::from_secs_f64(config.max_server_wait_secs),
            max_transient_errors: config.max_transient_errors,
            rate_limit_window: Duration::from_secs_f64(config.rate_limit_window_secs),
        }
    }
}

/// Backoff counters for one logical call
///
/// The wait and the consecutive-failure count evolve independently: the wait
/// grows on every server error or transient fault and is reset by a
/// rate-limit sleep, while the failure count only tracks consecutive
/// transient faults and is cleared by any HTTP-level response.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffState {
    wait: Duration,
    failures: u32,
}

impl BackoffState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            wait: policy.initial_wait,
            failures: 0,
        }
    }

    /// The wait the next backoff sleep will use
    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Returns the current wait and grows it by `multiplier`
    pub fn next_wait(&mut self, multiplier: f64) -> Duration {
        let current = self.wait;
        self.wait = current.mul_f64(multiplier);
        current
    }

    /// Resets the wait to `initial`
    pub fn reset_wait(&mut self, initial: Duration) {
        self.wait = initial;
    }

    /// Counts one more consecutive transient fault and returns the new total
    pub fn record_failure(&mut self) -> u32 {
        self.failures += 1;
        self.failures
    }

    pub fn reset_failures(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_wait, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 1.5);
        assert_eq!(policy.max_server_wait, Duration::from_secs(3600));
        assert_eq!(policy.max_transient_errors, 10);
        assert_eq!(policy.rate_limit_window, Duration::from_secs(905));
    }

    #[test]
    fn test_wait_grows_geometrically() {
        let policy = RetryPolicy::default();
        let mut state = BackoffState::new(&policy);

        assert_eq!(state.next_wait(1.5), Duration::from_secs(2));
        assert_eq!(state.next_wait(1.5), Duration::from_secs(3));
        assert_eq!(state.next_wait(1.5), Duration::from_millis(4500));
        assert_eq!(state.wait(), Duration::from_millis(6750));
    }

    #[test]
    fn test_reset_wait_and_failures_are_independent() {
        let policy = RetryPolicy::default();
        let mut state = BackoffState::new(&policy);

        state.next_wait(1.5);
        assert_eq!(state.record_failure(), 1);
        assert_eq!(state.record_failure(), 2);

        state.reset_wait(policy.initial_wait);
        assert_eq!(state.wait(), Duration::from_secs(2));
        assert_eq!(state.failures(), 2);

        state.reset_failures();
        assert_eq!(state.failures(), 0);
    }
}
