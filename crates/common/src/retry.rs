//! Retry policy with exponential backoff.
//!
//! The backoff formula lives here and nowhere else; the delivery coordinator
//! computes `next_attempt_at` through it and the scheduler only compares
//! against the stored timestamp.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delivery attempts allowed before a notification is terminal.
    pub max_attempts: i32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on the computed delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(300), // 5 minutes
            max_delay: Duration::from_secs(3600 * 24),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt cap and the default curve.
    #[must_use]
    pub fn with_max_attempts(max_attempts: i32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Calculate the delay scheduled after a failure on the given attempt
    /// number (0-indexed, pre-increment).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        // Large exponents overflow to infinity, which `from_secs_f64` panics
        // on, so the cap has to be applied while still in f64.
        if !delay_secs.is_finite() || delay_secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(delay_secs)
    }

    /// Check whether a record with this many completed attempts may be
    /// attempted again.
    #[must_use]
    pub const fn should_retry(&self, attempts: i32) -> bool {
        attempts < self.max_attempts
    }

    /// Absolute time of the next attempt, strictly after `now`.
    #[must_use]
    pub fn next_attempt_after(&self, now: DateTime<Utc>, attempt: u32) -> DateTime<Utc> {
        let delay = self.delay_for_attempt(attempt);
        now + chrono::Duration::from_std(delay)
            .unwrap_or_else(|_| chrono::Duration::seconds(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();

        // First failure: 5 minutes
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(300));
        // Second failure: 10 minutes
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(600));
        // Third failure: 20 minutes
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(1200));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(3600),
            max_delay: Duration::from_secs(7200),
            multiplier: 2.0,
        };

        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(7200));
    }

    #[test]
    fn test_huge_attempt_number_caps_at_max_delay() {
        let policy = RetryPolicy::with_max_attempts(5000);

        assert_eq!(policy.delay_for_attempt(2000), policy.max_delay);
        assert_eq!(policy.delay_for_attempt(u32::MAX), policy.max_delay);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_next_attempt_is_in_the_future() {
        let policy = RetryPolicy::default();
        let now = Utc::now();

        let next = policy.next_attempt_after(now, 0);
        assert_eq!(next - now, chrono::Duration::minutes(5));

        let next = policy.next_attempt_after(now, 1);
        assert_eq!(next - now, chrono::Duration::minutes(10));
    }
}
