// src/fetch/retry.rs
use std::time::Duration;

use rand::Rng;

/// HTTP statuses that warrant a retry of the same request profile.
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Bounded retry with exponential backoff and jitter, applied within a
/// single request profile. A 403 is handled one level up by advancing
/// the ladder instead of retrying.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.3,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter_factor = 0.0;
        self
    }

    /// Whether a response status should be retried on the same profile.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Backoff before retry attempt `attempt` (0-based), capped at
    /// `max_backoff`, with multiplicative jitter applied.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);
        let jittered = if self.jitter_factor > 0.0 {
            let jitter = rand::thread_rng()
                .gen_range(-self.jitter_factor..=self.jitter_factor);
            capped * (1.0 + jitter)
        } else {
            capped
        };
        Duration::from_millis(jittered.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let policy = RetryPolicy::default();
        for status in [429, 500, 502, 503, 504] {
            assert!(policy.is_retryable_status(status), "status {status}");
        }
    }

    #[test]
    fn forbidden_and_success_are_not_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable_status(403));
        assert!(!policy.is_retryable_status(200));
        assert!(!policy.is_retryable_status(404));
    }

    #[test]
    fn backoff_grows_exponentially_without_jitter() {
        let policy = RetryPolicy::default().without_jitter();
        let first = policy.backoff(0);
        let second = policy.backoff(1);
        let third = policy.backoff(2);
        assert_eq!(first, Duration::from_millis(250));
        assert_eq!(second, Duration::from_millis(500));
        assert_eq!(third, Duration::from_millis(1000));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default().without_jitter();
        assert_eq!(policy.backoff(20), policy.max_backoff);
    }

    #[test]
    fn jitter_stays_within_band() {
        let policy = RetryPolicy::default();
        for attempt in 0..4 {
            let base = policy.clone().without_jitter().backoff(attempt).as_millis() as f64;
            for _ in 0..50 {
                let jittered = policy.backoff(attempt).as_millis() as f64;
                assert!(jittered >= base * 0.69 && jittered <= base * 1.31);
            }
        }
    }
}
