//! Backoff between attempts of a failed run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Exponential backoff: base * 2^(retry - 1)
    #[default]
    Exponential,
    /// Linear backoff: base * retry
    Linear,
}

/// How long the in-process runtime waits before each retry.
///
/// The number of retries comes from the function's config; this only shapes
/// the delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Jitter factor (0.0-1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            strategy: BackoffStrategy::Exponential,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting (tests, local runs).
    pub fn immediate() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
            jitter: 0.0,
        }
    }

    pub fn exponential(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Exponential,
            jitter: 0.1,
        }
    }

    /// Delay before retry number `retry` (1-indexed; 0 means no delay).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;

        let delay_ms = match self.strategy {
            BackoffStrategy::Fixed => base_ms,
            BackoffStrategy::Exponential => {
                let exp = 2_f64.powi(retry.saturating_sub(1).min(30) as i32);
                (base_ms * exp).min(max_ms)
            }
            BackoffStrategy::Linear => (base_ms * f64::from(retry)).min(max_ms),
        };

        // Deterministic spread keyed on the retry number.
        let jitter_range = delay_ms * self.jitter.clamp(0.0, 1.0);
        let jitter = if jitter_range > 0.0 {
            let pseudo_random = ((f64::from(retry) * 17.0) % 100.0) / 100.0;
            jitter_range * (pseudo_random - 0.5) * 2.0
        } else {
            0.0
        };

        Duration::from_millis((delay_ms + jitter).max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles_until_capped() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::exponential(Duration::from_millis(100), Duration::from_millis(500))
        };

        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_retry(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for_retry(20), Duration::from_millis(500));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let policy = RetryPolicy::fixed(Duration::from_millis(250));

        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for_retry(7), Duration::from_millis(250));
    }

    #[test]
    fn linear_backoff_increases_linearly() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            strategy: BackoffStrategy::Linear,
            jitter: 0.0,
        };

        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(300));
    }

    #[test]
    fn jitter_stays_within_range() {
        let policy = RetryPolicy::exponential(Duration::from_millis(1_000), Duration::from_secs(60));
        for retry in 1..=6 {
            let nominal = 1_000.0 * 2_f64.powi(retry as i32 - 1);
            let actual = policy.delay_for_retry(retry).as_millis() as f64;
            assert!((actual - nominal).abs() <= nominal * 0.1 + 1.0, "retry {retry}: {actual}");
        }
    }

    #[test]
    fn immediate_never_waits() {
        let policy = RetryPolicy::immediate();
        assert_eq!(policy.delay_for_retry(0), Duration::ZERO);
        assert_eq!(policy.delay_for_retry(5), Duration::ZERO);
    }
}
