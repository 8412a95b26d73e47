//! Sliding-window rate limiting per partition key.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;

use gymjobs_core::{DataPath, RateLimit};

/// Admits at most `limit` runs per `period` for each partition key.
///
/// Events over the limit are dropped, not delayed.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    period: Duration,
    key: Option<DataPath>,
    state: Mutex<Windows>,
}

#[derive(Debug, Default)]
struct Windows {
    by_partition: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, period: Duration) {
    while let Some(oldest) = window.front() {
        if now.saturating_duration_since(*oldest) >= period {
            window.pop_front();
        } else {
            break;
        }
    }
}

impl RateLimiter {
    pub fn new(rate_limit: &RateLimit) -> Self {
        Self {
            limit: rate_limit.limit.get() as usize,
            period: rate_limit.period.as_duration(),
            key: rate_limit.key.as_ref().map(|k| k.path().clone()),
            state: Mutex::default(),
        }
    }

    /// Partition an event falls into. Events without the key share one
    /// partition.
    pub fn partition(&self, data: &Value) -> String {
        match &self.key {
            Some(path) => path.resolve(data).map(Value::to_string).unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn try_acquire(&self, data: &Value) -> bool {
        self.try_acquire_at(data, Instant::now())
    }

    pub fn try_acquire_at(&self, data: &Value, now: Instant) -> bool {
        let partition = self.partition(data);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // At most one full sweep per period drops partitions whose window
        // has emptied.
        let sweep_due = state
            .last_sweep
            .is_none_or(|last| now.saturating_duration_since(last) >= self.period);
        if sweep_due {
            let period = self.period;
            state.by_partition.retain(|_, window| {
                prune(window, now, period);
                !window.is_empty()
            });
            state.last_sweep = Some(now);
        }

        let window = state.by_partition.entry(partition).or_default();
        prune(window, now, self.period);

        if window.len() >= self.limit {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Number of partitions currently holding admissions.
    pub fn tracked_partitions(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_partition
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limiter(limit: u32, period: &str, key: Option<&str>) -> RateLimiter {
        let mut rate_limit = RateLimit::new(limit, period).unwrap();
        if let Some(key) = key {
            rate_limit = rate_limit.keyed_by(key).unwrap();
        }
        RateLimiter::new(&rate_limit)
    }

    #[test]
    fn admits_up_to_limit_within_window() {
        let limiter = limiter(2, "1m", None);
        let start = Instant::now();
        let data = json!({});

        assert!(limiter.try_acquire_at(&data, start));
        assert!(limiter.try_acquire_at(&data, start + Duration::from_secs(1)));
        assert!(!limiter.try_acquire_at(&data, start + Duration::from_secs(2)));
    }

    #[test]
    fn window_slides() {
        let limiter = limiter(1, "10s", None);
        let start = Instant::now();
        let data = json!({});

        assert!(limiter.try_acquire_at(&data, start));
        assert!(!limiter.try_acquire_at(&data, start + Duration::from_secs(9)));
        assert!(limiter.try_acquire_at(&data, start + Duration::from_secs(10)));
    }

    #[test]
    fn partitions_are_independent() {
        let limiter = limiter(1, "1h", Some("event.data.member_id"));
        let now = Instant::now();

        assert!(limiter.try_acquire_at(&json!({ "member_id": "a" }), now));
        assert!(limiter.try_acquire_at(&json!({ "member_id": "b" }), now));
        assert!(!limiter.try_acquire_at(&json!({ "member_id": "a" }), now));
        assert_eq!(limiter.partition(&json!({ "member_id": "a" })), "\"a\"");
        assert_eq!(limiter.partition(&json!({})), "");
    }

    #[test]
    fn expired_partitions_are_dropped() {
        let limiter = limiter(1, "1s", Some("event.data.member_id"));
        let start = Instant::now();

        for i in 0..1_000 {
            assert!(limiter.try_acquire_at(&json!({ "member_id": format!("m-{i}") }), start));
        }
        assert_eq!(limiter.tracked_partitions(), 1_000);

        let later = start + Duration::from_secs(3600);
        assert!(limiter.try_acquire_at(&json!({ "member_id": "m-late" }), later));
        assert_eq!(limiter.tracked_partitions(), 1);
        assert!(limiter.try_acquire_at(&json!({ "member_id": "m-0" }), later));
    }
}
