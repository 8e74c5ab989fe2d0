//! Sliding-window request limiter

use crate::traits::RateLimiter;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::seconds(3600),
        }
    }
}

impl From<&crate::types::LoaderConfig> for RateLimitConfig {
    fn from(config: &crate::types::LoaderConfig) -> Self {
        Self {
            max_requests: config.max_requests_per_window,
            window: Duration::seconds(config.window_secs as i64),
        }
    }
}

/// Per-user timestamps kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    requests: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Drop users whose every request has left the window; returns how many were evicted
    pub fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        let before = requests.len();
        let window = self.config.window;
        requests.retain(|_, times| {
            times.retain(|&t| now - t < window);
            !times.is_empty()
        });
        let evicted = before - requests.len();
        if evicted > 0 {
            debug!("Rate limiter evicted {} idle users", evicted);
        }
        evicted
    }

    /// Requests currently counted against `user_id`
    pub fn usage(&self, user_id: &str) -> usize {
        let requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        requests.get(user_id).map(Vec::len).unwrap_or(0)
    }

    pub fn tracked_users(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check_and_record(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        let window = self.config.window;

        let times = requests.entry(user_id.to_string()).or_default();
        times.retain(|&t| now - t < window);

        if times.len() >= self.config.max_requests {
            warn!("Rate limit exceeded for user {}", user_id);
            return false;
        }

        times.push(now);
        debug!(
            "Request allowed for user {} ({}/{})",
            user_id,
            times.len(),
            self.config.max_requests
        );
        true
    }

    fn limits(&self) -> (usize, u64) {
        (
            self.config.max_requests,
            self.config.window.num_seconds().max(0) as u64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_eleventh_request_denied() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig::default());
        let now = start();

        for i in 0..10 {
            assert!(
                limiter.check_and_record("alice", now + Duration::seconds(i)),
                "request {} should pass",
                i + 1
            );
        }
        assert!(!limiter.check_and_record("alice", now + Duration::seconds(10)));
        assert_eq!(limiter.usage("alice"), 10);
    }

    #[test]
    fn test_users_are_independent() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig::default());
        let now = start();

        for _ in 0..10 {
            assert!(limiter.check_and_record("alice", now));
        }
        assert!(!limiter.check_and_record("alice", now));
        assert!(limiter.check_and_record("bob", now));
    }

    #[test]
    fn test_capacity_restored_after_window() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig::default());
        let now = start();

        for _ in 0..10 {
            assert!(limiter.check_and_record("alice", now));
        }
        assert!(!limiter.check_and_record("alice", now + Duration::seconds(3599)));
        assert!(limiter.check_and_record("alice", now + Duration::seconds(3600)));
        assert_eq!(limiter.usage("alice"), 1);
    }

    #[test]
    fn test_prune_idle_evicts_expired_users() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig::default());
        let now = start();

        limiter.check_and_record("alice", now);
        limiter.check_and_record("bob", now + Duration::seconds(1800));
        assert_eq!(limiter.tracked_users(), 2);

        let evicted = limiter.prune_idle(now + Duration::seconds(3600));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_users(), 1);
        assert_eq!(limiter.usage("alice"), 0);
        assert_eq!(limiter.usage("bob"), 1);
    }

    #[test]
    fn test_limits_reflect_config() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 3,
            window: Duration::seconds(60),
        });
        assert_eq!(limiter.limits(), (3, 60));
    }
}
