//! Per-client request throttling
//!
//! Fixed-window counters keyed by client (usually the peer IP address).
//! Each client gets `max_requests` per `window`; the counter starts over
//! when the window that began with the client's first request expires.
//!
//! # Example
//!
//! ```rust
//! use catalog_core::rate_limit::{RateLimitConfig, RateLimiter};
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new(RateLimitConfig::new(2, Duration::from_secs(60)));
//!
//! assert!(limiter.check("10.0.0.1").allowed);
//! assert!(limiter.check("10.0.0.1").allowed);
//! assert!(!limiter.check("10.0.0.1").allowed);
//! assert!(limiter.check("10.0.0.2").allowed);
//! ```

use crate::config::RateLimitSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&RateLimitSettings::default())
    }
}

impl RateLimitConfig {
    /// Create a limit of `max_requests` per `window`
    #[must_use] pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Per-minute rate limit
    #[must_use] pub fn per_minute(max: u32) -> Self {
        Self::new(max, Duration::from_secs(60))
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self::new(settings.max_requests, Duration::from_millis(settings.window_ms))
    }
}

/// Outcome of a single rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Configured requests per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Time until the current window ends
    pub reset_after: Duration,
}

/// Counter for one client
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self { started: now, count: 0 }
    }

    fn is_expired(&self, now: Instant, length: Duration) -> bool {
        now.duration_since(self.started) >= length
    }
}

/// Fixed-window rate limiter shared across connections
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use] pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Active configuration
    #[must_use] pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `key` and decide whether it may proceed
    #[must_use] pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        // Handle poisoned lock by recovering the data (still valid even after panic)
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| Window::new(now));

        if window.is_expired(now, self.config.window) {
            *window = Window::new(now);
        }

        let allowed = window.count < self.config.max_requests;
        if allowed {
            window.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_after: self
                .config
                .window
                .saturating_sub(now.duration_since(window.started)),
        }
    }

    /// Drop windows that have expired; returns how many were removed
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();
        windows.retain(|_, w| !w.is_expired(now, self.config.window));
        before - windows.len()
    }

    /// Number of clients currently tracked
    #[must_use] pub fn tracked_clients(&self) -> usize {
        self.windows.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Reset rate limit for a key
    pub fn reset(&self, key: &str) {
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows.remove(key);
    }

    /// Reset all rate limits
    pub fn reset_all(&self) {
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::new(max_requests, window))
    }

    #[test]
    fn test_rate_limiter_basic() {
        let limiter = limiter(3, Duration::from_secs(60));

        assert!(limiter.check("test").allowed);
        assert!(limiter.check("test").allowed);
        let third = limiter.check("test");
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);
        assert!(!limiter.check("test").allowed); // Should be rate limited
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = limiter(5, Duration::from_secs(60));
        let first = limiter.check("ip");
        assert_eq!(first.limit, 5);
        assert_eq!(first.remaining, 4);
        assert!(first.reset_after <= Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limiter_different_keys() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.check("key1").allowed);
        assert!(!limiter.check("key1").allowed);
        assert!(limiter.check("key2").allowed); // Different key should work
    }

    #[test]
    fn test_window_expiry_restores_quota() {
        let limiter = limiter(1, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("ip", start).allowed);
        assert!(!limiter.check_at("ip", start + Duration::from_secs(9)).allowed);

        let later = limiter.check_at("ip", start + Duration::from_secs(10));
        assert!(later.allowed);
        assert_eq!(later.reset_after, Duration::from_secs(10));
    }

    #[test]
    fn test_rate_limiter_reset() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.check("test").allowed);
        assert!(!limiter.check("test").allowed);

        limiter.reset("test");
        assert!(limiter.check("test").allowed);

        limiter.reset_all();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_prune_expired() {
        let limiter = limiter(10, Duration::from_millis(1));
        let _ = limiter.check("a");
        let _ = limiter.check("b");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(limiter.prune_expired(), 2);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_config_from_settings() {
        let config = RateLimitConfig::from(&RateLimitSettings {
            max_requests: 7,
            window_ms: 1500,
        });
        assert_eq!(config.max_requests, 7);
        assert_eq!(config.window, Duration::from_millis(1500));
    }

    #[test]
    fn test_clones_share_state() {
        let limiter = limiter(1, Duration::from_secs(60));
        let clone = limiter.clone();
        assert!(limiter.check("ip").allowed);
        assert!(!clone.check("ip").allowed);
    }
}
