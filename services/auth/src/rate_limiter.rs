//! Rate limiter for preventing brute force attacks
//!
//! Failures are counted per key (`login:<email>`, `otp:<purpose>:<email>`, ...)
//! inside a sliding window. Reaching the limit locks the key out until the
//! ban expires. A success resets the key.

use common::settings::AuthConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of failed attempts allowed
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

impl RateLimiterConfig {
    pub fn from_settings(settings: &AuthConfig) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            window_seconds: settings.attempt_window_seconds,
            ban_duration_seconds: settings.lockout_seconds,
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    /// Failures in the current window
    failures: u32,
    /// Start of the current window
    window_start: Instant,
    ban_expires: Option<Instant>,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` may attempt the action right now
    pub async fn check(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get_mut(key) else {
            return true;
        };

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entries.remove(key);
                return true;
            }
            return false;
        }

        true
    }

    /// Count a failed attempt, locking the key out once the limit is hit
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            failures: 0,
            window_start: now,
            ban_expires: None,
        });

        if entry.ban_expires.is_some() {
            return;
        }

        if now.duration_since(entry.window_start) >= window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Locked out key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Forget all failures of `key`
    pub async fn reset(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            info!("Reset attempt counter for key {}", key);
        }
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32, ban: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 300,
            ban_duration_seconds: ban,
        })
    }

    #[tokio::test]
    async fn test_locks_out_after_max_failures() {
        let limiter = limiter(3, 60);
        for _ in 0..2 {
            limiter.record_failure("login:a@b.co").await;
            assert!(limiter.check("login:a@b.co").await);
        }
        limiter.record_failure("login:a@b.co").await;
        assert!(!limiter.check("login:a@b.co").await);
        assert!(limiter.check("login:other@b.co").await);
    }

    #[tokio::test]
    async fn test_reset_clears_failures() {
        let limiter = limiter(2, 60);
        limiter.record_failure("k").await;
        limiter.reset("k").await;
        limiter.record_failure("k").await;
        assert!(limiter.check("k").await);
    }

    #[tokio::test]
    async fn test_ban_expires() {
        let limiter = limiter(1, 0);
        limiter.record_failure("k").await;
        assert!(limiter.check("k").await);
    }
}
