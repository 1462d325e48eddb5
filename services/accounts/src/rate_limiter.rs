//! Rate limiter for login, recovery and reset attempts

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Recorded attempts tolerated inside one window
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
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    window_started: Instant,
    ban_expires: Option<Instant>,
}

/// Per-key attempt counter with temporary bans.
///
/// Keys are namespaced by the caller, e.g. `login:<username>`. Callers decide
/// what counts: logins only record failures, recovery records every request.
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

    /// Whether `key` may attempt again. Does not count as an attempt.
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(ban_expires) = entries.get(key).map(|entry| entry.ban_expires) else {
            return true;
        };

        match ban_expires {
            Some(ban_expires) if now >= ban_expires => {
                entries.remove(key);
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    /// Count an attempt against `key`, banning it once the limit is reached
    pub async fn record(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            window_started: now,
            ban_expires: None,
        });

        if entry.ban_expires.is_some() {
            return;
        }

        if now.duration_since(entry.window_started) >= window {
            entry.attempts = 0;
            entry.window_started = now;
        }

        entry.attempts += 1;

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Forget a key after a successful attempt
    pub async fn clear(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}
