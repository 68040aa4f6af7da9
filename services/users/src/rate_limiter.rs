//! Fixed-window rate limiter keyed by client IP

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 900, // 15 minutes
        }
    }
}

impl RateLimiterConfig {
    fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted; `remaining` requests left in the window
    Allowed { remaining: u32 },
    /// Request rejected until the window resets
    Limited { retry_after: Duration },
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Requests counted in the current window
    hits: u32,
    /// Start of the current window
    window_start: Instant,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Rate limiter configuration
    config: RateLimiterConfig,
    /// Rate limiter entries
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

    /// Count a request for `key` and decide whether to admit it
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = self.config.window();

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            hits: 0,
            window_start: now,
        });

        // Window expired, start a new one
        if now.duration_since(entry.window_start) >= window {
            entry.hits = 0;
            entry.window_start = now;
        }

        if entry.hits >= self.config.max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            debug!("Rate limit exceeded for {}", key);
            return RateLimitDecision::Limited { retry_after };
        }

        entry.hits += 1;
        RateLimitDecision::Allowed {
            remaining: self.config.max_requests - entry.hits,
        }
    }

    /// Drop entries whose window has ended. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = self.config.window();
        let before = entries.len();

        entries.retain(|_, entry| now.duration_since(entry.window_start) < window);
        before - entries.len()
    }

    /// Purge expired entries once per window for the lifetime of the process
    pub fn spawn_purge_task(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.config.window());
            loop {
                interval.tick().await;
                let purged = limiter.purge_expired().await;
                if purged > 0 {
                    info!("Purged {} expired rate limiter entries", purged);
                }
            }
        })
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
