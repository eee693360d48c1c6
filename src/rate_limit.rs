use dashmap::DashMap;
use std::time::{Duration, Instant};

// Rate limit entry - tracks generation requests per user
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window limiter on provider calls. Cache hits never reach it.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        // window expired..? reset it
        if now.duration_since(entry.window_start) > self.window {
            entry.count = 1;
            entry.window_start = now;
            return true;
        }

        if entry.count < self.limit {
            entry.count += 1;
            return true;
        }

        false
    }

    /// Seconds until `key`'s current window closes, rounded up, never below 1.
    pub fn retry_after_secs(&self, key: &str) -> u64 {
        self.retry_after_at(key, Instant::now())
    }

    fn retry_after_at(&self, key: &str, now: Instant) -> u64 {
        let remaining = match self.entries.get(key) {
            Some(entry) => (entry.window_start + self.window).saturating_duration_since(now),
            None => self.window,
        };
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        secs.max(1)
    }
}
