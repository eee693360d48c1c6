use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};

// Default lifetime of a cached strategy
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// Hex digest of the normalized "industry:objective" pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(industry: &str, objective: &str) -> Self {
        let combined = format!(
            "{}:{}",
            industry.trim().to_lowercase(),
            objective.trim().to_lowercase()
        );
        let mut hasher = Sha256::new();
        hasher.update(combined.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Cached strategy with timestamp
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub strategy: String,
    pub created_at: DateTime<Utc>,
    pub hit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub total_entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub hit_ratio: f64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// In-memory TTL cache for generated strategies.
///
/// Expired entries are swept lazily: at the start of [`lookup`](Self::lookup)
/// and [`stats`](Self::stats) and at the end of [`store`](Self::store). There
/// is no background reaper and no size bound, so the map can hold dead
/// entries until the next call touches it.
///
/// Map and counters sit behind one lock; every public method holds it for
/// its whole body.
pub struct StrategyCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    inner: Mutex<CacheInner>,
}

impl StrategyCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        // a TTL too large for chrono never expires anything
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self {
            ttl,
            clock,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Returns a copy of the live entry for this pair, counting the hit,
    /// or `None` after counting a miss.
    pub fn lookup(&self, industry: &str, objective: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        self.sweep(inner, now);

        let key = CacheKey::new(industry, objective);
        let ttl = self.ttl;

        if let Some(entry) = inner.entries.get_mut(&key) {
            if !is_expired(entry, ttl, now) {
                entry.hit_count += 1;
                let found = entry.clone();
                inner.hits += 1;
                debug!(key = key.as_str(), hit = found.hit_count, "cache HIT");
                return Some(found);
            }
            inner.entries.remove(&key);
        }

        inner.misses += 1;
        debug!(key = key.as_str(), "cache MISS");
        None
    }

    pub fn store(&self, industry: &str, objective: &str, strategy: impl Into<String>) {
        let now = self.clock.now();
        let key = CacheKey::new(industry, objective);
        let mut inner = self.inner.lock();

        debug!(key = key.as_str(), "cache SET");
        inner.entries.insert(
            key,
            CacheEntry {
                strategy: strategy.into(),
                created_at: now,
                hit_count: 0,
            },
        );

        self.sweep(&mut inner, now);
    }

    pub fn stats(&self) -> CacheStatistics {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.sweep(&mut inner, now);

        let total_requests = inner.hits + inner.misses;
        let hit_ratio = if total_requests > 0 {
            round3(inner.hits as f64 / total_requests as f64)
        } else {
            0.0
        };

        let timestamps = inner.entries.values().map(|e| e.created_at);
        CacheStatistics {
            total_entries: inner.entries.len(),
            cache_hits: inner.hits,
            cache_misses: inner.misses,
            hit_ratio,
            oldest_entry: timestamps.clone().min(),
            newest_entry: timestamps.max(),
        }
    }

    /// Drops every entry, expired or not. Lifetime hit/miss counters are
    /// left as they are.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        info!(removed = count, "cache CLEARED");
        count
    }

    fn sweep(&self, inner: &mut CacheInner, now: DateTime<Utc>) {
        let ttl = self.ttl;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !is_expired(entry, ttl, now));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed, "expired cache entries swept");
        }
    }
}

impl Default for StrategyCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn is_expired(entry: &CacheEntry, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
    match entry.created_at.checked_add_signed(ttl) {
        Some(expires_at) => now > expires_at,
        None => false,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
