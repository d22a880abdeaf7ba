//! Cache entry management with TTL support

use crate::types::{CacheKey, CacheValue};
use std::time::Duration;
use tokio::time::Instant;

/// A timestamped value with an expiration window
///
/// Validity is evaluated lazily at read time: an entry is valid iff
/// less than `ttl` has elapsed since `stored_at`. Timestamps come from
/// `tokio::time`, so tests can drive expiry with the paused clock
/// instead of wall-clock sleeps.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// When the entry was written
    pub stored_at: Instant,

    /// Duration after which the entry is considered stale
    pub ttl: Duration,

    /// Last access time (for LRU tracking)
    pub last_accessed: Instant,

    /// Number of times this entry has been read
    pub access_count: u64,
}

impl CacheEntry {
    /// Create a new cache entry stamped with the current time
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            key,
            value,
            stored_at: now,
            ttl,
            last_accessed: now,
            access_count: 0,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }

    /// Time until expiration, `None` once the entry is stale
    pub fn remaining_ttl(&self) -> Option<Duration> {
        let elapsed = self.stored_at.elapsed();
        if elapsed >= self.ttl {
            None
        } else {
            Some(self.ttl - elapsed)
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count += 1;
    }

    /// Age of the entry
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}
