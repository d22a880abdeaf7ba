//! Core type definitions for the cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - a deterministic string identity for a logical request
pub type CacheKey = String;

/// Cache value type - results are stored in their canonical JSON form
pub type CacheValue = serde_json::Value;

/// Statistics and counters for cache and coalescing behavior
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Number of entries currently in the cache
    pub entries: usize,

    /// Number of manual invalidations (by key, pattern, or clear)
    pub invalidations: u64,

    /// Number of entries reclaimed after their TTL elapsed
    pub evictions_ttl: u64,

    /// Number of entries evicted to stay within the capacity bound
    pub evictions_lru: u64,

    /// Number of fetches actually started
    pub flights_started: u64,

    /// Number of callers that joined an already in-flight fetch
    pub flights_joined: u64,

    /// Number of fetches currently in flight
    pub in_flight: usize,
}

impl CacheStats {
    /// Cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Cache miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }

    /// Total evictions, TTL and capacity combined
    pub fn total_evictions(&self) -> u64 {
        self.evictions_ttl + self.evictions_lru
    }

    /// Share of calls that were absorbed by an existing flight (0.0 - 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        let total = self.flights_started + self.flights_joined;
        if total == 0 {
            0.0
        } else {
            self.flights_joined as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, evictions: {}, flights: {} started / {} joined }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.total_evictions(),
            self.flights_started,
            self.flights_joined
        )
    }
}
