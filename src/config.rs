//! Configuration for the cache

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the request cache
///
/// The TTL of a wrapped operation is chosen per wrapper; `default_ttl`
/// only applies when callers do not pick one explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL used by wrappers that do not specify their own
    pub default_ttl: Duration,

    /// Maximum number of entries held by the store
    /// Prevents unbounded memory growth over the process lifetime
    pub max_entries: usize,

    /// When true, reads refresh recency so capacity eviction targets the
    /// least recently used entry; when false, insertion order is used
    pub enable_lru_eviction: bool,

    /// TTL jitter factor (0.0 - 1.0)
    /// Adds random variation to entry lifetimes so entries written
    /// together do not all expire at the same instant
    pub ttl_jitter: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 5 minutes, a reasonable default for read-mostly dashboard data
            default_ttl: Duration::from_secs(300),
            max_entries: 10_000,
            enable_lru_eviction: true,
            // No jitter by default: an entry is valid for exactly its TTL
            ttl_jitter: 0.0,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::Config(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CacheError::Config(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply the configured jitter to a per-call TTL
    pub fn jittered_ttl(&self, ttl: Duration) -> Duration {
        if self.ttl_jitter == 0.0 || ttl.is_zero() {
            return ttl;
        }

        let base_secs = ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        Duration::from_secs_f64(final_secs)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
    enable_lru_eviction: Option<bool>,
    ttl_jitter: Option<f64>,
}

impl CacheConfigBuilder {
    /// Set the TTL used when a wrapper does not specify its own
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the maximum number of cache entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Enable or disable LRU recency tracking for capacity eviction
    pub fn enable_lru_eviction(mut self, enable: bool) -> Self {
        self.enable_lru_eviction = Some(enable);
        self
    }

    /// Set the TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            enable_lru_eviction: self
                .enable_lru_eviction
                .unwrap_or(defaults.enable_lru_eviction),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
        }
    }
}

/// Preset configurations for common data volatility profiles
impl CacheConfig {
    /// Rapidly changing data, e.g. live session state
    pub fn volatile() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            max_entries: 1_000,
            ttl_jitter: 0.1,
            ..Default::default()
        }
    }

    /// Read-mostly data refreshed every few minutes
    pub fn standard() -> Self {
        Self::default()
    }

    /// Reference data that changes rarely
    pub fn long_lived() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_entries: 50_000,
            ttl_jitter: 0.1,
            ..Default::default()
        }
    }
}
