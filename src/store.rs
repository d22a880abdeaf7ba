//! Keyed store of timestamped values with lazy expiration
//!
//! Staleness is only ever detected on read; there is no background
//! sweep. An entry disappears through an explicit write, an explicit
//! invalidation, a read that finds it stale, or capacity eviction.

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::types::{CacheKey, CacheStats, CacheValue};
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// TTL cache store with LRU capacity eviction
///
/// Thread-safe and cheaply clonable; clones share the same underlying
/// storage.
#[derive(Debug, Clone)]
pub struct CacheStore {
    config: CacheConfig,
    inner: Arc<RwLock<StoreInner>>,
}

/// Internal cache storage
#[derive(Debug)]
struct StoreInner {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Recency tracking for capacity eviction
    lru_queue: VecDeque<CacheKey>,

    /// Current cache statistics
    stats: CacheStats,
}

impl CacheStore {
    /// Create a new store with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        debug!("initializing cache store with config: {:?}", config);

        let inner = StoreInner {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: CacheStats::default(),
        };

        Self {
            config,
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Get a fresh value, reclaiming the slot if the entry went stale
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                inner.stats.misses += 1;
                debug!("cache miss: {}", key);
                return None;
            }
        };

        if expired {
            inner.stats.misses += 1;
            inner.stats.evictions_ttl += 1;
            remove_entry(inner, key);
            debug!("cache entry expired: {}", key);
            return None;
        }

        let value = match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.mark_accessed();
                entry.value.clone()
            }
            None => return None,
        };

        inner.stats.hits += 1;
        if self.config.enable_lru_eviction {
            touch_lru(inner, key);
        }

        debug!("cache hit: {}", key);
        Some(value)
    }

    /// Write a value, overwriting any previous entry for the key
    ///
    /// A zero TTL disables caching for this call: nothing is retained
    /// and any previous entry for the key is dropped.
    pub async fn set(&self, key: CacheKey, value: CacheValue, ttl: Duration) {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        if ttl.is_zero() {
            remove_entry(inner, &key);
            debug!("zero ttl, not retaining entry: {}", key);
            return;
        }

        let ttl = self.config.jittered_ttl(ttl);
        let entry = CacheEntry::new(key.clone(), value, ttl);

        if inner.entries.contains_key(&key) {
            debug!("updating cache entry: {}", key);
            inner.entries.insert(key.clone(), entry);
            inner.lru_queue.retain(|k| k != &key);
        } else {
            evict_if_needed(inner, self.config.max_entries);
            debug!("inserting cache entry: {}", key);
            inner.entries.insert(key.clone(), entry);
        }

        inner.lru_queue.push_back(key);
        inner.stats.entries = inner.entries.len();
    }

    /// Remove the exact entry if present; no-op otherwise
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        if inner.entries.contains_key(key) {
            remove_entry(inner, key);
            inner.stats.invalidations += 1;
            debug!("invalidated cache entry: {}", key);
            true
        } else {
            false
        }
    }

    /// Remove every entry whose key matches the pattern
    ///
    /// Linear scan over all keys; matching nothing is not an error.
    pub async fn invalidate_matching(&self, pattern: &Regex) -> usize {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let matched: Vec<CacheKey> = inner
            .entries
            .keys()
            .filter(|k| pattern.is_match(k))
            .cloned()
            .collect();

        for key in &matched {
            remove_entry(inner, key);
        }

        inner.stats.invalidations += matched.len() as u64;
        info!(
            "invalidated {} entries matching pattern: {}",
            matched.len(),
            pattern
        );

        matched.len()
    }

    /// Remove all entries
    pub async fn clear(&self) -> usize {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let count = inner.entries.len();
        inner.entries.clear();
        inner.lru_queue.clear();
        inner.stats.entries = 0;
        inner.stats.invalidations += count as u64;

        info!("cleared {} entries from cache", count);
        count
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        inner.stats.clone()
    }

    /// Number of entries in the store
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.entries.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        let inner = self.inner.read().await;
        inner.entries.is_empty()
    }
}

/// Remove an entry and its recency slot
fn remove_entry(inner: &mut StoreInner, key: &str) {
    if inner.entries.remove(key).is_some() {
        inner.lru_queue.retain(|k| k != key);
        inner.stats.entries = inner.entries.len();
    }
}

/// Move a key to the most recently used position
fn touch_lru(inner: &mut StoreInner, key: &str) {
    inner.lru_queue.retain(|k| k != key);
    inner.lru_queue.push_back(key.to_string());
}

/// Evict least recently used entries until there is room for one more
fn evict_if_needed(inner: &mut StoreInner, max_entries: usize) {
    while inner.entries.len() >= max_entries {
        let Some(key) = inner.lru_queue.pop_front() else {
            break;
        };
        debug!("evicting entry at capacity: {}", key);
        inner.entries.remove(&key);
        inner.stats.evictions_lru += 1;
    }
    inner.stats.entries = inner.entries.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(max_entries: usize) -> CacheStore {
        CacheStore::new(
            CacheConfig::builder()
                .max_entries(max_entries)
                .build(),
        )
    }

    #[tokio::test]
    async fn test_basic_set_and_get() {
        let store = store_with(100);

        store
            .set("key1".to_string(), json!("value1"), Duration::from_secs(60))
            .await;

        let value = store.get("key1").await;
        assert_eq!(value, Some(json!("value1")));

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_never_written_key_misses() {
        let store = store_with(100);

        assert_eq!(store.get("nonexistent").await, None);

        let stats = store.stats().await;
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiration_reclaims_slot() {
        let store = store_with(100);

        store
            .set("key1".to_string(), json!("value1"), Duration::from_millis(100))
            .await;
        assert!(store.get("key1").await.is_some());

        tokio::time::advance(Duration::from_millis(100)).await;

        assert_eq!(store.get("key1").await, None);
        assert_eq!(store.len().await, 0);

        // No lingering state after the stale read
        assert_eq!(store.get("key1").await, None);
        let stats = store.stats().await;
        assert_eq!(stats.evictions_ttl, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_not_retained() {
        let store = store_with(100);

        store
            .set("key1".to_string(), json!("value1"), Duration::ZERO)
            .await;

        assert_eq!(store.get("key1").await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_drops_previous_entry() {
        let store = store_with(100);

        store
            .set("key1".to_string(), json!("old"), Duration::from_secs(60))
            .await;
        store
            .set("key1".to_string(), json!("new"), Duration::ZERO)
            .await;

        assert_eq!(store.get("key1").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_timestamp() {
        let store = store_with(100);

        store
            .set("key1".to_string(), json!("old"), Duration::from_millis(100))
            .await;

        tokio::time::advance(Duration::from_millis(80)).await;
        store
            .set("key1".to_string(), json!("new"), Duration::from_millis(100))
            .await;

        tokio::time::advance(Duration::from_millis(80)).await;
        assert_eq!(store.get("key1").await, Some(json!("new")));
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = store_with(3);

        store.set("key1".to_string(), json!(1), Duration::from_secs(60)).await;
        store.set("key2".to_string(), json!(2), Duration::from_secs(60)).await;
        store.set("key3".to_string(), json!(3), Duration::from_secs(60)).await;

        // Touch key1 so key2 becomes the eviction candidate
        store.get("key1").await;

        store.set("key4".to_string(), json!(4), Duration::from_secs(60)).await;

        assert!(store.get("key2").await.is_none());
        assert!(store.get("key1").await.is_some());
        assert!(store.get("key3").await.is_some());
        assert!(store.get("key4").await.is_some());

        let stats = store.stats().await;
        assert_eq!(stats.evictions_lru, 1);
    }

    #[tokio::test]
    async fn test_invalidate_exact() {
        let store = store_with(100);

        store.set("key1".to_string(), json!(1), Duration::from_secs(60)).await;

        assert!(store.invalidate("key1").await);
        assert!(!store.invalidate("key1").await);
        assert_eq!(store.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_matching() {
        let store = store_with(100);

        store
            .set("stats:workouts:abc".to_string(), json!(1), Duration::from_secs(60))
            .await;
        store
            .set("stats:activities:abc".to_string(), json!(2), Duration::from_secs(60))
            .await;

        let pattern = Regex::new("stats:workouts:.*").unwrap();
        let removed = store.invalidate_matching(&pattern).await;

        assert_eq!(removed, 1);
        assert_eq!(store.get("stats:workouts:abc").await, None);
        assert_eq!(store.get("stats:activities:abc").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_invalidate_matching_nothing() {
        let store = store_with(100);
        let pattern = Regex::new("^absent:.*").unwrap();
        assert_eq!(store.invalidate_matching(&pattern).await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = store_with(100);

        store.set("key1".to_string(), json!(1), Duration::from_secs(60)).await;
        store.set("key2".to_string(), json!(2), Duration::from_secs(60)).await;

        assert_eq!(store.clear().await, 2);
        assert!(store.is_empty().await);
    }
}
