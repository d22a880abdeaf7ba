//! Coalescing cache service wrapping asynchronous fetch operations
//!
//! [`RequestCache`] owns the cache store and the pending-flight
//! registry. Construct one per process (or one per test) and share
//! clones freely; there is no hidden global state.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::flight::FlightGroup;
use crate::key;
use crate::store::CacheStore;
use crate::types::{CacheKey, CacheStats, CacheValue};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Request cache with single-flight deduplication
///
/// A fresh cache hit returns without suspending or invoking the
/// operation. A miss with an open flight for the same key joins that
/// flight. Otherwise the operation runs, and on success its result is
/// retained for the wrapper's TTL. Failures are never retained, so the
/// next call retries from scratch.
#[derive(Clone)]
pub struct RequestCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    config: CacheConfig,
    store: CacheStore,
    flights: FlightGroup<CacheValue>,
}

impl RequestCache {
    /// Create a new cache service with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!("initializing request cache: {:?}", config);

        Self {
            inner: Arc::new(CacheInner {
                store: CacheStore::new(config.clone()),
                flights: FlightGroup::new(),
                config,
            }),
        }
    }

    /// Wrap an async operation so results are cached for `ttl` and
    /// concurrent identical calls share one execution
    ///
    /// A zero `ttl` disables caching but not coalescing.
    pub fn wrap<F>(
        &self,
        namespace: impl Into<String>,
        operation: F,
        ttl: Duration,
    ) -> CachedOperation<F> {
        CachedOperation {
            cache: self.clone(),
            namespace: namespace.into(),
            ttl,
            operation,
        }
    }

    /// Like [`wrap`](RequestCache::wrap), using the configured default TTL
    pub fn wrap_default<F>(&self, namespace: impl Into<String>, operation: F) -> CachedOperation<F> {
        let ttl = self.inner.config.default_ttl;
        self.wrap(namespace, operation, ttl)
    }

    /// One-shot cached fetch without a pre-built wrapper
    pub async fn fetch<A, T, F, Fut>(
        &self,
        namespace: &str,
        args: &A,
        ttl: Duration,
        operation: F,
    ) -> Result<T>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key::build_key(namespace, args)?;
        self.fetch_with_key(key, ttl, operation).await
    }

    pub(crate) async fn fetch_with_key<T, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        operation: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !ttl.is_zero() {
            if let Some(value) = self.inner.store.get(&key).await {
                return from_value(value);
            }
        }

        // Constructing the future is free; it is only polled if this
        // caller ends up leading the flight.
        let fut = operation();
        let store = self.inner.store.clone();
        let store_key = key.clone();
        let value = self
            .inner
            .flights
            .execute(&key, move || async move {
                let fetched = fut.await?;
                let value = to_value(fetched)?;
                if !ttl.is_zero() {
                    store.set(store_key, value.clone(), ttl).await;
                }
                Ok(value)
            })
            .await?;

        from_value(value)
    }

    /// Remove the exact cache entry if present
    ///
    /// Never touches open flights: an invalidation racing an in-flight
    /// operation does not cancel it, and the operation's eventual
    /// success repopulates the cache.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.inner.store.invalidate(key).await
    }

    /// Remove every cache entry whose key matches the pattern
    pub async fn invalidate_matching(&self, pattern: &Regex) -> usize {
        self.inner.store.invalidate_matching(pattern).await
    }

    /// Remove all cache entries
    pub async fn clear(&self) -> usize {
        self.inner.store.clear().await
    }

    /// Snapshot of cache and coalescing statistics
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.inner.store.stats().await;
        stats.flights_started = self.inner.flights.started();
        stats.flights_joined = self.inner.flights.joined();
        stats.in_flight = self.inner.flights.len().await;
        stats
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// A cached, coalescing replacement for an async fetch function
///
/// Produced by [`RequestCache::wrap`]; call it through
/// [`call`](CachedOperation::call) wherever the bare operation was
/// called before.
#[derive(Clone)]
pub struct CachedOperation<F> {
    cache: RequestCache,
    namespace: String,
    ttl: Duration,
    operation: F,
}

impl<F> CachedOperation<F> {
    /// Invoke the wrapped operation through the cache
    pub async fn call<A, T, Fut>(&self, args: A) -> Result<T>
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        T: Serialize + DeserializeOwned + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key::build_key(&self.namespace, &args)?;
        self.cache
            .fetch_with_key(key, self.ttl, move || (self.operation)(args))
            .await
    }

    /// The namespace this wrapper caches under
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The TTL applied to successful results
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn to_value<T: Serialize>(value: T) -> Result<CacheValue> {
    serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: CacheValue) -> Result<T> {
    serde_json::from_value(value).map_err(|e| CacheError::Serialization(e.to_string()))
}
