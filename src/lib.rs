//! # fetch-cache
//!
//! Request caching and deduplication for asynchronous fetch operations.
//!
//! Wraps any async data-fetching function so that repeated calls within
//! a time-to-live are served from memory, and concurrent identical
//! calls share a single execution instead of each hitting the backend.
//!
//! ## Features
//!
//! - **TTL caching**: successful results are retained for a per-wrapper
//!   time-to-live, with staleness detected lazily on read
//! - **Single-flight coalescing**: any number of concurrent callers for
//!   the same logical request share one in-flight execution and observe
//!   the same outcome, success or failure
//! - **Canonical request keys**: identities derive from a namespace plus
//!   the canonical JSON encoding of the argument list, so equal calls
//!   always map to the same key
//! - **Invalidation**: by exact key, by regular-expression pattern, or
//!   a full clear
//! - **Bounded store**: LRU capacity eviction keeps memory in check
//! - **Async-first design using tokio**: no global state; one service
//!   value owns the store and the pending-flight registry
//!
//! Failures are never cached: a failed fetch is fully retryable on the
//! very next call. A zero TTL disables caching but keeps coalescing.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fetch_cache::{CacheConfig, RequestCache};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct WorkoutStats {
//!     sessions: u32,
//!     minutes: u32,
//! }
//!
//! async fn fetch_workout_stats(client_id: String) -> fetch_cache::Result<WorkoutStats> {
//!     // contact the remote data store here
//!     let _ = client_id;
//!     Ok(WorkoutStats { sessions: 12, minutes: 540 })
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = RequestCache::new(CacheConfig::default());
//!
//!     let workout_stats = cache.wrap(
//!         "workout-stats",
//!         fetch_workout_stats,
//!         Duration::from_secs(5),
//!     );
//!
//!     // Repeats within the TTL are served from the cache; concurrent
//!     // identical calls share one fetch.
//!     let stats: WorkoutStats = workout_stats.call("client-abc".to_string()).await?;
//!     println!("{} sessions", stats.sessions);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Invalidation
//!
//! After writing data that a cached read would otherwise keep serving,
//! drop the affected entries:
//!
//! ```no_run
//! # use fetch_cache::RequestCache;
//! # async fn after_workout_saved(cache: &RequestCache) {
//! let pattern = regex::Regex::new("^workout-stats:").unwrap();
//! cache.invalidate_matching(&pattern).await;
//! # }
//! ```
//!
//! Invalidation never cancels an in-flight fetch; its eventual success
//! simply repopulates the cache.

pub mod config;
pub mod entry;
pub mod error;
pub mod flight;
pub mod key;
pub mod service;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::CacheEntry;
pub use error::{CacheError, Result};
pub use flight::FlightGroup;
pub use key::{build_key, KeyBuilder};
pub use service::{CachedOperation, RequestCache};
pub use store::CacheStore;
pub use types::{CacheKey, CacheStats, CacheValue};
