//! Single-flight deduplication for concurrent identical fetches
//!
//! The first caller for a key becomes the leader: its operation is
//! spawned onto the runtime and registered as the key's shared flight.
//! Callers arriving before the flight settles join it instead of
//! invoking their own operation, so every one of them observes the same
//! success value or the same failure. The registration is removed
//! exactly once, when the flight settles, success and failure alike.

use crate::error::{CacheError, Result};
use crate::types::CacheKey;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type SharedFlight<T> = Shared<BoxFuture<'static, Result<T>>>;

/// De-duplicates concurrent executions of the same logical request
pub struct FlightGroup<T> {
    inflight: Arc<Mutex<HashMap<CacheKey, SharedFlight<T>>>>,
    started: AtomicU64,
    joined: AtomicU64,
}

impl<T> FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty flight group
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            started: AtomicU64::new(0),
            joined: AtomicU64::new(0),
        }
    }

    /// Run `operation` at most once per key while a flight is open
    ///
    /// The check-and-insert is a single critical section, so a race to
    /// start a flight for the same key resolves to exactly one leader.
    /// The leader's operation is spawned as a task and settles even if
    /// every caller is dropped mid-await; joiners share its outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn execute<F, Fut>(&self, key: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some(flight) => {
                    self.joined.fetch_add(1, Ordering::Relaxed);
                    debug!("joining in-flight fetch: {}", key);
                    flight.clone()
                }
                None => {
                    self.started.fetch_add(1, Ordering::Relaxed);
                    debug!("starting fetch: {}", key);

                    let task = tokio::spawn(operation());
                    let registry = Arc::clone(&self.inflight);
                    let owned_key = key.to_string();

                    let flight = async move {
                        let result = match task.await {
                            Ok(result) => result,
                            Err(err) => {
                                Err(CacheError::Fetch(format!("fetch task aborted: {}", err)))
                            }
                        };
                        registry.lock().await.remove(&owned_key);
                        result
                    }
                    .boxed()
                    .shared();

                    inflight.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Number of flights currently open
    pub async fn len(&self) -> usize {
        self.inflight.lock().await.len()
    }

    /// Check if no flight is open
    pub async fn is_empty(&self) -> bool {
        self.inflight.lock().await.is_empty()
    }

    /// Number of fetches actually started
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Number of callers that joined an existing flight
    pub fn joined(&self) -> u64 {
        self.joined.load(Ordering::Relaxed)
    }
}

impl<T> Default for FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_single_caller() {
        let flights = FlightGroup::<u32>::new();
        let counter = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&counter);
        let result = flights
            .execute("key", move || async move {
                c.fetch_add(1, Ordering::Relaxed);
                Ok(42)
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert!(flights.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let flights = Arc::new(FlightGroup::<u32>::new());
        let fetch_count = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let flights = Arc::clone(&flights);
            let fetch_count = Arc::clone(&fetch_count);

            handles.push(tokio::spawn(async move {
                flights
                    .execute("shared", move || {
                        let fc = Arc::clone(&fetch_count);
                        async move {
                            fc.fetch_add(1, Ordering::Relaxed);
                            sleep(Duration::from_millis(100)).await;
                            Ok(42)
                        }
                    })
                    .await
            }));
        }

        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert!(results.iter().all(|r| *r == Ok(42)));
        assert_eq!(fetch_count.load(Ordering::Relaxed), 1);
        assert_eq!(flights.started(), 1);
        assert_eq!(flights.joined(), 9);
        assert!(flights.is_empty().await);
    }

    #[tokio::test]
    async fn test_different_keys_not_coalesced() {
        let flights = FlightGroup::<u32>::new();
        let counter = Arc::new(AtomicU32::new(0));

        for i in 0..3 {
            let c = Arc::clone(&counter);
            let result = flights
                .execute(&format!("key-{}", i), move || async move {
                    c.fetch_add(1, Ordering::Relaxed);
                    Ok(i)
                })
                .await;
            assert_eq!(result, Ok(i));
        }

        assert_eq!(counter.load(Ordering::Relaxed), 3);
        assert_eq!(flights.started(), 3);
        assert_eq!(flights.joined(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_shared_and_registry_cleared() {
        let flights = Arc::new(FlightGroup::<u32>::new());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let flights = Arc::clone(&flights);
            handles.push(tokio::spawn(async move {
                flights
                    .execute("failing", || async {
                        sleep(Duration::from_millis(50)).await;
                        Err(CacheError::Fetch("503 service unavailable".to_string()))
                    })
                    .await
            }));
        }

        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let expected = Err(CacheError::Fetch("503 service unavailable".to_string()));
        assert!(results.iter().all(|r| *r == expected));
        assert!(flights.is_empty().await);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_separately() {
        let flights = FlightGroup::<u32>::new();
        let counter = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let c = Arc::clone(&counter);
            flights
                .execute("key", move || async move {
                    c.fetch_add(1, Ordering::Relaxed);
                    Ok(1)
                })
                .await
                .unwrap();
        }

        assert_eq!(counter.load(Ordering::Relaxed), 2);
        assert_eq!(flights.started(), 2);
    }
}
