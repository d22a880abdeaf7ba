//! Demo: wrapping a simulated backend fetch for a client dashboard
//!
//! Run with: cargo run --example dashboard

use fetch_cache::{CacheConfig, RequestCache};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkoutStats {
    client_id: String,
    sessions: u32,
    minutes: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("fetch_cache=debug")
        .init();

    let cache = RequestCache::new(CacheConfig::default());
    let backend_calls = Arc::new(AtomicU32::new(0));

    let calls = Arc::clone(&backend_calls);
    let fetch_stats = move |client_id: String| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::Relaxed);
            // Simulated backend round-trip
            sleep(Duration::from_millis(120)).await;
            Ok(WorkoutStats {
                client_id,
                sessions: 12,
                minutes: 540,
            })
        }
    };

    let workout_stats = cache.wrap("workout-stats", fetch_stats, Duration::from_secs(5));

    // A dashboard rendering several widgets at once asks for the same
    // data concurrently; only one backend call goes out.
    let (summary, chart, streak) = tokio::join!(
        workout_stats.call("client-abc".to_string()),
        workout_stats.call("client-abc".to_string()),
        workout_stats.call("client-abc".to_string()),
    );
    let stats = summary?;
    chart?;
    streak?;
    println!(
        "sessions this month: {} ({} minutes)",
        stats.sessions, stats.minutes
    );
    println!(
        "backend calls so far: {}",
        backend_calls.load(Ordering::Relaxed)
    );

    // A refresh within the TTL is served from memory
    workout_stats.call("client-abc".to_string()).await?;
    println!(
        "backend calls after refresh: {}",
        backend_calls.load(Ordering::Relaxed)
    );

    // After saving a workout the cached reads are dropped
    let pattern = regex::Regex::new("^workout-stats:")?;
    cache.invalidate_matching(&pattern).await;
    workout_stats.call("client-abc".to_string()).await?;
    println!(
        "backend calls after invalidation: {}",
        backend_calls.load(Ordering::Relaxed)
    );

    println!("{}", cache.stats().await);
    Ok(())
}
