use serde::{Deserialize, Serialize};
use shared_lru::{LruCache, MemoryStore, Store};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    value: String,
}

fn payload(value: &str) -> Payload {
    Payload {
        value: value.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_default_ttl() {
    let cache = LruCache::new(MemoryStore::new(), 10, Duration::from_secs(60))
        .await
        .unwrap();
    cache.insert("k", &payload("v"), None).await.unwrap();

    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(cache.get::<Payload>("k").await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(cache.get::<Payload>("k").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_per_entry_ttl_overrides_default() {
    let cache = LruCache::new(MemoryStore::new(), 10, Duration::from_secs(3600))
        .await
        .unwrap();
    cache
        .insert("short", &payload("v"), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    cache.insert("long", &payload("v"), None).await.unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(cache.get::<Payload>("short").await.unwrap().is_none());
    assert!(cache.get::<Payload>("long").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_reinsert_refreshes_ttl() {
    let cache = LruCache::new(MemoryStore::new(), 10, Duration::from_secs(10))
        .await
        .unwrap();
    cache.insert("k", &payload("v1"), None).await.unwrap();

    tokio::time::advance(Duration::from_secs(8)).await;
    cache.insert("k", &payload("v2"), None).await.unwrap();

    tokio::time::advance(Duration::from_secs(8)).await;
    let value: Option<Payload> = cache.get("k").await.unwrap();
    assert_eq!(value, Some(payload("v2")));
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_task_sweeps_expired_entries() {
    let store = MemoryStore::new();
    let handle = store.spawn_cleanup(Duration::from_secs(60));

    let cache = LruCache::new(store.clone(), 10, Duration::from_secs(30))
        .await
        .unwrap();
    cache.insert("k", &payload("v"), None).await.unwrap();

    // Past the entry TTL and past one sweep interval.
    tokio::time::advance(Duration::from_secs(61)).await;
    // Let the cleanup task run its tick.
    tokio::task::yield_now().await;

    assert!(!store.exists("lru_cache:data:k").await.unwrap());
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_size_counter_recovers_after_backend_expiry() {
    // Every entry expires backend-side, leaving the counter at max while
    // the recency list still names dead keys; getting them prunes nothing
    // but inserting at capacity must still succeed.
    let store = MemoryStore::new();
    let cache = LruCache::new(store.clone(), 2, Duration::from_secs(5))
        .await
        .unwrap();
    cache.insert("a", &payload("a"), None).await.unwrap();
    cache.insert("b", &payload("b"), None).await.unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(cache.get::<Payload>("a").await.unwrap().is_none());
    assert!(cache.get::<Payload>("b").await.unwrap().is_none());

    cache.insert("c", &payload("c"), None).await.unwrap();
    assert!(cache.get::<Payload>("c").await.unwrap().is_some());
}
