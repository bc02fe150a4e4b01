use crate::domain::model::CacheStats;
use crate::domain::ports::Store;
use crate::utils::error::{CacheError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DATA_PREFIX: &str = "lru_cache:data:";
const KEYS_LIST: &str = "lru_cache:keys";
const SIZE_KEY: &str = "lru_cache:size";

pub const DEFAULT_MAX_SIZE: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// LRU cache whose entries live in a [`Store`], so every task (and with
/// a networked backend, every process) holding a handle to the same
/// store shares one cache. Entries are JSON-encoded and written with a
/// TTL; recency is tracked in a store-side list with the
/// least-recently-used key at the head.
pub struct LruCache<S: Store> {
    store: S,
    max_size: usize,
    default_ttl: Duration,
}

impl<S: Store> LruCache<S> {
    /// Create a cache over `store`. Initializes the shared size counter
    /// when no other cache instance has done so yet.
    pub async fn new(store: S, max_size: usize, default_ttl: Duration) -> Result<Self> {
        if !store.exists(SIZE_KEY).await? {
            store.set(SIZE_KEY, b"0", None).await?;
        }
        Ok(Self {
            store,
            max_size,
            default_ttl,
        })
    }

    pub async fn with_defaults(store: S) -> Result<Self> {
        Self::new(store, DEFAULT_MAX_SIZE, DEFAULT_TTL).await
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn data_key(key: &str) -> String {
        format!("{}{}", DATA_PREFIX, key)
    }

    async fn read_size(&self) -> Result<usize> {
        let size = match self.store.get(SIZE_KEY).await? {
            Some(bytes) => {
                let text =
                    String::from_utf8(bytes).map_err(|e| CacheError::CorruptDataError {
                        key: SIZE_KEY.to_string(),
                        reason: format!("size counter is not UTF-8: {}", e),
                    })?;
                text.parse::<usize>()
                    .map_err(|e| CacheError::CorruptDataError {
                        key: SIZE_KEY.to_string(),
                        reason: format!("size counter is not a number: {}", e),
                    })?
            }
            None => 0,
        };
        Ok(size)
    }

    /// Get a value, repositioning the key as most recently used on a hit.
    /// A miss is `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let data_key = Self::data_key(key);

        if !self.store.exists(&data_key).await? {
            return Ok(None);
        }

        // Move the key to the tail of the recency list.
        let mut pipe = self.store.pipeline();
        pipe.lrem(KEYS_LIST, 1, key);
        pipe.rpush(KEYS_LIST, &[key.to_string()]);
        pipe.execute().await?;

        match self.store.get(&data_key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            // The entry can expire between the exists check and the read.
            None => Ok(None),
        }
    }

    /// Insert a value under `key`, evicting the least recently used entry
    /// when a new key would exceed capacity. `ttl` falls back to the
    /// cache default.
    pub async fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let data_key = Self::data_key(key);
        let bytes = serde_json::to_vec(value)?;

        let mut pipe = self.store.pipeline();

        if !self.store.exists(&data_key).await? {
            let current_size = self.read_size().await?;
            let mut evicted = false;

            if current_size >= self.max_size {
                match self.store.lindex(KEYS_LIST, 0).await? {
                    Some(oldest) => {
                        tracing::debug!(key = %oldest, "evicting least recently used entry");
                        pipe.lrem(KEYS_LIST, 1, &oldest);
                        pipe.delete(&Self::data_key(&oldest));
                        evicted = true;
                    }
                    // Recency list drifted from the counter (backend-side
                    // TTL expiry); reset and let the counter rebuild.
                    None => pipe.set(SIZE_KEY, b"0", None),
                }
            }

            // Evicting and inserting is net zero for the counter.
            if !evicted {
                pipe.incr(SIZE_KEY);
            }
        } else {
            pipe.lrem(KEYS_LIST, 1, key);
        }

        pipe.rpush(KEYS_LIST, &[key.to_string()]);
        pipe.setex(&data_key, ttl.unwrap_or(self.default_ttl), &bytes);
        pipe.execute().await
    }

    /// Remove a key. Returns `Ok(false)` when it was not cached.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let data_key = Self::data_key(key);

        if !self.store.exists(&data_key).await? {
            return Ok(false);
        }

        let mut pipe = self.store.pipeline();
        pipe.delete(&data_key);
        pipe.lrem(KEYS_LIST, 1, key);
        pipe.decr(SIZE_KEY);
        pipe.execute().await?;

        Ok(true)
    }

    /// Drop every entry and reset the bookkeeping keys.
    pub async fn clear(&self) -> Result<()> {
        let keys = self.store.lrange(KEYS_LIST, 0, -1).await?;

        let mut pipe = self.store.pipeline();
        for key in &keys {
            pipe.delete(&Self::data_key(key));
        }
        pipe.delete(KEYS_LIST);
        pipe.set(SIZE_KEY, b"0", None);
        pipe.execute().await
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let size = self.read_size().await?;
        let keys = self.store.lrange(KEYS_LIST, 0, -1).await?;

        Ok(CacheStats {
            size,
            max_size: self.max_size,
            keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;

    #[tokio::test]
    async fn test_new_initializes_size_counter() {
        let store = MemoryStore::new();
        let _cache = LruCache::with_defaults(store.clone()).await.unwrap();

        assert_eq!(
            store.get(SIZE_KEY).await.unwrap(),
            Some(b"0".to_vec())
        );
    }

    #[tokio::test]
    async fn test_new_does_not_reset_an_existing_counter() {
        let store = MemoryStore::new();
        let first = LruCache::with_defaults(store.clone()).await.unwrap();
        first.insert("k", &1u64, None).await.unwrap();

        let second = LruCache::with_defaults(store).await.unwrap();
        assert_eq!(second.stats().await.unwrap().size, 1);
    }

    #[tokio::test]
    async fn test_insert_writes_bookkeeping_keys() {
        let store = MemoryStore::new();
        let cache = LruCache::with_defaults(store.clone()).await.unwrap();
        cache.insert("k", &"v", None).await.unwrap();

        assert!(store.exists("lru_cache:data:k").await.unwrap());
        assert_eq!(store.lrange(KEYS_LIST, 0, -1).await.unwrap(), vec!["k"]);
        assert_eq!(store.get(SIZE_KEY).await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_get_moves_key_to_recency_tail() {
        let store = MemoryStore::new();
        let cache = LruCache::with_defaults(store.clone()).await.unwrap();
        cache.insert("a", &1u64, None).await.unwrap();
        cache.insert("b", &2u64, None).await.unwrap();

        let _: Option<u64> = cache.get("a").await.unwrap();
        assert_eq!(
            store.lrange(KEYS_LIST, 0, -1).await.unwrap(),
            vec!["b", "a"]
        );
    }

    #[tokio::test]
    async fn test_remove_decrements_counter() {
        let store = MemoryStore::new();
        let cache = LruCache::with_defaults(store.clone()).await.unwrap();
        cache.insert("k", &"v", None).await.unwrap();

        assert!(cache.remove("k").await.unwrap());
        assert_eq!(store.get(SIZE_KEY).await.unwrap(), Some(b"0".to_vec()));
        assert!(store
            .lrange(KEYS_LIST, 0, -1)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_clear_drops_recency_list() {
        let store = MemoryStore::new();
        let cache = LruCache::with_defaults(store.clone()).await.unwrap();
        cache.insert("a", &1u64, None).await.unwrap();
        cache.insert("b", &2u64, None).await.unwrap();

        cache.clear().await.unwrap();

        assert!(store.lrange(KEYS_LIST, 0, -1).await.unwrap().is_empty());
        assert_eq!(store.get(SIZE_KEY).await.unwrap(), Some(b"0".to_vec()));
    }

    #[tokio::test]
    async fn test_corrupt_size_counter_is_reported() {
        let store = MemoryStore::new();
        let cache = LruCache::with_defaults(store.clone()).await.unwrap();
        store.set(SIZE_KEY, b"garbage", None).await.unwrap();

        let err = cache.stats().await.unwrap_err();
        assert!(matches!(err, CacheError::CorruptDataError { .. }));
    }
}
