use crate::core::cache::LruCache;
use crate::core::keys::derive_key;
use crate::domain::ports::Store;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

/// Items cached per-id in the batch helpers report their own id, so a
/// loader's results can be filed back under the right keys.
pub trait HasId<Id> {
    fn id(&self) -> Id;
}

/// Read-through memoization over an [`LruCache`]. Keys are
/// `<prefix>:<fn_name>:<derived suffix>`, so one cache can serve many
/// memoized call sites without collisions.
pub struct Memoizer<'a, S: Store> {
    cache: &'a LruCache<S>,
    prefix: String,
    ttl: Option<Duration>,
}

impl<'a, S: Store> Memoizer<'a, S> {
    pub fn new(cache: &'a LruCache<S>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl: None,
        }
    }

    /// Override the cache's default TTL for entries written through this
    /// memoizer.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn call_key(&self, fn_name: &str, args: &[String]) -> String {
        format!("{}:{}:{}", self.prefix, fn_name, derive_key(args))
    }

    fn item_key<Id: Display>(&self, fn_name: &str, id: &Id) -> String {
        format!("{}:{}:{}", self.prefix, fn_name, id)
    }

    /// Memoize a single call: return the cached result for these
    /// arguments, or run `load` and cache what it produced.
    pub async fn call<T, F, Fut>(&self, fn_name: &str, args: &[String], load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cache_key = self.call_key(fn_name, args);

        if let Some(hit) = self.cache.get::<T>(&cache_key).await? {
            return Ok(hit);
        }

        tracing::debug!(key = %cache_key, "cache miss");
        let value = load().await?;
        self.cache.insert(&cache_key, &value, self.ttl).await?;

        Ok(value)
    }

    /// Batch lookup keyed per id: cached items are taken from the cache,
    /// `load` runs once with only the uncached ids, and its results are
    /// cached individually. Items come back in the input id order; ids
    /// the loader did not produce an item for are silently absent.
    pub async fn call_batch_list<Id, T, F, Fut>(
        &self,
        fn_name: &str,
        ids: &[Id],
        load: F,
    ) -> Result<Vec<T>>
    where
        Id: Display + Eq + Hash + Clone,
        T: Serialize + DeserializeOwned + Clone + HasId<Id>,
        F: FnOnce(Vec<Id>) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cached = self.load_missing(fn_name, ids, load).await?;

        Ok(ids
            .iter()
            .filter_map(|id| cached.get(id).cloned())
            .collect())
    }

    /// Same as [`call_batch_list`](Self::call_batch_list), but keyed by id.
    pub async fn call_batch_map<Id, T, F, Fut>(
        &self,
        fn_name: &str,
        ids: &[Id],
        load: F,
    ) -> Result<HashMap<Id, T>>
    where
        Id: Display + Eq + Hash + Clone,
        T: Serialize + DeserializeOwned + Clone + HasId<Id>,
        F: FnOnce(Vec<Id>) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.load_missing(fn_name, ids, load).await
    }

    async fn load_missing<Id, T, F, Fut>(
        &self,
        fn_name: &str,
        ids: &[Id],
        load: F,
    ) -> Result<HashMap<Id, T>>
    where
        Id: Display + Eq + Hash + Clone,
        T: Serialize + DeserializeOwned + Clone + HasId<Id>,
        F: FnOnce(Vec<Id>) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let mut cached: HashMap<Id, T> = HashMap::new();
        let mut uncached: Vec<Id> = Vec::new();

        for id in ids {
            if cached.contains_key(id) || uncached.contains(id) {
                continue;
            }
            match self.cache.get::<T>(&self.item_key(fn_name, id)).await? {
                Some(item) => {
                    cached.insert(id.clone(), item);
                }
                None => uncached.push(id.clone()),
            }
        }

        if uncached.is_empty() {
            tracing::debug!(total = ids.len(), "complete cache hit for id batch");
            return Ok(cached);
        }

        tracing::debug!(
            missing = uncached.len(),
            total = ids.len(),
            "partial cache hit, loading uncached ids"
        );

        let loaded = load(uncached).await?;
        for item in loaded {
            let id = item.id();
            self.cache
                .insert(&self.item_key(fn_name, &id), &item, self.ttl)
                .await?;
            cached.insert(id, item);
        }

        Ok(cached)
    }
}
