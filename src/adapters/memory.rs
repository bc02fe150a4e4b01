use crate::domain::ports::{Pipeline, Store};
use crate::utils::error::{CacheError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// In-process [`Store`] backend. Clones share the same state, so several
/// tasks can run one cache off a single `MemoryStore`. Expired keys are
/// dropped lazily on read; [`spawn_cleanup`](MemoryStore::spawn_cleanup)
/// adds a periodic sweep on top.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    lists: HashMap<String, Vec<String>>,
    counters: HashMap<String, i64>,
    expiry: HashMap<String, Instant>,
}

impl Inner {
    fn purge_if_expired(&mut self, key: &str) -> bool {
        if let Some(deadline) = self.expiry.get(key) {
            if Instant::now() > *deadline {
                self.data.remove(key);
                self.counters.remove(key);
                self.expiry.remove(key);
                return true;
            }
        }
        false
    }

    /// Counters behave like Redis strings: a counter key reads back as
    /// its decimal rendering, and incr/decr seed from a numeric value
    /// previously written with set.
    fn counter_value(&self, key: &str) -> Result<i64> {
        if let Some(value) = self.counters.get(key) {
            return Ok(*value);
        }
        if let Some(bytes) = self.data.get(key) {
            let text = std::str::from_utf8(bytes).map_err(|e| CacheError::CorruptDataError {
                key: key.to_string(),
                reason: format!("counter is not UTF-8: {}", e),
            })?;
            return text
                .trim()
                .parse::<i64>()
                .map_err(|e| CacheError::CorruptDataError {
                    key: key.to_string(),
                    reason: format!("counter is not an integer: {}", e),
                });
        }
        Ok(0)
    }

    fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        if self.purge_if_expired(key) {
            return None;
        }
        if let Some(bytes) = self.data.get(key) {
            return Some(bytes.clone());
        }
        self.counters
            .get(key)
            .map(|value| value.to_string().into_bytes())
    }

    fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) {
        self.data.insert(key.to_string(), value.to_vec());
        self.counters.remove(key);
        match ttl {
            Some(ttl) => {
                self.expiry.insert(key.to_string(), Instant::now() + ttl);
            }
            None => {
                self.expiry.remove(key);
            }
        }
    }

    // DEL and EXISTS apply to keys of any type, lists included.
    fn delete(&mut self, key: &str) -> bool {
        if self.purge_if_expired(key) {
            return false;
        }
        let had_data = self.data.remove(key).is_some();
        let had_counter = self.counters.remove(key).is_some();
        let had_list = self.lists.remove(key).is_some();
        self.expiry.remove(key);
        had_data || had_counter || had_list
    }

    fn exists(&mut self, key: &str) -> bool {
        if self.purge_if_expired(key) {
            return false;
        }
        self.data.contains_key(key)
            || self.counters.contains_key(key)
            || self.lists.contains_key(key)
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Vec<String> {
        let Some(list) = self.lists.get(key) else {
            return Vec::new();
        };
        let len = list.len() as i64;
        let start = if start < 0 { len + start } else { start }.max(0);
        let stop = if stop < 0 { len + stop } else { stop }.min(len - 1);
        if start > stop || len == 0 {
            return Vec::new();
        }
        list[start as usize..=stop as usize].to_vec()
    }

    fn lindex(&self, key: &str, index: i64) -> Option<String> {
        let list = self.lists.get(key)?;
        let len = list.len() as i64;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return None;
        }
        list.get(index as usize).cloned()
    }

    fn lrem(&mut self, key: &str, count: i64, value: &str) -> usize {
        let Some(list) = self.lists.get_mut(key) else {
            return 0;
        };
        let mut removed = 0;
        if count > 0 {
            for _ in 0..count {
                match list.iter().position(|v| v == value) {
                    Some(idx) => {
                        list.remove(idx);
                        removed += 1;
                    }
                    None => break,
                }
            }
        } else if count < 0 {
            for _ in 0..count.unsigned_abs() {
                match list.iter().rposition(|v| v == value) {
                    Some(idx) => {
                        list.remove(idx);
                        removed += 1;
                    }
                    None => break,
                }
            }
        } else {
            let before = list.len();
            list.retain(|v| v != value);
            removed = before - list.len();
        }
        removed
    }

    fn rpush(&mut self, key: &str, values: &[String]) -> usize {
        let list = self.lists.entry(key.to_string()).or_default();
        list.extend_from_slice(values);
        list.len()
    }

    fn incr(&mut self, key: &str) -> Result<i64> {
        let next = self.counter_value(key)? + 1;
        self.data.remove(key);
        self.counters.insert(key.to_string(), next);
        Ok(next)
    }

    fn decr(&mut self, key: &str) -> Result<i64> {
        let next = self.counter_value(key)? - 1;
        self.data.remove(key);
        self.counters.insert(key.to_string(), next);
        Ok(next)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every key whose deadline has passed, returning how many were
    /// removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let expired: Vec<String> = inner
            .expiry
            .iter()
            .filter(|(_, deadline)| now > **deadline)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.data.remove(key);
            inner.counters.remove(key);
            inner.expiry.remove(key);
        }

        expired.len()
    }

    /// Sweep expired keys every `interval` on a background task. The
    /// task runs until the returned handle is aborted or dropped with
    /// the runtime.
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired keys");
                }
            }
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.lock().await.get(key))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.inner.lock().await.set(key, value, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.inner.lock().await.delete(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.inner.lock().await.exists(key))
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        Ok(self.inner.lock().await.lrange(key, start, stop))
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        Ok(self.inner.lock().await.lindex(key, index))
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<usize> {
        Ok(self.inner.lock().await.lrem(key, count, value))
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize> {
        Ok(self.inner.lock().await.rpush(key, values))
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.inner.lock().await.incr(key)
    }

    async fn decr(&self, key: &str) -> Result<i64> {
        self.inner.lock().await.decr(key)
    }

    fn pipeline(&self) -> Box<dyn Pipeline> {
        Box::new(MemoryPipeline {
            store: self.clone(),
            ops: Vec::new(),
        })
    }
}

enum Op {
    Set {
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    },
    Delete {
        key: String,
    },
    Lrem {
        key: String,
        count: i64,
        value: String,
    },
    Rpush {
        key: String,
        values: Vec<String>,
    },
    Incr {
        key: String,
    },
    Decr {
        key: String,
    },
}

/// Replays its queued operations against the store under one lock
/// acquisition, so a batch is not interleaved with other tasks.
pub struct MemoryPipeline {
    store: MemoryStore,
    ops: Vec<Op>,
}

#[async_trait]
impl Pipeline for MemoryPipeline {
    fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) {
        self.ops.push(Op::Set {
            key: key.to_string(),
            value: value.to_vec(),
            ttl,
        });
    }

    fn setex(&mut self, key: &str, ttl: Duration, value: &[u8]) {
        self.ops.push(Op::Set {
            key: key.to_string(),
            value: value.to_vec(),
            ttl: Some(ttl),
        });
    }

    fn delete(&mut self, key: &str) {
        self.ops.push(Op::Delete {
            key: key.to_string(),
        });
    }

    fn lrem(&mut self, key: &str, count: i64, value: &str) {
        self.ops.push(Op::Lrem {
            key: key.to_string(),
            count,
            value: value.to_string(),
        });
    }

    fn rpush(&mut self, key: &str, values: &[String]) {
        self.ops.push(Op::Rpush {
            key: key.to_string(),
            values: values.to_vec(),
        });
    }

    fn incr(&mut self, key: &str) {
        self.ops.push(Op::Incr {
            key: key.to_string(),
        });
    }

    fn decr(&mut self, key: &str) {
        self.ops.push(Op::Decr {
            key: key.to_string(),
        });
    }

    async fn execute(self: Box<Self>) -> Result<()> {
        let mut inner = self.store.inner.lock().await;
        for op in self.ops {
            match op {
                Op::Set { key, value, ttl } => inner.set(&key, &value, ttl),
                Op::Delete { key } => {
                    inner.delete(&key);
                }
                Op::Lrem { key, count, value } => {
                    inner.lrem(&key, count, &value);
                }
                Op::Rpush { key, values } => {
                    inner.rpush(&key, &values);
                }
                Op::Incr { key } => {
                    inner.incr(&key)?;
                }
                Op::Decr { key } => {
                    inner.decr(&key)?;
                }
            }
        }
        Ok(())
    }
}
