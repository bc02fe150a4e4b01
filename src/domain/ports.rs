use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Key-value storage contract the cache runs against. Backends must be
/// binary-safe for entry data and keep Redis semantics for list and
/// counter commands.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value, optionally with a time-to-live.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Returns false when the key was absent.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Inclusive range over a list; negative indices count from the end,
    /// so `lrange(key, 0, -1)` is the whole list.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>>;

    /// Remove occurrences of `value`: count > 0 removes the first n,
    /// count < 0 the last n, count == 0 all. Returns how many were removed.
    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<usize>;

    /// Append values, returning the new list length.
    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize>;

    /// Increment a counter, starting from zero when absent.
    async fn incr(&self, key: &str) -> Result<i64>;

    async fn decr(&self, key: &str) -> Result<i64>;

    /// Start a command batch, executed atomically where the backend can.
    fn pipeline(&self) -> Box<dyn Pipeline>;
}

/// Queued store commands, run in order by `execute`. The cache never
/// inspects individual replies, so execution yields only success/failure.
#[async_trait]
pub trait Pipeline: Send {
    fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>);
    fn setex(&mut self, key: &str, ttl: Duration, value: &[u8]);
    fn delete(&mut self, key: &str);
    fn lrem(&mut self, key: &str, count: i64, value: &str);
    fn rpush(&mut self, key: &str, values: &[String]);
    fn incr(&mut self, key: &str);
    fn decr(&mut self, key: &str);

    async fn execute(self: Box<Self>) -> Result<()>;
}
