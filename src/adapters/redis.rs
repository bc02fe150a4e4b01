use crate::domain::ports::{Pipeline, Store};
use crate::utils::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed [`Store`]: the backend that makes the cache shared
/// across processes and machines. Values stay binary; every trait
/// method maps onto the Redis command of the same name.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect with a `redis://` / `rediss://` URL. The connection is
    /// multiplexed and reconnects on its own.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::debug!(url, "connected to redis backend");
        Ok(Self { conn })
    }
}

// SETEX rejects a zero expiry, so sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl_secs(ttl)).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, start as isize, stop as isize).await?)
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lindex(key, index as isize).await?)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.lrem(key, count as isize, value).await?)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.rpush(key, values).await?)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1i64).await?)
    }

    async fn decr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.decr(key, 1i64).await?)
    }

    fn pipeline(&self) -> Box<dyn Pipeline> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        Box::new(RedisPipeline {
            conn: self.conn.clone(),
            pipe,
        })
    }
}

/// MULTI/EXEC batch over the shared connection.
pub struct RedisPipeline {
    conn: ConnectionManager,
    pipe: redis::Pipeline,
}

#[async_trait]
impl Pipeline for RedisPipeline {
    fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) {
        match ttl {
            Some(ttl) => self.pipe.set_ex(key, value, ttl_secs(ttl)).ignore(),
            None => self.pipe.set(key, value).ignore(),
        };
    }

    fn setex(&mut self, key: &str, ttl: Duration, value: &[u8]) {
        self.pipe.set_ex(key, value, ttl_secs(ttl)).ignore();
    }

    fn delete(&mut self, key: &str) {
        self.pipe.del(key).ignore();
    }

    fn lrem(&mut self, key: &str, count: i64, value: &str) {
        self.pipe.lrem(key, count as isize, value).ignore();
    }

    fn rpush(&mut self, key: &str, values: &[String]) {
        self.pipe.rpush(key, values).ignore();
    }

    fn incr(&mut self, key: &str) {
        self.pipe.incr(key, 1i64).ignore();
    }

    fn decr(&mut self, key: &str) {
        self.pipe.decr(key, 1i64).ignore();
    }

    async fn execute(self: Box<Self>) -> Result<()> {
        let RedisPipeline { mut conn, pipe } = *self;
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_rounds_up_to_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(100)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(1)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(3600)), 3600);
    }
}
