use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline, RedisError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CacheError, CacheResult, PageCache};

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

const KEY_PREFIX: &str = "page:v1:";

/// Redis-backed page cache. All keys live under a versioned prefix so
/// `clear` only touches pages.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: SharedRedis,
    ttl: Duration,
}

impl RedisPageCache {
    pub fn new(redis: SharedRedis, ttl: Duration) -> Self {
        Self { redis, ttl }
    }

    pub async fn connect(url: &str, ttl: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(Arc::new(Mutex::new(manager)), ttl))
    }

    fn full_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.redis.lock().await;
        let body: Option<String> = conn.get(Self::full_key(key)).await?;
        Ok(body)
    }

    async fn set(&self, key: &str, body: &str) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(Self::full_key(key), body, self.ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let pattern = format!("{}*", KEY_PREFIX);
        let mut conn = self.redis.lock().await;
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key);
                }
                pipe.query_async::<_, ()>(&mut *conn).await?;
                deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(deleted, "Page cache cleared");
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Redis(RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING response",
            ))))
        }
    }
}
