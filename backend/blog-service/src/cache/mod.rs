//! Rendered-page cache
//!
//! `PageCache` is a shared key-value store with a per-instance TTL that the
//! view layer receives explicitly. Failures never fail a request: use
//! [`cached_page`] and [`store_page`], which log, count, and carry on.

mod memory;
mod redis;

pub use self::memory::MemoryPageCache;
pub use self::redis::{RedisPageCache, SharedRedis};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::metrics::PAGE_CACHE_EVENTS;

/// Seconds the index page stays cached unless configured otherwise.
pub const DEFAULT_INDEX_TTL_SECS: u64 = 20;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    /// Store `body` under `key` for this cache's TTL.
    async fn set(&self, key: &str, body: &str) -> CacheResult<()>;
    /// Drop every cached page.
    async fn clear(&self) -> CacheResult<()>;
    async fn ping(&self) -> CacheResult<()>;
}

/// Key for one page of the index listing as seen by `viewer`.
///
/// Only integer page requests get their own entry; anything else renders the
/// first page and shares its key.
pub fn index_page_key(viewer: Option<i64>, requested_page: Option<&str>) -> String {
    let viewer = viewer
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anon".to_string());
    let page = requested_page
        .and_then(|p| p.trim().parse::<i64>().ok())
        .map(|p| p.to_string())
        .unwrap_or_else(|| "first".to_string());
    format!("index:{}:{}", viewer, page)
}

/// Read a page, treating cache failures as misses.
pub async fn cached_page(cache: &dyn PageCache, key: &str) -> Option<String> {
    match cache.get(key).await {
        Ok(Some(body)) => {
            debug!(key = %key, "Page cache HIT");
            PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
            Some(body)
        }
        Ok(None) => {
            debug!(key = %key, "Page cache MISS");
            PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            None
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Page cache read failed");
            PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
            None
        }
    }
}

/// Write a page, logging and dropping failures.
pub async fn store_page(cache: &dyn PageCache, key: &str, body: &str) {
    if let Err(e) = cache.set(key, body).await {
        warn!(key = %key, error = %e, "Page cache write failed");
        PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
    }
}
