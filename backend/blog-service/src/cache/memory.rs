use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::{CacheResult, PageCache};

const MAX_ENTRIES: u64 = 10_000;

/// In-process page cache with time-to-live eviction.
#[derive(Clone)]
pub struct MemoryPageCache {
    pages: Cache<String, String>,
}

impl MemoryPageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.pages.get(key).await)
    }

    async fn set(&self, key: &str, body: &str) -> CacheResult<()> {
        self.pages.insert(key.to_string(), body.to_string()).await;
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.pages.invalidate_all();
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
