//! In-process cache backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::{CacheError, CacheStore};

#[derive(Clone)]
struct Stored {
    value: String,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Stored, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// `moka` backed store for single-instance deployments and tests.
///
/// Counters live outside the capacity bound: evicting a namespace
/// generation would roll it back and resurrect orphaned entries.
pub struct MemoryCache {
    inner: Cache<String, Stored>,
    counters: Cache<String, u64>,
}

impl MemoryCache {
    /// Create a store holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self {
            inner,
            counters: Cache::builder().build(),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(counter) = self.counters.get(key).await {
            return Ok(Some(counter.to_string()));
        }
        Ok(self.inner.get(key).await.map(|s| s.value))
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(key.to_owned(), Stored { value, ttl }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        self.counters.invalidate(key).await;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let entry = self
            .counters
            .entry(key.to_owned())
            .and_upsert_with(|existing| {
                let current = existing.map_or(0, |e| e.into_value());
                std::future::ready(current + 1)
            })
            .await;
        Ok(entry.into_value())
    }
}
