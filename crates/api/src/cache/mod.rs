//! Read-through cache for catalog queries.
//!
//! [`Cache::get_or_set`] memoizes a loader's JSON-serialized result. The
//! backing [`CacheStore`] is Redis when `REDIS_URL` is configured and an
//! in-process `moka` cache otherwise.
//!
//! A cache outage never fails a request: store errors are logged and the
//! loader result is served directly.
//!
//! # Invalidation
//!
//! Keys are grouped into [`Namespace`]s. Each namespace has a generation
//! counter that is part of every key (`tm:{ns}:v{gen}:{suffix}`), so
//! [`Cache::invalidate`] orphans a whole namespace with one increment and
//! the stale entries age out through their TTL.

mod memory;
mod redis_store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

const KEY_PREFIX: &str = "tm";

/// Errors from a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt counter at {key}: {value}")]
    CorruptCounter { key: String, value: String },
}

/// A string key-value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, `None` when missing or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a value.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically increment a counter that never expires, starting from 0.
    async fn incr(&self, key: &str) -> Result<u64, CacheError>;
}

/// Groups of cache keys invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Product listings, product detail and reviews.
    Products,
    /// The category list.
    Categories,
    /// Public artist profiles.
    Artists,
}

impl Namespace {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Artists => "artists",
        }
    }

    fn generation_key(self) -> String {
        format!("{KEY_PREFIX}:{}:gen", self.as_str())
    }
}

/// Build the storage key for an entry.
#[must_use]
pub fn entry_key(ns: Namespace, generation: u64, suffix: &str) -> String {
    format!("{KEY_PREFIX}:{}:v{generation}:{suffix}", ns.as_str())
}

/// Cache façade shared through application state.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl Cache {
    /// Wrap a store; entries expire after `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-process cache, used when no Redis URL is configured.
    #[must_use]
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new(10_000)), ttl)
    }

    async fn generation(&self, ns: Namespace) -> Result<u64, CacheError> {
        let key = ns.generation_key();
        match self.store.get_raw(&key).await? {
            Some(value) => value
                .parse()
                .map_err(|_| CacheError::CorruptCounter { key, value }),
            None => Ok(0),
        }
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        ns: Namespace,
        suffix: &str,
    ) -> Result<(String, Option<T>), CacheError> {
        let key = entry_key(ns, self.generation(ns).await?, suffix);
        let hit = match self.store.get_raw(&key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "dropping undecodable cache entry");
                    self.store.delete(&key).await?;
                    None
                }
            },
            None => None,
        };
        Ok((key, hit))
    }

    async fn store<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_raw(key, raw, self.ttl).await
    }

    /// Return the cached value for `suffix` in `ns`, or run `loader` and
    /// cache its result.
    ///
    /// Loader errors are returned as-is and nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns the loader's error.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        ns: Namespace,
        suffix: &str,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = match self.lookup::<T>(ns, suffix).await {
            Ok((_, Some(hit))) => {
                debug!(ns = ns.as_str(), suffix, "cache hit");
                return Ok(hit);
            }
            Ok((key, None)) => Some(key),
            Err(e) => {
                warn!(ns = ns.as_str(), suffix, error = %e, "cache read failed, loading directly");
                None
            }
        };

        let value = loader().await?;

        if let Some(key) = key
            && let Err(e) = self.store(&key, &value).await
        {
            warn!(key = %key, error = %e, "cache write failed");
        }

        Ok(value)
    }

    /// Orphan every entry in a namespace.
    pub async fn invalidate(&self, ns: Namespace) {
        match self.store.incr(&ns.generation_key()).await {
            Ok(generation) => debug!(ns = ns.as_str(), generation, "cache namespace invalidated"),
            Err(e) => warn!(ns = ns.as_str(), error = %e, "cache invalidation failed"),
        }
    }

    /// Invalidate several namespaces.
    pub async fn invalidate_all(&self, namespaces: &[Namespace]) {
        for ns in namespaces {
            self.invalidate(*ns).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// A store that fails every call.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::CorruptCounter {
                key: key.to_owned(),
                value: "down".to_owned(),
            })
        }

        async fn set_raw(&self, key: &str, _: String, _: Duration) -> Result<(), CacheError> {
            self.get_raw(key).await.map(|_| ())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.get_raw(key).await.map(|_| ())
        }

        async fn incr(&self, key: &str) -> Result<u64, CacheError> {
            self.get_raw(key).await.map(|_| 0)
        }
    }

    fn cache() -> Cache {
        Cache::in_memory(Duration::from_secs(60))
    }

    #[test]
    fn test_entry_key_format() {
        assert_eq!(entry_key(Namespace::Products, 3, "id=7"), "tm:products:v3:id=7");
    }

    #[tokio::test]
    async fn test_get_or_set_loads_once() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<Vec<i32>, ()> = cache
                .get_or_set(Namespace::Categories, "all", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let cache = cache();

        let first: Result<String, &str> = cache
            .get_or_set(Namespace::Artists, "1", || async { Err("db down") })
            .await;
        assert_eq!(first.unwrap_err(), "db down");

        let second: Result<String, &str> = cache
            .get_or_set(Namespace::Artists, "1", || async { Ok("Bhil".to_owned()) })
            .await;
        assert_eq!(second.unwrap(), "Bhil");
    }

    #[tokio::test]
    async fn test_invalidate_orphans_namespace_only() {
        let cache = cache();
        let load = |v: i32| move || async move { Ok::<_, ()>(v) };

        cache.get_or_set(Namespace::Products, "p", load(1)).await.unwrap();
        cache.get_or_set(Namespace::Categories, "c", load(1)).await.unwrap();

        cache.invalidate(Namespace::Products).await;

        let product = cache.get_or_set(Namespace::Products, "p", load(2)).await.unwrap();
        let category = cache.get_or_set(Namespace::Categories, "c", load(2)).await.unwrap();
        assert_eq!(product, 2);
        assert_eq!(category, 1);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let store = Arc::new(MemoryCache::new(100));
        let cache = Cache::new(store.clone(), Duration::from_secs(60));
        let key = entry_key(Namespace::Products, 0, "p");
        store
            .set_raw(&key, "{not json".to_owned(), Duration::from_secs(60))
            .await
            .unwrap();

        let value: Result<i32, ()> = cache
            .get_or_set(Namespace::Products, "p", || async { Ok(7) })
            .await;

        assert_eq!(value.unwrap(), 7);
        assert_eq!(store.get_raw(&key).await.unwrap().as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_broken_store_falls_back_to_loader() {
        let cache = Cache::new(Arc::new(BrokenStore), Duration::from_secs(60));

        let value: Result<i32, ()> = cache
            .get_or_set(Namespace::Products, "x", || async { Ok(42) })
            .await;
        assert_eq!(value.unwrap(), 42);

        cache.invalidate(Namespace::Products).await;
    }
}
