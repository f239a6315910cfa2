//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::{Cache, CacheError, RedisCache};
use crate::config::ApiConfig;
use crate::services::auth::JwtKeys;
use crate::services::google::GoogleClient;
use crate::services::media::{CloudinaryStore, MediaStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    cache: Cache,
    jwt: JwtKeys,
    media: Option<Arc<dyn MediaStore>>,
    google: Option<GoogleClient>,
}

impl AppState {
    /// Create application state with an explicit cache.
    ///
    /// Cloudinary and Google OAuth clients are built only when configured.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool, cache: Cache) -> Self {
        let http = reqwest::Client::new();
        let jwt = JwtKeys::new(&config.jwt.secret, config.jwt.ttl);
        let media = config.cloudinary.as_ref().map(|cloudinary| {
            Arc::new(CloudinaryStore::new(cloudinary, http.clone())) as Arc<dyn MediaStore>
        });
        let google = config
            .google
            .as_ref()
            .map(|google| GoogleClient::new(google, http.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache,
                jwt,
                media,
                google,
            }),
        }
    }

    /// Create application state, connecting to Redis when `REDIS_URL` is set
    /// and falling back to the in-process cache otherwise.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if Redis is configured but unreachable.
    pub async fn connect(config: ApiConfig, pool: PgPool) -> Result<Self, CacheError> {
        use secrecy::ExposeSecret;

        let ttl = config.cache.ttl;
        let cache = match &config.cache.redis_url {
            Some(url) => {
                let store = RedisCache::connect(url.expose_secret()).await?;
                tracing::info!("Using Redis cache");
                Cache::new(Arc::new(store), ttl)
            }
            None => {
                tracing::info!("REDIS_URL not set, using in-process cache");
                Cache::in_memory(ttl)
            }
        };

        Ok(Self::new(config, pool, cache))
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the read-through cache.
    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.inner.cache
    }

    /// Get a reference to the JWT signing keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Get the image store, if uploads are configured.
    #[must_use]
    pub fn media(&self) -> Option<&Arc<dyn MediaStore>> {
        self.inner.media.as_ref()
    }

    /// Get the Google OAuth client, if configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleClient> {
        self.inner.google.as_ref()
    }
}
