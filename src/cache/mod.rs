//! Cache layer
//!
//! TTL key-value store for short-lived state, which today means the email
//! verification codes issued during password recovery. Two backends:
//! - In-memory (moka) - default, for single-instance deployment
//! - Redis - optional, behind the `redis-cache` feature, so codes issued by
//!   one instance stay checkable on another
//!
//! Values are stored as JSON so callers can cache any serializable type.

pub mod memory;
#[cfg(feature = "redis-cache")]
pub mod redis;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheConfig, CacheDriver};

pub use memory::MemoryCache;
#[cfg(feature = "redis-cache")]
pub use redis::RedisCache;

/// Interface shared by the cache backends.
///
/// The generic methods make this trait object-unsafe; runtime dispatch goes
/// through the [`Cache`] enum instead of `dyn CacheLayer`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Read a value; `None` when the key is absent or expired
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Store a value that expires after `ttl`
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration)
        -> Result<()>;

    /// Remove a key; absent keys are a no-op
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Configured cache backend
#[derive(Debug)]
pub enum Cache {
    Memory(MemoryCache),
    #[cfg(feature = "redis-cache")]
    Redis(RedisCache),
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            Cache::Memory(inner) => inner.get(key).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(inner) => inner.get(key).await,
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        match self {
            Cache::Memory(inner) => inner.set(key, value, ttl).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(inner) => inner.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Cache::Memory(inner) => inner.delete(key).await,
            #[cfg(feature = "redis-cache")]
            Cache::Redis(inner) => inner.delete(key).await,
        }
    }
}

/// Build the cache selected by `config`.
///
/// # Errors
///
/// Fails when the redis driver is selected without a URL, without the
/// `redis-cache` feature, or when the Redis connection cannot be opened.
pub async fn create_cache(config: &CacheConfig) -> Result<Arc<Cache>> {
    let cache = match config.driver {
        CacheDriver::Memory => Cache::Memory(MemoryCache::new()),
        CacheDriver::Redis => connect_redis(config).await?,
    };
    Ok(Arc::new(cache))
}

#[cfg(feature = "redis-cache")]
async fn connect_redis(config: &CacheConfig) -> Result<Cache> {
    let url = config.redis_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "Redis URL is required for the redis cache driver. \
             Set 'redis_url' in cache configuration or REVIVA_CACHE_REDIS_URL."
        )
    })?;
    Ok(Cache::Redis(RedisCache::new(url).await?))
}

#[cfg(not(feature = "redis-cache"))]
async fn connect_redis(_config: &CacheConfig) -> Result<Cache> {
    anyhow::bail!(
        "Redis cache driver is configured but the 'redis-cache' feature is not \
         enabled. Rebuild with `--features redis-cache` or use the memory driver."
    )
}
