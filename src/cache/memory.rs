//! In-memory cache backed by moka
//!
//! Entries carry their own TTL through moka's `Expiry` API, so a two-minute
//! verification code and a longer-lived entry can share the same cache.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum number of entries held before moka starts evicting
const MAX_CAPACITY: u64 = 10_000;

/// Stored entry: the JSON payload plus the TTL it was written with
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            ttl,
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// Expiry policy reading the TTL stored on each entry.
///
/// moka consults this on insert and update, so overwriting a key restarts
/// its clock with the new TTL.
struct EntryTtlExpiry;

impl Expiry<String, CacheEntry> for EntryTtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory TTL cache
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .expire_after(EntryTtlExpiry)
            .build();

        Self { cache }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();

        let result: Option<String> = cache.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("key1").await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_noop() {
        let cache = MemoryCache::new();
        cache.delete("never-set").await.unwrap();
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = MemoryCache::new();

        cache
            .set("code", &"12345".to_string(), Duration::from_millis(20))
            .await
            .unwrap();

        let before: Option<String> = cache.get("code").await.unwrap();
        assert_eq!(before, Some("12345".to_string()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.cache.run_pending_tasks().await;

        let after: Option<String> = cache.get("code").await.unwrap();
        assert_eq!(after, None);
    }

    #[tokio::test]
    async fn test_longer_ttl_outlives_shorter() {
        let cache = MemoryCache::new();

        cache
            .set("short", &"a".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        cache
            .set("long", &"b".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.cache.run_pending_tasks().await;

        let short: Option<String> = cache.get("short").await.unwrap();
        let long: Option<String> = cache.get("long").await.unwrap();

        assert_eq!(short, None);
        assert_eq!(long, Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_overwrite_restarts_ttl() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"old".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        cache
            .set("key1", &"new".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.cache.run_pending_tasks().await;

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_struct_payload() {
        let cache = MemoryCache::new();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct PendingCode {
            email: String,
            code: u32,
        }

        let pending = PendingCode {
            email: "alice@example.com".to_string(),
            code: 54321,
        };

        cache
            .set(
                "verification_code:alice@example.com",
                &pending,
                Duration::from_secs(120),
            )
            .await
            .unwrap();

        let result: Option<PendingCode> = cache
            .get("verification_code:alice@example.com")
            .await
            .unwrap();
        assert_eq!(result, Some(pending));
    }

    #[tokio::test]
    async fn test_wrong_type_read_is_error() {
        let cache = MemoryCache::new();

        cache
            .set("key", &"not a number".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Result<Option<u32>> = cache.get("key").await;
        assert!(result.is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// Any entry must be readable before its TTL elapses and gone after,
            /// regardless of the key or payload.
            #[test]
            fn entries_expire_after_their_own_ttl(
                key in "[a-z]{1,10}",
                value in "[a-z]{1,100}"
            ) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let cache = MemoryCache::new();

                    cache.set(&key, &value, Duration::from_millis(10)).await.unwrap();

                    let before: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(before, Some(value.clone()));

                    tokio::time::sleep(Duration::from_millis(50)).await;
                    cache.cache.run_pending_tasks().await;

                    let after: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(after, None,
                        "Cache entry should expire after its TTL. Key: {}", key);

                    Ok(())
                })?;
            }

            /// A value set within its TTL always reads back unchanged.
            #[test]
            fn reads_within_ttl_return_last_write(
                key in "[a-z]{1,10}",
                first in "[a-z]{1,50}",
                second in "[a-z]{1,50}"
            ) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let cache = MemoryCache::new();
                    let ttl = Duration::from_secs(60);

                    cache.set(&key, &first, ttl).await.unwrap();
                    cache.set(&key, &second, ttl).await.unwrap();

                    let read: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(read, Some(second.clone()));

                    Ok(())
                })?;
            }
        }
    }
}
