//! Byte cache over a local DashMap or a shared Redis instance.

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A cached entry. `ttl: None` never expires.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Option<Duration>,
}

impl CachedEntry {
    pub fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.cached_at.elapsed() > ttl)
    }
}

/// Cache backend.
///
/// - **Local**: single instance, entries live in a DashMap
/// - **Redis**: entries live in Redis so every instance sees the same
///   state and an invalidation on one instance is visible to all
///
/// All operations are awaited; a write that returns `Ok` has reached the
/// backend.
#[derive(Clone)]
pub enum CacheBackend {
    Local(Arc<DashMap<String, CachedEntry>>),
    Redis { redis: Pool },
}

impl std::fmt::Debug for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Local(map) => f.debug_tuple("Local").field(&map.len()).finish(),
            CacheBackend::Redis { .. } => f.write_str("Redis"),
        }
    }
}

impl CacheBackend {
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    pub fn new_redis(redis_pool: Pool) -> Self {
        CacheBackend::Redis { redis: redis_pool }
    }

    /// Fetch a value. Expired local entries are removed and reported as a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError> {
        match self {
            CacheBackend::Local(map) => {
                if let Some(entry) = map.get(key) {
                    if !entry.is_expired() {
                        tracing::debug!(key = %key, "cache hit (local)");
                        return Ok(Some(Arc::clone(&entry.data)));
                    }
                    drop(entry);
                    map.remove_if(key, |_, e| e.is_expired());
                }
                tracing::debug!(key = %key, "cache miss (local)");
                Ok(None)
            }
            CacheBackend::Redis { redis } => {
                let mut conn = redis.get().await?;
                let value: Option<Vec<u8>> = conn.get(key).await?;
                tracing::debug!(key = %key, hit = value.is_some(), "cache lookup (redis)");
                Ok(value.map(Arc::new))
            }
        }
    }

    pub async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
                Ok(())
            }
            CacheBackend::Redis { redis } => {
                let mut conn = redis.get().await?;
                match ttl.map(|t| t.as_secs().max(1)) {
                    Some(ttl_secs) => conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?,
                    None => conn.set::<_, _, ()>(key, value).await?,
                }
                tracing::debug!(key = %key, ttl = ?ttl, "cache set (redis)");
                Ok(())
            }
        }
    }

    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
                Ok(())
            }
            CacheBackend::Redis { redis } => {
                let mut conn = redis.get().await?;
                conn.del::<_, ()>(key).await?;
                tracing::debug!(key = %key, "cache invalidated (redis)");
                Ok(())
            }
        }
    }

    /// Local entry count; Redis does not report one.
    pub fn stats(&self) -> CacheStats {
        match self {
            CacheBackend::Local(map) => CacheStats {
                mode: "local",
                local_entries: Some(map.len()),
            },
            CacheBackend::Redis { .. } => CacheStats {
                mode: "redis",
                local_entries: None,
            },
        }
    }

    pub fn is_redis(&self) -> bool {
        matches!(self, CacheBackend::Redis { .. })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub mode: &'static str,
    pub local_entries: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_set_get_invalidate() {
        let cache = CacheBackend::new_local();
        assert!(cache.get("recipes").await.unwrap().is_none());

        cache.set("recipes", b"[]".to_vec(), None).await.unwrap();
        assert_eq!(cache.get("recipes").await.unwrap().unwrap().as_slice(), b"[]");
        assert_eq!(cache.stats().local_entries, Some(1));

        cache.invalidate("recipes").await.unwrap();
        assert!(cache.get("recipes").await.unwrap().is_none());
        // Invalidating an absent key is fine.
        cache.invalidate("recipes").await.unwrap();
    }

    #[tokio::test]
    async fn local_entries_expire() {
        let cache = CacheBackend::new_local();
        cache
            .set("k", vec![1], Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        assert_eq!(cache.stats().local_entries, Some(0));
    }

    #[tokio::test]
    async fn expired_read_keeps_a_refreshed_entry() {
        let cache = CacheBackend::new_local();
        cache
            .set("k", vec![1], Some(Duration::from_millis(5)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let CacheBackend::Local(map) = &cache else {
            unreachable!()
        };
        // A writer refreshes the key between the expiry check and the removal
        map.insert("k".into(), CachedEntry::new(vec![2], None));
        map.remove_if("k", |_, e| e.is_expired());
        assert_eq!(cache.get("k").await.unwrap().unwrap().as_slice(), [2]);
    }

    #[test]
    fn entries_without_ttl_never_expire() {
        let entry = CachedEntry::new(vec![], None);
        assert!(!entry.is_expired());
    }
}
