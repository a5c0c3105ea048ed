//! Caching for the recipes API.
//!
//! - [`backend`]: byte cache over a process-local map or Redis
//! - [`recipes`]: cache-aside wrapper for the full recipe list
//! - [`sessions`]: Redis-backed session store

pub mod backend;
pub mod recipes;
pub mod sessions;

use std::time::Duration;

use deadpool_redis::Pool;

use crate::config::RedisConfig;

pub use backend::{CacheBackend, CacheError, CacheStats, CachedEntry};
pub use recipes::{RECIPES_CACHE_KEY, RecipeListCache};
pub use sessions::RedisSessionStore;

/// Build a Redis pool and verify it can hand out a connection.
///
/// Returns `None` when Redis is disabled or unreachable; callers fall back to
/// process-local state.
pub async fn create_redis_pool(config: &RedisConfig) -> Option<Pool> {
    if !config.enabled {
        tracing::info!("Redis disabled, using local cache and sessions");
        return None;
    }

    let url = config.connection_url();
    tracing::info!(url = %config.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(url);
    let mut pool_config = redis_config.get_pool_config();
    let timeout = Some(Duration::from_millis(config.timeout_ms));
    pool_config.max_size = config.pool_size;
    pool_config.timeouts.wait = timeout;
    pool_config.timeouts.create = timeout;
    pool_config.timeouts.recycle = timeout;
    redis_config.pool = Some(pool_config);

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create Redis pool. Falling back to local state.");
            return None;
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis");
            Some(pool)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis. Falling back to local state.");
            None
        }
    }
}

/// Cache backend over an optional Redis pool.
pub fn create_cache_backend(pool: Option<Pool>) -> CacheBackend {
    match pool {
        Some(pool) => CacheBackend::new_redis(pool),
        None => CacheBackend::new_local(),
    }
}
