//! Redis-backed cache and session store.
//!
//! These tests use testcontainers to spin up a real Redis instance and are
//! ignored by default: run with `cargo test -p recipes-server -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use recipes_auth::{SessionData, SessionStore};
use recipes_server::cache::{
    CacheBackend, RecipeListCache, RedisSessionStore, create_cache_backend, create_redis_pool,
};
use recipes_server::config::RedisConfig;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

static SHARED_REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

async fn get_redis_url() -> String {
    let (_, url) = SHARED_REDIS
        .get_or_init(|| async {
            let container = Redis::default()
                .start()
                .await
                .expect("start redis container");
            let host_port = container.get_host_port_ipv4(6379).await.expect("get port");
            // Scheme-less on purpose: deployments pass host:port
            (container, format!("127.0.0.1:{host_port}"))
        })
        .await;
    url.clone()
}

async fn redis_config() -> RedisConfig {
    RedisConfig {
        enabled: true,
        url: get_redis_url().await,
        ..Default::default()
    }
}

#[tokio::test]
async fn unreachable_redis_falls_back_to_local() {
    let config = RedisConfig {
        enabled: true,
        url: "redis://127.0.0.1:1".into(),
        timeout_ms: 200,
        ..Default::default()
    };
    let pool = create_redis_pool(&config).await;
    assert!(pool.is_none());
    assert!(!create_cache_backend(pool).is_redis());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn redis_cache_round_trip() {
    let pool = create_redis_pool(&redis_config().await).await;
    let backend = create_cache_backend(pool);
    assert!(backend.is_redis());

    backend
        .set("roundtrip", b"value".to_vec(), Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(
        backend.get("roundtrip").await.unwrap(),
        Some(Arc::new(b"value".to_vec()))
    );
    backend.invalidate("roundtrip").await.unwrap();
    assert!(backend.get("roundtrip").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn invalidation_is_shared_between_instances() {
    let config = redis_config().await;
    let first = RecipeListCache::new(create_cache_backend(create_redis_pool(&config).await), None);
    let second = RecipeListCache::new(create_cache_backend(create_redis_pool(&config).await), None);

    first.put(&[]).await.unwrap();
    assert_eq!(second.get().await.unwrap(), Some(vec![]));

    second.invalidate().await.unwrap();
    assert!(first.get().await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn sessions_persist_in_redis() {
    let pool = create_redis_pool(&redis_config().await)
        .await
        .expect("redis pool");
    let store = RedisSessionStore::new(pool);
    let data = SessionData {
        username: "admin".into(),
        token: "abc".into(),
    };

    store.save("sid", &data, Duration::from_secs(60)).await.unwrap();
    assert_eq!(store.load("sid").await.unwrap(), Some(data));

    store.remove("sid").await.unwrap();
    assert!(store.load("sid").await.unwrap().is_none());
    store.remove("sid").await.unwrap();
}

#[tokio::test]
async fn local_backend_reports_stats() {
    let cache = CacheBackend::new_local();
    cache.set("k", b"v".to_vec(), None).await.unwrap();
    let stats = cache.stats();
    assert_eq!(stats.mode, "local");
    assert_eq!(stats.local_entries, Some(1));
}
