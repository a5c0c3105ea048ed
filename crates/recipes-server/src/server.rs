use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, extract::FromRef, middleware};
use recipes_auth::{DynSessionStore, JwtService, MemorySessionStore, SessionManager};
use recipes_db_memory::{InMemoryRecipeStorage, InMemoryUserStorage};
use recipes_db_mongo::MongoStorage;
use recipes_storage::{DynRecipeStorage, DynUserStorage};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthService;
use crate::cache::{self, RecipeListCache, RedisSessionStore};
use crate::catalog::CatalogService;
use crate::config::{AppConfig, StorageBackend};
use crate::{middleware as app_middleware, routes};

/// Shared application state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub catalog: CatalogService,
    pub auth: AuthService,
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.auth.sessions().clone()
    }
}

/// Recipe and account stores for the configured backend.
async fn create_storage(cfg: &AppConfig) -> anyhow::Result<(DynRecipeStorage, DynUserStorage)> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            let recipes = match cfg.storage.memory.seed_file.as_deref() {
                Some(path) => InMemoryRecipeStorage::from_seed_file(path)
                    .await
                    .with_context(|| format!("loading seed file {path}"))?,
                None => InMemoryRecipeStorage::new(),
            };
            let users = match cfg.storage.memory.users_file.as_deref() {
                Some(path) => InMemoryUserStorage::from_file(path)
                    .await
                    .with_context(|| format!("loading users file {path}"))?,
                None => {
                    tracing::warn!("No storage.memory.users_file configured; sign-in will reject everyone");
                    InMemoryUserStorage::new()
                }
            };
            tracing::info!(backend = "memory", "Storage initialized");
            Ok((Arc::new(recipes), Arc::new(users)))
        }
        StorageBackend::Mongo => {
            let storage = MongoStorage::connect(&cfg.storage.mongo.to_mongo_config())
                .await
                .context("connecting to MongoDB")?;
            tracing::info!(
                backend = "mongo",
                database = %cfg.storage.mongo.database,
                "Storage initialized"
            );
            Ok((Arc::new(storage.recipes()), Arc::new(storage.users())))
        }
    }
}

/// Build the application state from configuration.
///
/// Redis, when enabled and reachable, backs both the list cache and the
/// session store; otherwise both stay in process.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let (recipes, users) = create_storage(cfg).await?;
    let redis_pool = cache::create_redis_pool(&cfg.redis).await;

    let list_cache = cfg.cache.enabled.then(|| {
        RecipeListCache::new(
            cache::create_cache_backend(redis_pool.clone()),
            cfg.cache.ttl(),
        )
    });
    let catalog = CatalogService::new(recipes, list_cache);

    let session_store: DynSessionStore = match redis_pool {
        Some(pool) => Arc::new(RedisSessionStore::new(pool)),
        None => Arc::new(MemorySessionStore::new()),
    };
    tracing::info!(store = session_store.backend_name(), "Session store initialized");
    let sessions = SessionManager::new(
        session_store,
        cfg.auth.session_cookie.clone(),
        cfg.auth.session_ttl(),
    )
    .with_secure_cookies(cfg.auth.secure_cookies);

    let jwt = JwtService::new(&cfg.auth.jwt_secret)?;
    let auth = AuthService::new(users, sessions, Arc::new(jwt))
        .with_bearer_tokens(cfg.auth.issue_bearer_tokens);

    Ok(AppState { catalog, auth })
}

/// Routes plus the HTTP middleware stack.
pub fn router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    routes::routes(state)
        // Middleware stack (order: request id -> compression/cors/trace -> body limit)
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(router(state, cfg))
}

pub struct RecipesServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<RecipesServer> {
        let app = build_app(&self.config).await?;
        Ok(RecipesServer {
            addr: self.addr,
            app,
        })
    }
}

impl RecipesServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
