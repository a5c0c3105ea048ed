//! Server-side sessions.
//!
//! A session is a `{username, token}` record held by a [`SessionStore`] under
//! a random id. The id travels in an HTTP-only cookie; the record never
//! leaves the server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use moka::Expiry;
use moka::future::Cache;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// What a session remembers about its user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub username: String,
    pub token: String,
}

impl SessionData {
    /// A session only counts as signed in while it carries a token.
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// 256 bits of randomness, hex encoded.
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Persistence for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> AuthResult<Option<SessionData>>;

    async fn save(&self, session_id: &str, data: &SessionData, ttl: Duration) -> AuthResult<()>;

    /// Removing an unknown id succeeds.
    async fn remove(&self, session_id: &str) -> AuthResult<()>;

    fn backend_name(&self) -> &'static str;
}

pub type DynSessionStore = Arc<dyn SessionStore>;

#[derive(Debug, Clone)]
struct StoredSession {
    data: SessionData,
    ttl: Duration,
}

/// Each record expires after the ttl it was saved with.
struct SessionExpiry;

impl Expiry<String, StoredSession> for SessionExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredSession,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredSession,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local session store. Expired records are evicted by the cache's
/// housekeeping, whether or not they are read again.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<String, StoredSession>,
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("entries", &self.sessions.entry_count())
            .finish()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder().expire_after(SessionExpiry).build(),
        }
    }

    /// Live records, after pending evictions have been applied.
    pub async fn len(&self) -> usize {
        self.sessions.run_pending_tasks().await;
        usize::try_from(self.sessions.entry_count()).unwrap_or(usize::MAX)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AuthResult<Option<SessionData>> {
        Ok(self.sessions.get(session_id).await.map(|stored| stored.data))
    }

    async fn save(&self, session_id: &str, data: &SessionData, ttl: Duration) -> AuthResult<()> {
        self.sessions
            .insert(
                session_id.to_string(),
                StoredSession {
                    data: data.clone(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.invalidate(session_id).await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Ties a [`SessionStore`] to the session cookie.
#[derive(Clone)]
pub struct SessionManager {
    store: DynSessionStore,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store.backend_name())
            .field("cookie_name", &self.cookie_name)
            .field("ttl", &self.ttl)
            .field("secure", &self.secure)
            .finish()
    }
}

impl SessionManager {
    pub fn new(store: DynSessionStore, cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            cookie_name: cookie_name.into(),
            ttl,
            secure: false,
        }
    }

    /// Mark the cookie `Secure` (HTTPS deployments).
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn store(&self) -> &DynSessionStore {
        &self.store
    }

    /// Persist a new signed-in session for `username` and attach its cookie.
    ///
    /// A session already referenced by the request cookie is removed first.
    pub async fn start(&self, jar: CookieJar, username: &str) -> AuthResult<CookieJar> {
        if let Some(previous) = jar.get(&self.cookie_name)
            && !previous.value().is_empty()
        {
            self.store.remove(previous.value()).await?;
        }
        let session_id = generate_session_token();
        let data = SessionData {
            username: username.to_string(),
            token: generate_session_token(),
        };
        self.store.save(&session_id, &data, self.ttl).await?;
        tracing::debug!(username, store = self.store.backend_name(), "Session started");
        Ok(jar.add(self.session_cookie(session_id)))
    }

    /// Resolve the session referenced by the request cookie, if any.
    pub async fn current(&self, jar: &CookieJar) -> AuthResult<Option<SessionData>> {
        match jar.get(&self.cookie_name) {
            Some(cookie) if !cookie.value().is_empty() => self.store.load(cookie.value()).await,
            _ => Ok(None),
        }
    }

    /// Require a signed-in session.
    pub async fn require(&self, jar: &CookieJar) -> AuthResult<SessionData> {
        match self.current(jar).await? {
            Some(data) if data.is_authenticated() => Ok(data),
            _ => Err(AuthError::NotLoggedIn),
        }
    }

    /// Drop the session (if any) and expire the cookie.
    pub async fn end(&self, jar: CookieJar) -> AuthResult<CookieJar> {
        if let Some(cookie) = jar.get(&self.cookie_name)
            && !cookie.value().is_empty()
        {
            self.store.remove(cookie.value()).await?;
        }
        Ok(jar.remove(Cookie::build(self.cookie_name.clone()).path("/")))
    }

    fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        let max_age = cookie::time::Duration::seconds(
            i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX),
        );
        Cookie::build((self.cookie_name.clone(), session_id))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            "recipes_api",
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn start_then_require_resolves_user() {
        let sessions = manager();
        let jar = sessions.start(CookieJar::new(), "admin").await.unwrap();

        let cookie = jar.get("recipes_api").unwrap();
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.path(), Some("/"));

        let data = sessions.require(&jar).await.unwrap();
        assert_eq!(data.username, "admin");
        assert_eq!(data.token.len(), 64);
    }

    #[tokio::test]
    async fn missing_cookie_is_not_logged_in() {
        let err = manager().require(&CookieJar::new()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn));
    }

    #[tokio::test]
    async fn unknown_session_is_not_logged_in() {
        let jar = CookieJar::new().add(Cookie::new("recipes_api", "forged"));
        let err = manager().require(&jar).await.unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn));
    }

    #[tokio::test]
    async fn empty_token_is_not_logged_in() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .save(
                "sid",
                &SessionData {
                    username: "admin".into(),
                    token: String::new(),
                },
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        let sessions = SessionManager::new(store, "recipes_api", Duration::from_secs(60));
        let jar = CookieJar::new().add(Cookie::new("recipes_api", "sid"));
        assert!(matches!(
            sessions.require(&jar).await.unwrap_err(),
            AuthError::NotLoggedIn
        ));
    }

    #[tokio::test]
    async fn end_is_idempotent() {
        let sessions = manager();
        let jar = sessions.start(CookieJar::new(), "admin").await.unwrap();
        let session_id = jar.get("recipes_api").unwrap().value().to_string();

        let jar = sessions.end(jar).await.unwrap();
        assert!(sessions.store().load(&session_id).await.unwrap().is_none());

        let again = CookieJar::new().add(Cookie::new("recipes_api", session_id));
        assert!(sessions.end(again).await.is_ok());
        assert!(sessions.end(jar).await.is_ok());
    }

    #[tokio::test]
    async fn memory_store_expires_records() {
        let store = MemorySessionStore::new();
        let data = SessionData {
            username: "admin".into(),
            token: "t".into(),
        };
        store.save("sid", &data, Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.load("sid").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted_without_being_read() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = SessionManager::new(store.clone(), "recipes_api", Duration::from_millis(1));
        for _ in 0..1_000 {
            sessions.start(CookieJar::new(), "admin").await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let long_lived = SessionManager::new(store.clone(), "recipes_api", Duration::from_secs(60));
        for _ in 0..10 {
            long_lived.start(CookieJar::new(), "admin").await.unwrap();
        }
        assert_eq!(store.len().await, 10);
    }

    #[tokio::test]
    async fn signing_in_again_replaces_the_previous_session() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = SessionManager::new(store.clone(), "recipes_api", Duration::from_secs(60));
        let jar = sessions.start(CookieJar::new(), "admin").await.unwrap();
        let first = jar.get("recipes_api").unwrap().value().to_string();

        let jar = sessions.start(jar, "admin").await.unwrap();
        assert_ne!(jar.get("recipes_api").unwrap().value(), first);
        assert!(store.load(&first).await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
