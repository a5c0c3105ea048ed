//! Session records in Redis, shared by every server instance.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use recipes_auth::{AuthError, AuthResult, SessionData, SessionStore};
use redis::AsyncCommands;

const SESSION_KEY_PREFIX: &str = "session:";

fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

/// Stores each session as JSON under `session:{id}` with a Redis expiry.
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: Pool,
}

impl RedisSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> AuthResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| AuthError::session(format!("redis pool: {e}")))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> AuthResult<Option<SessionData>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn
            .get(session_key(session_id))
            .await
            .map_err(|e| AuthError::session(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring undecodable session record");
                    Ok(None)
                }
            },
        }
    }

    async fn save(&self, session_id: &str, data: &SessionData, ttl: Duration) -> AuthResult<()> {
        let raw = serde_json::to_string(data).map_err(|e| AuthError::internal(e.to_string()))?;
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(session_key(session_id), raw, ttl.as_secs().max(1))
            .await
            .map_err(|e| AuthError::session(e.to_string()))
    }

    async fn remove(&self, session_id: &str) -> AuthResult<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(session_key(session_id))
            .await
            .map_err(|e| AuthError::session(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
