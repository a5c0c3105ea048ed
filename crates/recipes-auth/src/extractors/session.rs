//! Session extractor.
//!
//! Handlers or middleware that take an [`AuthenticatedSession`] only run for
//! requests carrying a signed-in session cookie; every other request is
//! rejected with 403 before the handler body executes.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::error::AuthError;
use crate::session::{SessionData, SessionManager};

/// The signed-in session of the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub SessionData);

impl AuthenticatedSession {
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl<S> FromRequestParts<S> for AuthenticatedSession
where
    S: Send + Sync,
    SessionManager: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionManager::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        sessions.require(&jar).await.map(AuthenticatedSession)
    }
}
