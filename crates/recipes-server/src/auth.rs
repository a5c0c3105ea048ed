//! Sign-in, sign-out and token refresh.

use std::sync::Arc;

use axum_extra::extract::CookieJar;
use recipes_auth::{
    AuthError, AuthResult, JwtService, SessionManager, TokenOutput, token_from_header,
    verify_password,
};
use recipes_storage::DynUserStorage;
use serde::{Deserialize, Serialize};

pub const SIGNED_IN_MESSAGE: &str = "User signed in";
pub const SIGNED_OUT_MESSAGE: &str = "Signed out...";

/// Sign-in request body.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Sign-in response: an acknowledgement, or a bearer token when enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SignInResponse {
    Message { message: String },
    Token(TokenOutput),
}

#[derive(Clone)]
pub struct AuthService {
    users: DynUserStorage,
    sessions: SessionManager,
    jwt: Arc<JwtService>,
    issue_bearer_tokens: bool,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("sessions", &self.sessions)
            .field("jwt", &self.jwt)
            .field("issue_bearer_tokens", &self.issue_bearer_tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(users: DynUserStorage, sessions: SessionManager, jwt: Arc<JwtService>) -> Self {
        Self {
            users,
            sessions,
            jwt,
            issue_bearer_tokens: false,
        }
    }

    #[must_use]
    pub fn with_bearer_tokens(mut self, enabled: bool) -> Self {
        self.issue_bearer_tokens = enabled;
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Check credentials and start a session.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn sign_in(
        &self,
        jar: CookieJar,
        credentials: &Credentials,
    ) -> AuthResult<(CookieJar, SignInResponse)> {
        let user = self.users.find_by_username(&credentials.username).await?;
        let Some(user) = user.filter(|u| verify_password(&credentials.password, &u.password))
        else {
            tracing::info!(username = %credentials.username, "Rejected sign-in");
            return Err(AuthError::InvalidCredentials);
        };

        let jar = self.sessions.start(jar, &user.username).await?;
        tracing::info!(username = %user.username, "User signed in");

        let body = if self.issue_bearer_tokens {
            SignInResponse::Token(self.jwt.issue(&user.username)?)
        } else {
            SignInResponse::Message {
                message: SIGNED_IN_MESSAGE.to_string(),
            }
        };
        Ok((jar, body))
    }

    /// End the current session, if any, and expire the cookie.
    pub async fn sign_out(&self, jar: CookieJar) -> AuthResult<CookieJar> {
        self.sessions.end(jar).await
    }

    /// Exchange a nearly expired bearer token for a fresh one.
    pub fn refresh(&self, authorization: Option<&str>) -> AuthResult<TokenOutput> {
        let token = authorization
            .and_then(token_from_header)
            .ok_or_else(|| AuthError::invalid_token("missing bearer token"))?;
        let output = self.jwt.refresh(token)?;
        tracing::debug!(expires = %output.expires, "Token refreshed");
        Ok(output)
    }
}
