//! Authentication error types.

use axum::response::{IntoResponse, Response};
use recipes_api::ApiError;
use recipes_storage::StorageError;

/// Errors that can occur while authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown user or wrong password. Both cases render identically.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session cookie, unknown session or a session without a token.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The bearer token is malformed, badly signed or already expired.
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// Refresh requested too early.
    #[error("Token not expired yet")]
    TokenNotExpired,

    /// Session backend failure.
    #[error("Session store error: {message}")]
    Session { message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AuthError {
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken { .. } => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::NotLoggedIn => ApiError::forbidden(err.to_string()),
            AuthError::TokenNotExpired => ApiError::bad_request(err.to_string()),
            AuthError::Storage(e) => ApiError::from(e),
            AuthError::Session { .. } | AuthError::Internal { .. } => {
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
