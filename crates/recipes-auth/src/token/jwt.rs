//! HS256 bearer tokens.
//!
//! Tokens are valid for five minutes. A token can be exchanged for a fresh
//! one only during the last 30 seconds of its life; earlier attempts are
//! refused so clients cannot extend a token indefinitely.
//!
//! Expiry is checked against an injectable [`JwtClock`] instead of
//! `jsonwebtoken`'s built-in wall clock so the refresh window is testable.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use recipes_core::Timestamp;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;

/// Lifetime of an issued token.
pub const TOKEN_LIFETIME_SECS: i64 = 5 * 60;

/// A token may be refreshed once it has at most this many seconds left.
pub const REFRESH_WINDOW_SECS: i64 = 30;

/// Source of "now" for expiry checks.
pub trait JwtClock: Send + Sync {
    fn now_epoch_secs(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Clock frozen at a given epoch second.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: i64,
}

/// Issued token and its expiry, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOutput {
    pub token: String,
    pub expires: Timestamp,
}

/// Signs and validates bearer tokens with a shared secret.
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock: Arc<dyn JwtClock>,
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("secret", &"[REDACTED]")
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::internal("JWT secret must not be empty"));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            clock: Arc::new(SystemClock),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn JwtClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a fresh token for `username`.
    pub fn issue(&self, username: &str) -> Result<TokenOutput, AuthError> {
        let exp = self.clock.now_epoch_secs() + TOKEN_LIFETIME_SECS;
        self.sign(Claims {
            username: username.to_string(),
            exp,
        })
    }

    /// Validate signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::invalid_token("signature mismatch"),
            _ => AuthError::invalid_token(e.to_string()),
        })?;

        if data.claims.exp <= self.clock.now_epoch_secs() {
            return Err(AuthError::invalid_token("token expired"));
        }
        Ok(data.claims)
    }

    /// Exchange a token that is about to expire for a new one.
    pub fn refresh(&self, token: &str) -> Result<TokenOutput, AuthError> {
        let mut claims = self.decode(token)?;
        let now = self.clock.now_epoch_secs();
        if claims.exp - now > REFRESH_WINDOW_SECS {
            return Err(AuthError::TokenNotExpired);
        }
        claims.exp = now + TOKEN_LIFETIME_SECS;
        self.sign(claims)
    }

    fn sign(&self, claims: Claims) -> Result<TokenOutput, AuthError> {
        let expires = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|e| AuthError::internal(format!("invalid expiry: {e}")))?;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::internal(format!("failed to sign token: {e}")))?;
        Ok(TokenOutput {
            token,
            expires: Timestamp::new(expires),
        })
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Both `Bearer <token>` and a bare token are accepted.
pub fn token_from_header(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "eUbP9shywUygMx7u";
    const NOW: i64 = 1_704_067_200;

    fn service_at(now: i64) -> JwtService {
        JwtService::new(SECRET)
            .unwrap()
            .with_clock(Arc::new(FixedClock(now)))
    }

    #[test]
    fn issued_token_decodes() {
        let output = service_at(NOW).issue("admin").unwrap();
        assert_eq!(output.expires.inner().unix_timestamp(), NOW + TOKEN_LIFETIME_SECS);

        let claims = service_at(NOW + 10).decode(&output.token).unwrap();
        assert_eq!(claims.username, "admin");
    }

    #[test]
    fn refresh_too_early_is_rejected() {
        let output = service_at(NOW).issue("admin").unwrap();
        let err = service_at(NOW + 60).refresh(&output.token).unwrap_err();
        assert!(matches!(err, AuthError::TokenNotExpired));
    }

    #[test]
    fn refresh_inside_window_extends_from_now() {
        let output = service_at(NOW).issue("admin").unwrap();
        let refresh_at = NOW + TOKEN_LIFETIME_SECS - 20;

        let refreshed = service_at(refresh_at).refresh(&output.token).unwrap();
        assert_eq!(
            refreshed.expires.inner().unix_timestamp(),
            refresh_at + TOKEN_LIFETIME_SECS
        );
        let claims = service_at(refresh_at).decode(&refreshed.token).unwrap();
        assert_eq!(claims.username, "admin");
    }

    #[test]
    fn exactly_thirty_seconds_left_is_refreshable() {
        let output = service_at(NOW).issue("admin").unwrap();
        let at = NOW + TOKEN_LIFETIME_SECS - REFRESH_WINDOW_SECS;
        assert!(service_at(at).refresh(&output.token).is_ok());
    }

    #[test]
    fn expired_token_is_invalid() {
        let output = service_at(NOW).issue("admin").unwrap();
        let err = service_at(NOW + TOKEN_LIFETIME_SECS + 1)
            .refresh(&output.token)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let forged = JwtService::new("another-secret")
            .unwrap()
            .with_clock(Arc::new(FixedClock(NOW)))
            .issue("admin")
            .unwrap();
        let err = service_at(NOW).decode(&forged.token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            service_at(NOW).decode("not.a.jwt").unwrap_err(),
            AuthError::InvalidToken { .. }
        ));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(JwtService::new("").is_err());
    }

    #[test]
    fn parses_authorization_header() {
        assert_eq!(token_from_header("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(token_from_header("bearer   abc"), Some("abc"));
        assert_eq!(token_from_header("abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(token_from_header("  "), None);
        assert_eq!(token_from_header("Bearer "), None);
    }
}
