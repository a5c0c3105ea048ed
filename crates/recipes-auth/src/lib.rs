//! Authentication for the recipes API.
//!
//! - [`password`]: credential digests (Argon2id, legacy SHA-256 hex)
//! - [`session`]: server-side sessions referenced by an HTTP-only cookie
//! - [`token`]: short-lived HS256 bearer tokens and their refresh rule
//! - [`extractors`]: axum extractors that enforce an authenticated session

pub mod error;
pub mod extractors;
pub mod password;
pub mod session;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use extractors::AuthenticatedSession;
pub use password::{hash_password, legacy_digest, verify_password};
pub use session::{
    DynSessionStore, MemorySessionStore, SessionData, SessionManager, SessionStore,
    generate_session_token,
};
pub use token::jwt::{
    Claims, FixedClock, JwtClock, JwtService, SystemClock, TokenOutput, token_from_header,
};
