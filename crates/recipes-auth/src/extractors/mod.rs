//! Axum extractors for authenticated requests.

mod session;

pub use session::AuthenticatedSession;
