//! Recipes API server.
//!
//! Wires storage, the recipe list cache and session authentication into an
//! axum router.

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod server;

pub use config::AppConfig;
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{AppState, RecipesServer, ServerBuilder, build_app, build_state, router};
