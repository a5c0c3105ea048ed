//! HTTP routes.

pub mod auth;
pub mod recipes;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{handlers, middleware as app_middleware, server::AppState};

/// Public and session-guarded routes, bound to `state`.
pub fn routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/recipes", get(recipes::list))
        .route("/recipes/search", get(recipes::search))
        .route("/signin", post(auth::sign_in))
        .route("/signout", post(auth::sign_out))
        .route("/refresh", post(auth::refresh));

    // The guard runs before any extractor of the wrapped handler
    let protected = Router::new()
        .route("/recipes", post(recipes::create))
        .route("/recipes/{id}", put(recipes::update).delete(recipes::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::require_session,
        ));

    public.merge(protected).with_state(state)
}
