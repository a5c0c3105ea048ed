use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Recipes API",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            storage: None,
            cache: None,
            error: None,
        }),
    )
}

/// Ready once the recipe store answers its health probe.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.catalog.storage().backend_name();
    let cache = state.catalog.cache().map(|c| c.backend().stats().mode);
    match state.catalog.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                storage: Some(storage),
                cache,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, storage, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    storage: Some(storage),
                    cache,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
