use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use recipes_auth::AuthenticatedSession;
use uuid::Uuid;

/// Propagate `x-request-id`, generating one when the client sent none.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    let req_id_value = match req.headers().get(&header_name) {
        Some(value) => value.clone(),
        None => HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };

    // Request extensions carry the id to the trace span
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

/// Guard for routes that change the catalog.
///
/// The [`AuthenticatedSession`] extractor rejects requests without a signed-in
/// session with 403, so `next` only runs for authenticated callers.
pub async fn require_session(
    session: AuthenticatedSession,
    req: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!(
        username = %session.username(),
        method = %req.method(),
        path = %req.uri().path(),
        "Authenticated request"
    );
    next.run(req).await
}
