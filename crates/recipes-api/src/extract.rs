use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body whose rejections render as 400 `{"error": ...}`.
///
/// Unlike `axum::Json` the `Content-Type` header is not checked; any body
/// that parses as the target type is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Login {
        username: String,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/signin")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn parses_without_content_type() {
        let JsonBody(login) = JsonBody::<Login>::from_request(request(r#"{"username":"admin"}"#), &())
            .await
            .unwrap();
        assert_eq!(login.username, "admin");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = JsonBody::<Login>::from_request(request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_shape_is_bad_request() {
        let err = JsonBody::<Login>::from_request(request(r#"{"username": 5}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
