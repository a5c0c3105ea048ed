use axum::{Json, extract::State, http::HeaderMap, http::header::AUTHORIZATION};
use axum_extra::extract::CookieJar;
use recipes_api::{ApiResult, JsonBody, MessageBody};
use recipes_auth::TokenOutput;

use crate::auth::{Credentials, SIGNED_OUT_MESSAGE, SignInResponse};
use crate::server::AppState;

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ApiResult<(CookieJar, Json<SignInResponse>)> {
    let (jar, body) = state.auth.sign_in(jar, &credentials).await?;
    Ok((jar, Json(body)))
}

pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, MessageBody)> {
    let jar = state.auth.sign_out(jar).await?;
    Ok((jar, MessageBody::new(SIGNED_OUT_MESSAGE)))
}

pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<TokenOutput>> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    Ok(Json(state.auth.refresh(authorization)?))
}
