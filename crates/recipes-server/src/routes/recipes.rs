use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use recipes_api::{ApiError, ApiResult, JsonBody, MessageBody};
use recipes_core::{Recipe, RecipePayload};
use serde::Deserialize;

use crate::server::AppState;

pub const RECIPE_UPDATED_MESSAGE: &str = "Recipe updated";
pub const RECIPE_DELETED_MESSAGE: &str = "Recipe deleted";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub tag: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    Ok(Json(state.catalog.list().await?))
}

pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Recipe>>> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    // A missing tag searches for the empty tag and finds nothing
    let tag = params.tag.unwrap_or_default();
    Ok(Json(state.catalog.search_by_tag(&tag).await?))
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> ApiResult<Json<Recipe>> {
    Ok(Json(state.catalog.create(payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> ApiResult<MessageBody> {
    state.catalog.update(&id, payload).await?;
    Ok(MessageBody::new(RECIPE_UPDATED_MESSAGE))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MessageBody> {
    state.catalog.delete(&id).await?;
    Ok(MessageBody::new(RECIPE_DELETED_MESSAGE))
}
