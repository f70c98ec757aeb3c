use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::cache::cache_key;
use crate::error::ApiError;
use crate::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let key = cache_key(&["companies", "all"]);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let companies = state.catalog.all().await?;
    let body = serde_json::json!({ "data": companies });
    state.cache.set(&key, &body).await;
    Ok(Json(body))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let key = cache_key(&["company", &id.to_string()]);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let company = state
        .catalog
        .by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))?;

    let body = serde_json::json!({ "data": company });
    state.cache.set(&key, &body).await;
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::BadRequest("query parameter q is required".into()));
    }
    let companies = state.catalog.search(&params.q).await?;
    Ok(Json(serde_json::json!({ "data": companies })))
}
