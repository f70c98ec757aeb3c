use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct LatestParams {
    limit: Option<i64>,
}

/// Latest telemetry snapshots, newest first.
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatestParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let collection = state
        .telemetry
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("document store not configured".into()))?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let cursor = collection
        .find(doc! {})
        .sort(doc! { "scraped_datetime_utc": -1 })
        .limit(limit)
        .await
        .map_err(|e| ApiError::Unavailable(format!("document store query failed: {e}")))?;

    let documents: Vec<mongodb::bson::Document> = cursor
        .try_collect()
        .await
        .map_err(|e| ApiError::Unavailable(format!("document store read failed: {e}")))?;

    let data: Vec<serde_json::Value> = documents
        .into_iter()
        .map(|mut d| {
            // The store-assigned id is not part of the snapshot.
            d.remove("_id");
            serde_json::to_value(d).unwrap_or_default()
        })
        .collect();

    Ok(Json(serde_json::json!({ "count": data.len(), "data": data })))
}
