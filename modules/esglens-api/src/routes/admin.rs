use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use esglens_broker::{declare_durable, publish_persistent, Broker};
use esglens_common::{ExtractionTask, ObjectKey, EXTRACTION_QUEUE};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::AppState;

/// Pattern-invalidate one cache scope (e.g. `company`, `scores`).
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    RequireAuth(_principal): RequireAuth,
    Path(scope): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if scope.is_empty() || !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::BadRequest("invalid cache scope".into()));
    }

    let pattern = format!("{scope}*");
    let deleted = state.cache.delete_pattern(&pattern).await;
    info!(scope, deleted, "Cache invalidated");

    Ok(Json(serde_json::json!({ "scope": scope, "deleted": deleted })))
}

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    object_key: String,
}

/// Re-enqueue a stored document for extraction.
pub async fn trigger_processing(
    State(state): State<Arc<AppState>>,
    RequireAuth(_principal): RequireAuth,
    Json(request): Json<TriggerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Validate the key shape before it reaches the worker.
    let key = ObjectKey::parse(&request.object_key).map_err(ApiError::from)?;

    let task = ExtractionTask {
        object_key: key.raw.clone(),
    };
    let payload = serde_json::to_vec(&task)
        .map_err(|e| ApiError::Internal(format!("task serialization failed: {e}")))?;

    let broker = Broker::connect(&state.broker_config)
        .await
        .map_err(|_| ApiError::Unavailable("message broker unavailable".into()))?;
    let channel = broker
        .channel()
        .await
        .map_err(|_| ApiError::Unavailable("message broker unavailable".into()))?;
    declare_durable(&channel, EXTRACTION_QUEUE)
        .await
        .map_err(|_| ApiError::Unavailable("message broker unavailable".into()))?;
    publish_persistent(&channel, EXTRACTION_QUEUE, &payload)
        .await
        .map_err(|_| ApiError::Unavailable("message broker unavailable".into()))?;

    info!(object_key = key.raw, "Reprocessing triggered");

    Ok(Json(serde_json::json!({
        "queued": key.raw,
        "queue": EXTRACTION_QUEUE,
    })))
}
