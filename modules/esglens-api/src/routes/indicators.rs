use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::cache::cache_key;
use crate::error::ApiError;
use crate::AppState;

/// The full BRSR indicator catalog. Heavily cached; it only changes with a
/// seed migration.
pub async fn definitions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let key = cache_key(&["indicators", "definitions", "all"]);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let indicators = state.indicators.all().await?;
    let body = serde_json::json!({
        "count": indicators.len(),
        "data": indicators,
    });
    state.cache.set(&key, &body).await;
    Ok(Json(body))
}
