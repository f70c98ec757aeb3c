use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::AppState;

/// Unauthenticated health probe: reports dependency reachability.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    let body = Json(serde_json::json!({
        "status": if db_ok { "healthy" } else { "unhealthy" },
        "components": {
            "database": db_ok,
            "cache": state.cache.enabled(),
            "document_store": state.telemetry.is_some(),
        },
    }));

    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, body)
}
