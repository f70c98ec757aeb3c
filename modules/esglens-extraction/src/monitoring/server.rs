use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use super::health::HealthChecker;
use super::metrics::MetricsCollector;

#[derive(Clone)]
pub struct MonitorState {
    pub metrics: Arc<MetricsCollector>,
    pub health: Arc<HealthChecker>,
}

/// Tiny per-worker HTTP server exposing `/health` and `/metrics`.
pub fn router(state: MonitorState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the monitoring endpoints in the background.
pub fn spawn(state: MonitorState, port: u16) {
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{port}");
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr, error = %e, "Monitoring server failed to bind");
                return;
            }
        };
        info!(addr, "Monitoring server listening");
        if let Err(e) = axum::serve(listener, router(state)).await {
            error!(error = %e, "Monitoring server exited");
        }
    });
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "extraction-worker",
        "endpoints": { "/health": "health check", "/metrics": "metrics (JSON)" },
    }))
}

async fn health(State(state): State<MonitorState>) -> impl IntoResponse {
    let status = state.health.status();
    let code = if state.health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn metrics(State(state): State<MonitorState>) -> Json<serde_json::Value> {
    Json(state.metrics.aggregate())
}
