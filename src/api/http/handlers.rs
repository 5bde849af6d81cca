// src/api/http/handlers.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "Enterprise Memory-Aware AI Assistant";

/// Liveness
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check handler; 503 when the memory store is unhealthy
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let memory = app_state.memory.health_check().await;
    let (status_code, status) = if memory.is_healthy() {
        (StatusCode::OK, "healthy")
    } else {
        warn!("Health check failed: {}", memory);
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "services": {
                "memory": memory,
                "api": "running",
            }
        })),
    )
}
