// src/api/http/analytics.rs

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::{
    analytics::{AnalyticsReport, aggregate},
    state::AppState,
};

/// GET /analytics/{user_id}
pub async fn user_analytics_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<AnalyticsReport> {
    Json(aggregate(&app_state.memory, &user_id).await)
}
