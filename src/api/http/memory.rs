// src/api/http/memory.rs

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{
    api::error::{ApiError, ApiResult, IntoApiError, require_non_blank, require_positive_limit},
    memory::types::{MemoryRecord, Metadata, RecordId, SearchResult},
    state::AppState,
};

fn default_list_limit() -> usize {
    10
}

fn default_search_limit() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddMemoryPayload {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct AddMemoryResponse {
    pub id: RecordId,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct MemoryListResponse {
    pub memories: Vec<MemoryRecord>,
    pub user_id: String,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub user_id: String,
    pub results: Vec<SearchResult>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub user_id: String,
    pub conversation_id: String,
    pub summary: String,
}

/// POST /memory/{user_id}
pub async fn add_memory(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: Result<Json<AddMemoryPayload>, JsonRejection>,
) -> ApiResult<Json<AddMemoryResponse>> {
    let Json(payload) = payload?;
    require_non_blank("content", &payload.content)?;

    let id = app_state
        .memory
        .add(&payload.content, &user_id, payload.metadata)
        .await
        .into_api_error("Failed to add memory")?;

    Ok(Json(AddMemoryResponse { id, user_id }))
}

/// GET /memory/{user_id}?limit=10
pub async fn list_memories(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<MemoryListResponse>> {
    let Query(params) = params?;
    let limit = require_positive_limit(params.limit)?;
    let memories = app_state.memory.list_all(&user_id, limit).await;

    Ok(Json(MemoryListResponse {
        total_count: memories.len(),
        memories,
        user_id,
    }))
}

/// DELETE /memory/{user_id}
pub async fn clear_memories(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ClearResponse>> {
    if !app_state.memory.clear_all(&user_id).await {
        return Err(ApiError::internal("Failed to clear memories"));
    }

    info!("Memories cleared for user {}", user_id);
    Ok(Json(ClearResponse {
        status: "success",
        message: format!("Memories cleared for user {user_id}"),
    }))
}

/// GET /memory/{user_id}/search?query=..&limit=5
pub async fn search_memories(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Query(params) = params?;
    let limit = require_positive_limit(params.limit)?;
    let results = app_state
        .memory
        .search(&user_id, &params.query, limit)
        .await;

    Ok(Json(SearchResponse {
        count: results.len(),
        query: params.query,
        user_id,
        results,
    }))
}

/// GET /memory/{user_id}/conversations/{conversation_id}/summary
pub async fn conversation_summary(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, conversation_id)): Path<(String, String)>,
) -> Json<SummaryResponse> {
    let summary = app_state
        .orchestrator
        .summarize_conversation(&user_id, &conversation_id)
        .await;

    Json(SummaryResponse {
        user_id,
        conversation_id,
        summary,
    })
}
