// src/api/http/chat.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    api::error::{ApiResult, require_non_blank},
    chat::ChatResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RestChatRequest {
    pub message: String,
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// POST /chat
pub async fn rest_chat_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<RestChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(body) = payload?;
    let user_id = require_non_blank("user_id", &body.user_id)?;
    let message = require_non_blank("message", &body.message)?;

    info!("REST chat request from user {}", user_id);

    let response = app_state
        .orchestrator
        .process_message(message, user_id, body.conversation_id.clone())
        .await;
    Ok(Json(response))
}
