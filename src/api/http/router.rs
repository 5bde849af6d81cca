// src/api/http/router.rs
// HTTP router composition for REST API endpoints

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    analytics::user_analytics_handler,
    chat::rest_chat_handler,
    handlers::{health_handler, root_handler},
    memory::{
        add_memory, clear_memories, conversation_summary, list_memories, search_memories,
    },
};
use crate::state::AppState;

/// Main HTTP router for health, chat, memory and analytics endpoints
pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // Chat (REST)
        .route("/chat", post(rest_chat_handler))
        // Memory
        .route(
            "/memory/{user_id}",
            get(list_memories).post(add_memory).delete(clear_memories),
        )
        .route("/memory/{user_id}/search", get(search_memories))
        .route(
            "/memory/{user_id}/conversations/{conversation_id}/summary",
            get(conversation_summary),
        )
        // Analytics
        .route("/analytics/{user_id}", get(user_analytics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
