// tests/test_http_api.rs


use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use memory_assistant::{AppState, api::http_router};
use test_helpers::{ScriptedProvider, create_down_app_state, create_test_app_state};

fn app(state: Arc<AppState>) -> axum::Router {
    http_router(state)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let app = app(create_test_app_state(ScriptedProvider::answering("ok")));

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["service"].is_string());

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["memory"], "healthy");
    assert_eq!(body["services"]["api"], "running");
}

#[tokio::test]
async fn test_chat_then_list_and_analytics() {
    let provider = ScriptedProvider::answering("Nice to meet you, Ada.");
    let app = app(create_test_app_state(provider.clone()));

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "My name is Ada", "user_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Nice to meet you, Ada.");
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["memory_added"], true);
    assert_eq!(body["relevant_memories_count"], 0);
    assert!(body.get("error").is_none());
    assert!(!body["conversation_id"].as_str().unwrap().is_empty());

    let (status, body) = send(&app, get("/memory/u1?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["memories"][0]["metadata"]["type"], "conversation");

    let (status, body) = send(&app, get("/analytics/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_memories"], 2);
    assert_eq!(body["conversation_memories"], 2);
    assert_eq!(body["memory_distribution"], json!({ "conversation": 2 }));
    assert!(body["last_activity"].is_string());

    // The second turn recalls the first exchange
    let (_, body) = send(
        &app,
        post_json("/chat", json!({ "message": "What is my name?", "user_id": "u1" })),
    )
    .await;
    assert!(body["relevant_memories_count"].as_u64().unwrap() > 0);
    let requests = provider.recorded();
    assert!(requests[1].system.contains("user: My name is Ada"));
}

#[tokio::test]
async fn test_chat_rejects_blank_fields() {
    let app = app(create_test_app_state(ScriptedProvider::answering("ok")));

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "hello", "user_id": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error_code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        post_json("/chat", json!({ "message": "", "user_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_degrades_when_primary_fails() {
    let state = create_test_app_state(ScriptedProvider::failing(&["gpt-4", "gpt-3.5-turbo"]));
    let app = app(state);

    let (status, body) = send(
        &app,
        post_json(
            "/chat",
            json!({ "message": "hello", "user_id": "u3", "conversation_id": "c-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation_id"], "c-1");
    assert_eq!(body["memory_added"], false);
    assert!(body["error"].as_str().unwrap().contains("gpt-4 unavailable"));
    assert!(body["response"].as_str().unwrap().starts_with("I apologize"));

    let (_, body) = send(&app, get("/memory/u3")).await;
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn test_add_search_and_clear_memory() {
    let app = app(create_test_app_state(ScriptedProvider::answering("ok")));

    let (status, body) = send(
        &app,
        post_json(
            "/memory/u1",
            json!({ "content": "prefers green tea", "metadata": { "type": "preference" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u1");
    assert!(body["id"].is_string());

    let (status, body) = send(&app, get("/memory/u1/search?query=green%20tea&limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "green tea");
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["content"], "prefers green tea");
    assert!(body["results"][0]["score"].is_number());

    // Other users see nothing
    let (_, body) = send(&app, get("/memory/u2/search?query=green%20tea")).await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(&app, delete("/memory/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Memories cleared for user u1");

    let (_, body) = send(&app, get("/memory/u1")).await;
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn test_zero_limit_is_rejected() {
    let app = app(create_test_app_state(ScriptedProvider::answering("ok")));

    let (status, _) = send(&app, get("/memory/u1?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/memory/u1/search?query=x&limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_conversation_summary() {
    let provider = ScriptedProvider::answering("They discussed Oslo.");
    let app = app(create_test_app_state(provider));

    let (_, body) = send(&app, get("/memory/u1/conversations/c-9/summary")).await;
    assert_eq!(body["summary"], "No conversation found.");

    send(
        &app,
        post_json(
            "/memory/u1",
            json!({ "content": "user: I moved to Oslo", "metadata": { "conversation_id": "c-9" } }),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/memory/u1/conversations/c-9/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["conversation_id"], "c-9");
    assert_eq!(body["summary"], "They discussed Oslo.");
}

#[tokio::test]
async fn test_analytics_for_unknown_user() {
    let app = app(create_test_app_state(ScriptedProvider::answering("ok")));

    let (status, body) = send(&app, get("/analytics/nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_memories"], 0);
    assert_eq!(body["memory_distribution"], json!({}));
    assert!(body["last_activity"].is_null());
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let app = app(create_test_app_state(ScriptedProvider::answering("ok")));

    let (status, body) = send(&app, post_json("/chat", json!({ "user_id": "u1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error_code"], "BAD_REQUEST");

    let (status, body) = send(&app, post_json("/memory/u1", json!({ "metadata": {} }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "BAD_REQUEST");

    let (status, body) = send(&app, get("/memory/u1/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "BAD_REQUEST");

    let (status, body) = send(&app, get("/memory/u1?limit=many")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_store_outage_responses() {
    let app = app(create_down_app_state(ScriptedProvider::answering("still here")));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["services"]["memory"].as_str().unwrap().starts_with("unhealthy: "));
    assert_eq!(body["services"]["api"], "running");

    let (status, body) = send(&app, delete("/memory/u1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "INTERNAL_ERROR");

    let (status, body) = send(&app, get("/analytics/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(body.get("total_memories").is_none());

    let (status, body) = send(
        &app,
        post_json("/memory/u1", json!({ "content": "likes tea" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], true);

    // Reads degrade to empty, chat still answers without persisting
    let (status, body) = send(&app, get("/memory/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 0);

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "hello", "user_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "still here");
    assert_eq!(body["memory_added"], false);
    assert_eq!(body["relevant_memories_count"], 0);
}
