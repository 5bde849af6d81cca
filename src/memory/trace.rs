// src/memory/trace.rs
// Optional Langfuse sink for memory operations. Events are shipped from a
// spawned task so a slow or failing sink never delays a request.

use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::LangfuseConfig;

#[derive(Clone)]
pub struct LangfuseTracer {
    client: Client,
    ingestion_url: String,
    public_key: String,
    secret_key: String,
}

impl LangfuseTracer {
    pub fn new(client: Client, config: &LangfuseConfig) -> Self {
        Self {
            client,
            ingestion_url: format!("{}/api/public/ingestion", config.host.trim_end_matches('/')),
            public_key: config.public_key.clone(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Fire-and-forget one event. Must be called inside a tokio runtime.
    pub fn record(&self, name: &str, user_id: &str, input: Value) {
        let body = event_batch(name, user_id, input);
        let tracer = self.clone();
        tokio::spawn(async move {
            let result = tracer
                .client
                .post(&tracer.ingestion_url)
                .basic_auth(&tracer.public_key, Some(&tracer.secret_key))
                .json(&body)
                .send()
                .await;
            match result {
                Ok(resp) if resp.status().is_success() => debug!("Trace event delivered"),
                Ok(resp) => warn!("Langfuse rejected trace event: {}", resp.status()),
                Err(e) => warn!("Failed to deliver trace event: {}", e),
            }
        });
    }
}

fn event_batch(name: &str, user_id: &str, input: Value) -> Value {
    let now = Utc::now().to_rfc3339();
    json!({
        "batch": [{
            "id": Uuid::new_v4().to_string(),
            "timestamp": now,
            "type": "event-create",
            "body": {
                "id": Uuid::new_v4().to_string(),
                "name": name,
                "userId": user_id,
                "startTime": now,
                "input": input,
            }
        }]
    })
}
