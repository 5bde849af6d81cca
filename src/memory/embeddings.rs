// src/memory/embeddings.rs
// OpenAI embeddings client used by the vector store

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::StoreError;

/// Max text length sent for a single embedding
const EMBED_TEXT_MAX_CHARS: usize = 8000;

pub struct OpenAiEmbeddings {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(client: Client, api_key: String, base_url: String, model: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Generate embedding for text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let text = truncate_chars(text, EMBED_TEXT_MAX_CHARS);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::from_http(e, false))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!(
                "embedding API error {status}: {error_text}"
            )));
        }

        let raw = response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let embedding: Vec<f32> = raw["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| StoreError::Read("no embedding in response".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        debug!("Embedded {} chars into {} dims", text.len(), embedding.len());
        Ok(embedding)
    }
}

/// Cut `text` to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
