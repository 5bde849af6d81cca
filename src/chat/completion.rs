// src/chat/completion.rs
// Completion client: primary (context-aware), fallback (context-free) and
// conversation summaries, over any CompletionProvider

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::CompletionError;

pub const TEMPERATURE: f32 = 0.7;
pub const PRIMARY_MAX_TOKENS: u32 = 1000;
pub const FALLBACK_MAX_TOKENS: u32 = 500;
pub const SUMMARY_TEMPERATURE: f32 = 0.3;
pub const SUMMARY_MAX_TOKENS: u32 = 200;

const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are an intelligent, memory-aware AI assistant. You have access to the user's previous conversations and important facts about them.

Use the following context from the user's memory to provide personalized, contextual responses:

{memory_context}

Instructions:
- Be conversational and helpful
- Reference relevant memories when appropriate
- Maintain consistency with previous interactions
- If you don't have relevant context, respond naturally
- Don't explicitly mention that you're using \"memories\" unless asked";

const FALLBACK_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Respond to the user's message naturally.";

const SUMMARY_SYSTEM_PROMPT: &str = "Summarize the following conversation in 2-3 sentences:";

/// System prompt for the primary completion with `context` embedded.
pub fn render_system_prompt(context: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{memory_context}", context)
}

/// Terminal degradation text; carries the failure detail.
pub fn apology(detail: &str) -> String {
    format!(
        "I apologize, but I'm experiencing technical difficulties. Please try again later. (Error: {detail})"
    )
}

/// One system + user exchange sent to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompletions {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompletions {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let start = Instant::now();
        let body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        debug!("OpenAI request: model={}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider { status, body });
        }

        let raw = response
            .json::<Value>()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let content = raw["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CompletionError::Malformed("no content in response".to_string()))?
            .to_string();

        debug!(
            "OpenAI response: model={} tokens={:?} latency_ms={}",
            request.model,
            raw["usage"]["total_tokens"].as_i64(),
            start.elapsed().as_millis()
        );
        Ok(content)
    }
}

pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    fallback_model: String,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        model: String,
        fallback_model: String,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model,
            fallback_model,
            timeout,
        }
    }

    async fn send(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| CompletionError::Timeout(self.timeout))?
    }

    /// Context-aware completion on the primary model.
    pub async fn complete(
        &self,
        user_message: &str,
        context: &str,
    ) -> Result<String, CompletionError> {
        self.send(CompletionRequest {
            model: self.model.clone(),
            system: render_system_prompt(context),
            user: user_message.to_string(),
            temperature: TEMPERATURE,
            max_tokens: PRIMARY_MAX_TOKENS,
        })
        .await
    }

    /// Context-free completion on the fallback model. Never fails: if the
    /// fallback also errors the apology text is returned instead.
    pub async fn complete_fallback(&self, user_message: &str) -> String {
        let result = self
            .send(CompletionRequest {
                model: self.fallback_model.clone(),
                system: FALLBACK_SYSTEM_PROMPT.to_string(),
                user: user_message.to_string(),
                temperature: TEMPERATURE,
                max_tokens: FALLBACK_MAX_TOKENS,
            })
            .await;

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!("Fallback completion via {} failed: {}", self.provider.name(), e);
                apology(&e.to_string())
            }
        }
    }

    /// Two-to-three sentence summary of a conversation transcript.
    pub async fn summarize(&self, conversation: &str) -> Result<String, CompletionError> {
        self.send(CompletionRequest {
            model: self.model.clone(),
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            user: conversation.to_string(),
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: SUMMARY_MAX_TOKENS,
        })
        .await
    }
}
