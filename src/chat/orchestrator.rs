// src/chat/orchestrator.rs
// Memory-augmented chat flow: recall -> contextualize -> respond -> persist.
// Recall and persist are best-effort; only the primary completion has a
// dedicated fallback path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::completion::CompletionClient;
use crate::chat::context::build_memory_context;
use crate::memory::store::MemoryStore;
use crate::memory::types::Role;

/// Number of memories recalled per message
pub const RECALL_LIMIT: usize = 5;
/// Records scanned when summarizing a conversation
pub const SUMMARY_SCAN_LIMIT: usize = 50;

pub const NO_CONVERSATION_FOUND: &str = "No conversation found.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub user_id: String,
    pub conversation_id: String,
    pub memory_added: bool,
    pub relevant_memories_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ChatOrchestrator {
    memory: Arc<MemoryStore>,
    completions: Arc<CompletionClient>,
}

impl ChatOrchestrator {
    pub fn new(memory: Arc<MemoryStore>, completions: Arc<CompletionClient>) -> Self {
        Self {
            memory,
            completions,
        }
    }

    /// Answer `message` for `user_id`, using and then extending their memory.
    pub async fn process_message(
        &self,
        message: &str,
        user_id: &str,
        conversation_id: Option<String>,
    ) -> ChatResponse {
        let conversation_id = conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let relevant = self.memory.search(user_id, message, RECALL_LIMIT).await;
        let context = build_memory_context(&relevant);

        let reply = match self.completions.complete(message, &context).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Primary completion failed for user {}: {}", user_id, e);
                let response = self.completions.complete_fallback(message).await;
                return ChatResponse {
                    response,
                    user_id: user_id.to_string(),
                    conversation_id,
                    memory_added: false,
                    relevant_memories_count: relevant.len(),
                    error: Some(e.to_string()),
                };
            }
        };

        // conversation_id is deliberately not written to the record metadata
        let ids = self
            .memory
            .add_conversation(user_id, &[(Role::User, message), (Role::Assistant, reply.as_str())])
            .await;

        info!(
            "Chat for user {} (conversation {}): {} memories recalled, {} stored",
            user_id,
            conversation_id,
            relevant.len(),
            ids.len()
        );

        ChatResponse {
            response: reply,
            user_id: user_id.to_string(),
            conversation_id,
            memory_added: !ids.is_empty(),
            relevant_memories_count: relevant.len(),
            error: None,
        }
    }

    /// Summarize the records tagged with `conversation_id`.
    pub async fn summarize_conversation(&self, user_id: &str, conversation_id: &str) -> String {
        let records = self.memory.list_all(user_id, SUMMARY_SCAN_LIMIT).await;
        let transcript: Vec<&str> = records
            .iter()
            .filter(|r| r.conversation_id() == Some(conversation_id))
            .map(|r| r.content.as_str())
            .collect();

        if transcript.is_empty() {
            return NO_CONVERSATION_FOUND.to_string();
        }

        match self.completions.summarize(&transcript.join("\n")).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summary failed for conversation {}: {}", conversation_id, e);
                format!("Error generating summary: {e}")
            }
        }
    }
}
