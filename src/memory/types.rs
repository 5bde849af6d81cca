// src/memory/types.rs
// Memory records, search results and the metadata vocabulary

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned when a record is stored.
pub type RecordId = String;

/// Arbitrary key-value tags attached to a record.
pub type Metadata = BTreeMap<String, String>;

pub const TYPE_KEY: &str = "type";
pub const ROLE_KEY: &str = "role";
pub const CONVERSATION_ID_KEY: &str = "conversation_id";

/// Value of `metadata.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Conversation,
    General,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Conversation => "conversation",
            MemoryType::General => "general",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of a conversation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one side of a chat exchange.
pub fn conversation_metadata(role: Role) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(TYPE_KEY.to_string(), MemoryType::Conversation.to_string());
    metadata.insert(ROLE_KEY.to_string(), role.to_string());
    metadata
}

/// A stored fact or utterance belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl MemoryRecord {
    /// `metadata.type`, if the record carries one.
    pub fn memory_type(&self) -> Option<&str> {
        self.metadata.get(TYPE_KEY).map(String::as_str)
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.metadata.get(CONVERSATION_ID_KEY).map(String::as_str)
    }
}

/// A record scored against a query. Higher scores are more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: MemoryRecord,
    pub score: f32,
}

/// A record on its way into a backend.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub user_id: String,
    pub content: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}
