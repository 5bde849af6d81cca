// src/memory/store.rs
// Store adapter: user-scoped memory operations over any MemoryBackend.
// Reads are best-effort (empty on failure), writes report failure to the caller.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::memory::backend::MemoryBackend;
use crate::memory::types::{
    MemoryRecord, Metadata, NewMemory, RecordId, Role, SearchResult, conversation_metadata,
};

/// Identity used by health probes; never holds real user data.
pub const HEALTH_PROBE_USER: &str = "health_check";

/// Outcome of [`MemoryStore::health_check`], rendered as
/// `"healthy"` or `"unhealthy: <detail>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => f.write_str("healthy"),
            HealthStatus::Unhealthy(detail) => write!(f, "unhealthy: {detail}"),
        }
    }
}

impl Serialize for HealthStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub struct MemoryStore {
    backend: Arc<dyn MemoryBackend>,
    timeout: Duration,
}

impl MemoryStore {
    pub fn new(backend: Arc<dyn MemoryBackend>, timeout: Duration) -> Self {
        info!("Memory store using '{}' backend", backend.name());
        Self { backend, timeout }
    }

    /// Bound a backend call; a stalled backend counts as unavailable.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!(
                    "{} timed out after {:?}",
                    self.backend.name(),
                    self.timeout
                ))
            })?
    }

    /// Store one record stamped with the current time.
    pub async fn add(
        &self,
        content: &str,
        user_id: &str,
        metadata: Metadata,
    ) -> Result<RecordId, StoreError> {
        let memory = NewMemory {
            user_id: user_id.to_string(),
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        let id = self.bounded(self.backend.insert(memory)).await?;
        debug!("Added memory {} for user {}", id, user_id);
        Ok(id)
    }

    /// Store each message as a conversation record (`"<role>: <text>"`).
    /// Individual failures are logged and skipped; the ids that were stored
    /// are returned.
    pub async fn add_conversation(
        &self,
        user_id: &str,
        messages: &[(Role, &str)],
    ) -> Vec<RecordId> {
        let mut ids = Vec::with_capacity(messages.len());
        for (role, text) in messages {
            let content = format!("{role}: {text}");
            match self.add(&content, user_id, conversation_metadata(*role)).await {
                Ok(id) => ids.push(id),
                Err(e) => warn!("Failed to store {} message for user {}: {}", role, user_id, e),
            }
        }
        ids
    }

    /// Relevance search scoped to `user_id`. Never fails: backend errors
    /// yield an empty result.
    pub async fn search(&self, user_id: &str, query: &str, limit: usize) -> Vec<SearchResult> {
        match self.bounded(self.backend.search(user_id, query, limit)).await {
            Ok(mut results) => {
                results.truncate(limit);
                results
            }
            Err(e) => {
                warn!("Memory search failed for user {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Most recent records first. Never fails: backend errors yield an
    /// empty result.
    pub async fn list_all(&self, user_id: &str, limit: usize) -> Vec<MemoryRecord> {
        self.try_list_all(user_id, limit).await.unwrap_or_else(|e| {
            warn!("Listing memories failed for user {}: {}", user_id, e);
            Vec::new()
        })
    }

    /// Like [`list_all`](Self::list_all) but surfaces backend errors.
    pub async fn try_list_all(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let mut records = self.bounded(self.backend.list(user_id, limit)).await?;
        records.truncate(limit);
        Ok(records)
    }

    /// Delete every record for `user_id`; `false` if the backend refused.
    pub async fn clear_all(&self, user_id: &str) -> bool {
        match self.bounded(self.backend.delete_all(user_id)).await {
            Ok(()) => {
                info!("Cleared memories for user {}", user_id);
                true
            }
            Err(e) => {
                warn!("Clearing memories failed for user {}: {}", user_id, e);
                false
            }
        }
    }

    /// Probe search under [`HEALTH_PROBE_USER`] plus a ping of every store.
    pub async fn health_check(&self) -> HealthStatus {
        let probe = async {
            self.bounded(self.backend.search(HEALTH_PROBE_USER, "test", 1))
                .await?;
            self.bounded(self.backend.ping()).await
        };
        match probe.await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}
