// src/memory/backend.rs

//! Core trait for memory backends (Qdrant + Neo4j, in-memory, ...).
//! All storage and recall goes through this; the store adapter decides
//! which failures are swallowed and which are surfaced.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::memory::types::{MemoryRecord, NewMemory, RecordId, SearchResult};

#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Persist one record and return its id.
    async fn insert(&self, memory: NewMemory) -> Result<RecordId, StoreError>;

    /// Relevance search scoped to `user_id`, best match first, at most `limit`.
    async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;

    /// Up to `limit` records for `user_id`, most recent first.
    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, StoreError>;

    /// Remove every record belonging to `user_id`.
    async fn delete_all(&self, user_id: &str) -> Result<(), StoreError>;

    /// Cheap connectivity check against every backing store.
    async fn ping(&self) -> Result<(), StoreError>;
}
