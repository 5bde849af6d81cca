// src/memory/in_memory.rs
// Process-local backend for development (`--in-memory`) and tests.
// Relevance is keyword overlap between query and content.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::memory::backend::MemoryBackend;
use crate::memory::types::{MemoryRecord, NewMemory, RecordId, SearchResult};

struct StoredMemory {
    user_id: String,
    record: MemoryRecord,
}

/// Records are kept in insertion order; newest last.
#[derive(Default)]
pub struct InMemoryBackend {
    records: RwLock<Vec<StoredMemory>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Fraction of distinct query words found in `content`.
fn overlap_score(query: &HashSet<String>, content: &str) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let content = tokens(content);
    let hits = query.iter().filter(|t| content.contains(*t)).count();
    hits as f32 / query.len() as f32
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn insert(&self, memory: NewMemory) -> Result<RecordId, StoreError> {
        let id = Uuid::new_v4().to_string();
        let record = MemoryRecord {
            id: id.clone(),
            content: memory.content,
            created_at: memory.created_at,
            metadata: memory.metadata,
        };
        self.records.write().await.push(StoredMemory {
            user_id: memory.user_id,
            record,
        });
        Ok(id)
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let query = tokens(query);
        let records = self.records.read().await;

        // Newest first, then a stable sort by score keeps recency as tiebreak.
        let mut results: Vec<SearchResult> = records
            .iter()
            .rev()
            .filter(|m| m.user_id == user_id)
            .map(|m| SearchResult {
                score: overlap_score(&query, &m.record.content),
                record: m.record.clone(),
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        Ok(results)
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|m| m.user_id == user_id)
            .take(limit)
            .map(|m| m.record.clone())
            .collect())
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), StoreError> {
        self.records.write().await.retain(|m| m.user_id != user_id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
