// src/memory/hybrid.rs
// Production backend: Qdrant answers search and listing, Neo4j mirrors the
// user -> memory relationships, Langfuse (optional) receives trace events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::memory::backend::MemoryBackend;
use crate::memory::graph::GraphStore;
use crate::memory::store::HEALTH_PROBE_USER;
use crate::memory::trace::LangfuseTracer;
use crate::memory::types::{MemoryRecord, NewMemory, RecordId, SearchResult};
use crate::memory::vector::QdrantVectorStore;

pub struct HybridBackend {
    vectors: QdrantVectorStore,
    graph: Arc<dyn GraphStore>,
    graph_timeout: Duration,
    tracer: Option<LangfuseTracer>,
}

impl HybridBackend {
    pub fn new(
        vectors: QdrantVectorStore,
        graph: Arc<dyn GraphStore>,
        graph_timeout: Duration,
        tracer: Option<LangfuseTracer>,
    ) -> Self {
        Self {
            vectors,
            graph,
            graph_timeout,
            tracer,
        }
    }

    fn trace(&self, name: &str, user_id: &str, input: serde_json::Value) {
        if !is_traced(user_id) {
            return;
        }
        if let Some(tracer) = &self.tracer {
            tracer.record(name, user_id, input);
        }
    }
}

/// Health checks are not user activity.
fn is_traced(user_id: &str) -> bool {
    user_id != HEALTH_PROBE_USER
}

/// Link a stored memory in the graph from a background task bounded by
/// `timeout`. The vector point is the record, so a graph miss only costs
/// the edge and is logged.
fn spawn_graph_link(
    graph: Arc<dyn GraphStore>,
    timeout: Duration,
    id: RecordId,
    memory: NewMemory,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, graph.link_memory(&id, &memory)).await {
            Ok(Ok(())) => debug!("Linked memory {} for user {}", id, memory.user_id),
            Ok(Err(e)) => warn!("Graph link failed for memory {}: {}", id, e),
            Err(_) => warn!("Graph link for memory {} timed out after {:?}", id, timeout),
        }
    })
}

#[async_trait]
impl MemoryBackend for HybridBackend {
    fn name(&self) -> &'static str {
        "qdrant+neo4j"
    }

    async fn insert(&self, memory: NewMemory) -> Result<RecordId, StoreError> {
        let id = self.vectors.upsert(&memory).await?;

        self.trace(
            "memory.add",
            &memory.user_id,
            json!({ "id": id, "content": memory.content, "metadata": memory.metadata }),
        );
        spawn_graph_link(self.graph.clone(), self.graph_timeout, id.clone(), memory);
        Ok(id)
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let results = self.vectors.search(user_id, query, limit).await?;
        self.trace(
            "memory.search",
            user_id,
            json!({ "query": query, "limit": limit, "hits": results.len() }),
        );
        Ok(results)
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, StoreError> {
        self.vectors.list(user_id, limit).await
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), StoreError> {
        self.vectors.delete_user(user_id).await?;
        self.graph.delete_user(user_id).await?;
        self.trace("memory.delete_all", user_id, json!({}));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.vectors.health().await?;
        self.graph.ping().await
    }
}
