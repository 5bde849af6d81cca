// src/state.rs
// Shared application state handed to every HTTP handler

use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use crate::{
    chat::{ChatOrchestrator, CompletionClient, CompletionProvider, OpenAiCompletions},
    config::AppConfig,
    error::StoreError,
    memory::{
        HybridBackend, InMemoryBackend, MemoryBackend, MemoryStore,
        embeddings::OpenAiEmbeddings, graph::Neo4jGraphStore, trace::LangfuseTracer,
        vector::QdrantVectorStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    // -------- Memory --------
    pub memory: Arc<MemoryStore>,

    // -------- LLM --------
    pub completions: Arc<CompletionClient>,

    // -------- Services --------
    pub orchestrator: Arc<ChatOrchestrator>,
}

impl AppState {
    /// Wire the services around an already-built backend and provider.
    pub fn with_components(
        config: AppConfig,
        backend: Arc<dyn MemoryBackend>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let memory = Arc::new(MemoryStore::new(backend, config.store_timeout()));
        let completions = Arc::new(CompletionClient::new(
            provider,
            config.model.clone(),
            config.fallback_model.clone(),
            config.completion_timeout(),
        ));
        let orchestrator = Arc::new(ChatOrchestrator::new(memory.clone(), completions.clone()));

        Self {
            config: Arc::new(config),
            memory,
            completions,
            orchestrator,
        }
    }

    /// Production wiring: Qdrant + Neo4j (+ Langfuse when configured) and
    /// OpenAI completions. A missing collection is created; an unreachable
    /// Qdrant is only logged so the service still starts and reports
    /// itself unhealthy.
    pub async fn connect(config: AppConfig, client: Client) -> Result<Self, StoreError> {
        let embeddings = OpenAiEmbeddings::new(
            client.clone(),
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.embedding_model.clone(),
        );
        let vectors = QdrantVectorStore::new(
            &config.qdrant_url,
            config.qdrant_api_key.clone(),
            &config.qdrant_collection,
            config.embedding_dim,
            config.store_timeout(),
            embeddings,
        )?;
        if let Err(e) = vectors.ensure_collection().await {
            warn!("Qdrant collection setup failed: {}", e);
        }

        let graph = Neo4jGraphStore::new(
            client.clone(),
            &config.neo4j_url,
            &config.neo4j_database,
            config.neo4j_username.clone(),
            config.neo4j_password.clone(),
        );
        let tracer = config
            .langfuse
            .as_ref()
            .map(|langfuse| LangfuseTracer::new(client.clone(), langfuse));
        if tracer.is_some() {
            info!("Langfuse tracing enabled");
        }

        let provider = OpenAiCompletions::new(
            client,
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
        );

        let backend = HybridBackend::new(vectors, Arc::new(graph), config.store_timeout(), tracer);
        Ok(Self::with_components(config, Arc::new(backend), Arc::new(provider)))
    }

    /// Process-local memory with real OpenAI completions.
    pub fn in_memory(config: AppConfig, client: Client) -> Self {
        let provider = OpenAiCompletions::new(
            client,
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
        );
        Self::with_components(config, Arc::new(InMemoryBackend::new()), Arc::new(provider))
    }
}
