// src/memory/graph.rs
// Neo4j graph store over the HTTP transactional endpoint.
// Keeps (:User)-[:REMEMBERS]->(:Memory) relationships alongside the vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::StoreError;
use crate::memory::types::{NewMemory, TYPE_KEY};

const LINK_MEMORY: &str = "MERGE (u:User {user_id: $user_id}) \
     CREATE (u)-[:REMEMBERS]->(:Memory {id: $id, content: $content, type: $type, \
     created_at: $created_at})";

const DELETE_USER_MEMORIES: &str =
    "MATCH (:User {user_id: $user_id})-[:REMEMBERS]->(m:Memory) DETACH DELETE m";

const PING: &str = "RETURN 1";

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Relationship store kept alongside the vector index.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Record that `memory.user_id` remembers the memory `id`.
    async fn link_memory(&self, id: &str, memory: &NewMemory) -> Result<(), StoreError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub struct Neo4jGraphStore {
    client: Client,
    commit_url: String,
    username: String,
    password: String,
}

impl Neo4jGraphStore {
    pub fn new(
        client: Client,
        url: &str,
        database: &str,
        username: String,
        password: String,
    ) -> Self {
        let commit_url = format!("{}/db/{}/tx/commit", url.trim_end_matches('/'), database);
        Self {
            client,
            commit_url,
            username,
            password,
        }
    }

    async fn run(
        &self,
        statement: &str,
        parameters: Value,
        on_write: bool,
    ) -> Result<(), StoreError> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::from_http(e, on_write))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!(
                "Neo4j returned {status}: {error_text}"
            )));
        }

        let tx: TxResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Read(format!("invalid Neo4j response: {e}")))?;

        if let Some(err) = tx.errors.first() {
            let message = format!("{}: {}", err.code, err.message);
            return Err(if on_write {
                StoreError::Write(message)
            } else {
                StoreError::Read(message)
            });
        }

        debug!("Neo4j statement committed");
        Ok(())
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn link_memory(&self, id: &str, memory: &NewMemory) -> Result<(), StoreError> {
        let memory_type = memory
            .metadata
            .get(TYPE_KEY)
            .cloned()
            .unwrap_or_else(|| "general".to_string());
        self.run(
            LINK_MEMORY,
            json!({
                "user_id": memory.user_id,
                "id": id,
                "content": memory.content,
                "type": memory_type,
                "created_at": memory.created_at.to_rfc3339(),
            }),
            true,
        )
        .await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.run(DELETE_USER_MEMORIES, json!({ "user_id": user_id }), true)
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.run(PING, json!({}), false).await
    }
}
