// src/memory/vector.rs
// Qdrant vector index: one point per memory record, filtered by user_id

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Direction, Distance, FieldType, Filter, OrderByBuilder, PointId, PointStruct,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::memory::embeddings::OpenAiEmbeddings;
use crate::memory::types::{MemoryRecord, Metadata, NewMemory, RecordId, SearchResult};

const CONTENT_FIELD: &str = "content";
const USER_ID_FIELD: &str = "user_id";
const CREATED_AT_FIELD: &str = "created_at";
/// Integer copy of `created_at` (unix millis) used for server-side ordering
const CREATED_AT_MS_FIELD: &str = "created_at_ms";
/// Caller metadata is namespaced so it can never shadow the fields above.
const METADATA_PREFIX: &str = "meta_";

/// gRPC status codes that mean the server could not be reached in time
const GRPC_DEADLINE_EXCEEDED: i32 = 4;
const GRPC_UNAVAILABLE: i32 = 14;

pub struct QdrantVectorStore {
    qdrant: Qdrant,
    collection: String,
    embedding_dim: u64,
    embeddings: OpenAiEmbeddings,
}

impl QdrantVectorStore {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection: &str,
        embedding_dim: u64,
        timeout: Duration,
        embeddings: OpenAiEmbeddings,
    ) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(url)
            .timeout(timeout)
            .skip_compatibility_check();
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let qdrant = builder
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        info!("Qdrant client configured for {} (collection '{}')", url, collection);

        Ok(Self {
            qdrant,
            collection: collection.to_string(),
            embedding_dim,
            embeddings,
        })
    }

    /// Create the collection if missing and make sure the payload indexes
    /// used for filtering and ordering exist.
    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        let exists = self
            .qdrant
            .collection_exists(self.collection.clone())
            .await
            .map_err(|e| qdrant_error(e, false))?;

        if exists {
            debug!("Qdrant collection '{}' already exists", self.collection);
        } else {
            info!("Creating Qdrant collection: {}", self.collection);
            self.qdrant
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| qdrant_error(e, true))?;
        }

        // Index creation is idempotent
        for (field, field_type) in [
            (USER_ID_FIELD, FieldType::Keyword),
            (CREATED_AT_MS_FIELD, FieldType::Integer),
        ] {
            self.qdrant
                .create_field_index(
                    CreateFieldIndexCollectionBuilder::new(&self.collection, field, field_type)
                        .wait(true),
                )
                .await
                .map_err(|e| qdrant_error(e, true))?;
        }
        Ok(())
    }

    pub async fn upsert(&self, memory: &NewMemory) -> Result<RecordId, StoreError> {
        let embedding = self.embeddings.embed(&memory.content).await?;
        let id = Uuid::new_v4().to_string();

        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert(CONTENT_FIELD.to_string(), memory.content.clone().into());
        payload.insert(USER_ID_FIELD.to_string(), memory.user_id.clone().into());
        payload.insert(
            CREATED_AT_FIELD.to_string(),
            memory.created_at.to_rfc3339().into(),
        );
        payload.insert(
            CREATED_AT_MS_FIELD.to_string(),
            memory.created_at.timestamp_millis().into(),
        );
        for (key, value) in &memory.metadata {
            payload.insert(format!("{METADATA_PREFIX}{key}"), value.clone().into());
        }

        let point = PointStruct::new(id.clone(), embedding, payload);
        self.qdrant
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| qdrant_error(e, true))?;

        debug!("Stored point {} in {}", id, self.collection);
        Ok(id)
    }

    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let embedding = self.embeddings.embed(query).await?;

        let search = SearchPointsBuilder::new(&self.collection, embedding, limit as u64)
            .filter(user_filter(user_id))
            .with_payload(true);

        let response = self
            .qdrant
            .search_points(search)
            .await
            .map_err(|e| qdrant_error(e, false))?;

        let results = response
            .result
            .into_iter()
            .filter_map(|point| {
                let score = point.score;
                point_to_record(point.id, &point.payload)
                    .map(|record| SearchResult { record, score })
            })
            .collect();
        Ok(results)
    }

    /// Most recent first, ordered by Qdrant on the `created_at_ms` index.
    pub async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, StoreError> {
        let scroll = ScrollPointsBuilder::new(&self.collection)
            .filter(user_filter(user_id))
            .order_by(OrderByBuilder::new(CREATED_AT_MS_FIELD).direction(Direction::Desc as i32))
            .limit(u32::try_from(limit).unwrap_or(u32::MAX))
            .with_payload(true);

        let page = self
            .qdrant
            .scroll(scroll)
            .await
            .map_err(|e| qdrant_error(e, false))?;

        Ok(page
            .result
            .into_iter()
            .filter_map(|point| point_to_record(point.id, &point.payload))
            .collect())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.qdrant
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(user_filter(user_id))
                    .wait(true),
            )
            .await
            .map_err(|e| qdrant_error(e, true))?;
        debug!("Deleted points for user {} from {}", user_id, self.collection);
        Ok(())
    }

    pub async fn health(&self) -> Result<(), StoreError> {
        self.qdrant
            .health_check()
            .await
            .map_err(|e| qdrant_error(e, false))?;
        Ok(())
    }
}

fn user_filter(user_id: &str) -> Filter {
    Filter::must([Condition::matches(USER_ID_FIELD, user_id.to_string())])
}

fn qdrant_error(err: QdrantError, on_write: bool) -> StoreError {
    let unreachable = match &err {
        QdrantError::ResponseError { status } => is_unreachable_code(i32::from(status.code())),
        _ => false,
    };
    classify(err.to_string(), unreachable, on_write)
}

fn is_unreachable_code(code: i32) -> bool {
    matches!(code, GRPC_UNAVAILABLE | GRPC_DEADLINE_EXCEEDED)
}

fn classify(message: String, unreachable: bool, on_write: bool) -> StoreError {
    if unreachable {
        StoreError::Unavailable(message)
    } else if on_write {
        StoreError::Write(message)
    } else {
        StoreError::Read(message)
    }
}

fn point_id_to_string(id: Option<PointId>) -> Option<String> {
    match id?.point_id_options? {
        PointIdOptions::Uuid(uuid) => Some(uuid),
        PointIdOptions::Num(num) => Some(num.to_string()),
    }
}

/// Rebuild a record from a point payload. Points missing content or a
/// parseable timestamp are skipped.
fn point_to_record(
    id: Option<PointId>,
    payload: &HashMap<String, QdrantValue>,
) -> Option<MemoryRecord> {
    let id = point_id_to_string(id)?;
    let content = payload.get(CONTENT_FIELD)?.as_str()?.to_string();
    let created_at = payload
        .get(CREATED_AT_FIELD)?
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
        .with_timezone(&Utc);

    let metadata: Metadata = payload
        .iter()
        .filter_map(|(key, value)| {
            let key = key.strip_prefix(METADATA_PREFIX)?;
            Some((key.to_string(), value.as_str()?.to_string()))
        })
        .collect();

    Some(MemoryRecord {
        id,
        content,
        created_at,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_to_record() {
        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert(CONTENT_FIELD.into(), "user: hi".to_string().into());
        payload.insert(USER_ID_FIELD.into(), "u1".to_string().into());
        payload.insert(
            CREATED_AT_FIELD.into(),
            "2024-05-01T10:00:00+00:00".to_string().into(),
        );
        payload.insert(CREATED_AT_MS_FIELD.into(), 1_714_557_600_000_i64.into());
        payload.insert("meta_type".into(), "conversation".to_string().into());
        payload.insert("meta_role".into(), "user".to_string().into());

        let id = PointId::from("0b4e7f2a-9c3d-4e5f-8a1b-2c3d4e5f6a7b".to_string());
        let record = point_to_record(Some(id), &payload).unwrap();

        assert_eq!(record.id, "0b4e7f2a-9c3d-4e5f-8a1b-2c3d4e5f6a7b");
        assert_eq!(record.content, "user: hi");
        assert_eq!(record.memory_type(), Some("conversation"));
        assert_eq!(record.metadata.len(), 2);
        assert!(!record.metadata.contains_key(USER_ID_FIELD));
        assert!(!record.metadata.contains_key(CREATED_AT_MS_FIELD));
    }

    #[test]
    fn test_point_without_content_is_skipped() {
        let payload: HashMap<String, QdrantValue> = HashMap::new();
        assert!(point_to_record(Some(PointId::from(7u64)), &payload).is_none());
    }

    #[test]
    fn test_error_classification() {
        assert!(is_unreachable_code(GRPC_UNAVAILABLE));
        assert!(is_unreachable_code(GRPC_DEADLINE_EXCEEDED));
        // NOT_FOUND, INVALID_ARGUMENT
        assert!(!is_unreachable_code(5));
        assert!(!is_unreachable_code(3));

        assert!(matches!(classify("down".into(), true, true), StoreError::Unavailable(_)));
        assert!(matches!(classify("bad".into(), false, true), StoreError::Write(_)));
        assert!(matches!(classify("bad".into(), false, false), StoreError::Read(_)));
    }

    #[test]
    fn test_numeric_point_id() {
        assert_eq!(point_id_to_string(Some(PointId::from(42u64))), Some("42".to_string()));
        assert_eq!(point_id_to_string(None), None);
    }
}
