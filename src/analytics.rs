// src/analytics.rs
// Per-user memory statistics, recomputed on every call

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::memory::store::MemoryStore;
use crate::memory::types::{MemoryRecord, MemoryType};

/// Records scanned per snapshot
pub const ANALYTICS_SCAN_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub user_id: String,
    pub total_memories: usize,
    pub conversation_memories: usize,
    pub memory_distribution: BTreeMap<String, usize>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Snapshot, or the error-shaped payload returned when the store failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyticsReport {
    Snapshot(AnalyticsSnapshot),
    Failed { error: String },
}

/// Summarize `records`, which must be ordered most recent first.
pub fn summarize(user_id: &str, records: &[MemoryRecord]) -> AnalyticsSnapshot {
    let mut memory_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let kind = record.memory_type().unwrap_or(MemoryType::General.as_str());
        *memory_distribution.entry(kind.to_string()).or_default() += 1;
    }

    AnalyticsSnapshot {
        user_id: user_id.to_string(),
        total_memories: records.len(),
        conversation_memories: memory_distribution
            .get(MemoryType::Conversation.as_str())
            .copied()
            .unwrap_or(0),
        memory_distribution,
        last_activity: records.first().map(|r| r.created_at),
    }
}

pub async fn aggregate(store: &MemoryStore, user_id: &str) -> AnalyticsReport {
    match store.try_list_all(user_id, ANALYTICS_SCAN_LIMIT).await {
        Ok(records) => AnalyticsReport::Snapshot(summarize(user_id, &records)),
        Err(e) => {
            warn!("Analytics unavailable for user {}: {}", user_id, e);
            AnalyticsReport::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::backend::MemoryBackend;
    use crate::memory::in_memory::InMemoryBackend;
    use crate::memory::types::{Metadata, NewMemory, RecordId, Role, SearchResult, TYPE_KEY};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::time::Duration;

    /// Backend whose listing always fails.
    struct UnreadableBackend;

    #[async_trait]
    impl MemoryBackend for UnreadableBackend {
        fn name(&self) -> &'static str {
            "unreadable"
        }
        async fn insert(&self, _memory: NewMemory) -> Result<RecordId, StoreError> {
            Err(StoreError::Write("read-only".into()))
        }
        async fn search(
            &self,
            _: &str,
            _: &str,
            _: usize,
        ) -> Result<Vec<SearchResult>, StoreError> {
            Ok(Vec::new())
        }
        async fn list(&self, _: &str, _: usize) -> Result<Vec<MemoryRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete_all(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn record(id: &str, kind: Option<&str>, minute: u32) -> MemoryRecord {
        let mut metadata = Metadata::new();
        if let Some(kind) = kind {
            metadata.insert(TYPE_KEY.to_string(), kind.to_string());
        }
        MemoryRecord {
            id: id.to_string(),
            content: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            metadata,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = summarize("u1", &[]);
        assert_eq!(snapshot.total_memories, 0);
        assert_eq!(snapshot.conversation_memories, 0);
        assert!(snapshot.memory_distribution.is_empty());
        assert!(snapshot.last_activity.is_none());
    }

    #[test]
    fn test_distribution_defaults_to_general() {
        let records = vec![
            record("c", Some("conversation"), 30),
            record("b", None, 20),
            record("a", Some("preference"), 10),
        ];
        let snapshot = summarize("u1", &records);

        assert_eq!(snapshot.total_memories, 3);
        assert_eq!(snapshot.conversation_memories, 1);
        assert_eq!(snapshot.memory_distribution["general"], 1);
        assert_eq!(snapshot.memory_distribution["preference"], 1);
        assert_eq!(
            snapshot.total_memories,
            snapshot.memory_distribution.values().sum::<usize>()
        );
        assert_eq!(snapshot.last_activity, Some(records[0].created_at));
    }

    #[tokio::test]
    async fn test_conversation_scenario() {
        let store = MemoryStore::new(Arc::new(InMemoryBackend::new()), Duration::from_secs(5));
        let ids = store
            .add_conversation("u1", &[(Role::User, "hi"), (Role::Assistant, "hello")])
            .await;
        assert_eq!(ids.len(), 2);

        let listed = store.list_all("u1", 10).await;
        assert_eq!(listed.len(), 2);

        let AnalyticsReport::Snapshot(snapshot) = aggregate(&store, "u1").await else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.total_memories, 2);
        assert_eq!(snapshot.conversation_memories, 2);
        assert_eq!(snapshot.memory_distribution.len(), 1);
        assert_eq!(snapshot.memory_distribution["conversation"], 2);
        assert_eq!(snapshot.last_activity, Some(listed[0].created_at));
    }

    #[tokio::test]
    async fn test_store_failure_yields_error_payload() {
        let store = MemoryStore::new(Arc::new(UnreadableBackend), Duration::from_secs(5));

        let report = aggregate(&store, "u1").await;
        assert_eq!(
            report,
            AnalyticsReport::Failed {
                error: "memory store unavailable: connection refused".into(),
            }
        );
    }

    #[test]
    fn test_failed_report_serializes_as_error() {
        let report = AnalyticsReport::Failed {
            error: "memory store unavailable: down".into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "memory store unavailable: down" }));
    }
}
