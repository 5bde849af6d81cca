// src/memory/mod.rs

pub mod backend;
pub mod embeddings;
pub mod graph;
pub mod hybrid;
pub mod in_memory;
pub mod store;
pub mod trace;
pub mod types;
pub mod vector;

pub use backend::MemoryBackend;
pub use hybrid::HybridBackend;
pub use in_memory::InMemoryBackend;
pub use store::{HealthStatus, MemoryStore};
pub use types::{MemoryRecord, MemoryType, Metadata, RecordId, Role, SearchResult};
