// src/chat/mod.rs

pub mod completion;
pub mod context;
pub mod orchestrator;

pub use completion::{CompletionClient, CompletionProvider, CompletionRequest, OpenAiCompletions};
pub use context::{NO_CONTEXT_SENTINEL, build_memory_context};
pub use orchestrator::{ChatOrchestrator, ChatResponse};
