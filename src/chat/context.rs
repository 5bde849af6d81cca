// src/chat/context.rs
// Memory context block for the system prompt

use crate::memory::types::SearchResult;

/// Returned when recall found nothing.
pub const NO_CONTEXT_SENTINEL: &str = "No previous context available.";

/// One result per line, in the order given (already ranked by the store).
/// No truncation is applied.
pub fn build_memory_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }
    results
        .iter()
        .map(|r| r.record.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
