// src/error.rs
// Error kinds shared by the memory, completion and configuration layers

use std::time::Duration;

/// Failures raised by a memory backend or the store adapter wrapping it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("memory store unavailable: {0}")]
    Unavailable(String),

    #[error("memory store rejected write: {0}")]
    Write(String),

    #[error("memory store rejected read: {0}")]
    Read(String),
}

impl StoreError {
    /// Map a transport error from an HTTP-backed store. Connect and timeout
    /// failures mean the store is unreachable; anything else is attributed to
    /// the operation that was running.
    pub fn from_http(err: reqwest::Error, on_write: bool) -> Self {
        if err.is_connect() || err.is_timeout() {
            StoreError::Unavailable(err.to_string())
        } else if on_write {
            StoreError::Write(err.to_string())
        } else {
            StoreError::Read(err.to_string())
        }
    }
}

/// Failures of a completion call (primary, fallback or summary).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(String),

    #[error("completion provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("completion response malformed: {0}")]
    Malformed(String),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Request(err.to_string())
    }
}

/// Startup configuration problems. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "memory store unavailable: connection refused");

        let err = CompletionError::Provider {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "completion provider returned 429: rate limited");

        let err = ConfigError::Missing("OPENAI_API_KEY");
        assert_eq!(err.to_string(), "OPENAI_API_KEY environment variable is required");
    }
}
