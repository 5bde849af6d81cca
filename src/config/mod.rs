// src/config/mod.rs
// Environment-driven configuration, loaded once at startup

use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConfigError;

/// Optional Langfuse credentials. Present only when both keys are set.
#[derive(Debug, Clone)]
pub struct LangfuseConfig {
    pub public_key: String,
    pub secret_key: String,
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── OpenAI
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub fallback_model: String,
    pub embedding_model: String,
    pub embedding_dim: u64,

    // ── Qdrant (gRPC endpoint)
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub qdrant_api_key: Option<String>,

    // ── Neo4j (HTTP endpoint)
    pub neo4j_url: String,
    pub neo4j_username: String,
    pub neo4j_password: String,
    pub neo4j_database: String,

    // ── Tracing sink
    pub langfuse: Option<LangfuseConfig>,

    // ── Server
    pub host: String,
    pub port: u16,
    pub debug: bool,

    // ── Timeouts (seconds)
    pub store_timeout_secs: u64,
    pub completion_timeout_secs: u64,
}

/// Read `key` through `lookup`, falling back to `default` when unset.
/// Values may carry trailing `# comments` as in `.env` files.
fn env_var_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            if clean_val.is_empty() {
                return Ok(default);
            }
            clean_val.parse::<T>().map_err(|_| ConfigError::Invalid {
                key,
                value: val.clone(),
            })
        }
        None => Ok(default),
    }
}

fn env_var_opt<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            debug!(".env file not found, using process environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key =
            env_var_opt(&lookup, "OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let text = |key: &'static str, default: &str| env_var_or(&lookup, key, default.to_string());

        let langfuse = match (
            env_var_opt(&lookup, "LANGFUSE_PUBLIC_KEY"),
            env_var_opt(&lookup, "LANGFUSE_SECRET_KEY"),
        ) {
            (Some(public_key), Some(secret_key)) => Some(LangfuseConfig {
                public_key,
                secret_key,
                host: text("LANGFUSE_HOST", "https://cloud.langfuse.com")?,
            }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one Langfuse key configured, tracing disabled");
                None
            }
            (None, None) => None,
        };

        let config = Self {
            openai_api_key,
            openai_base_url: text("OPENAI_BASE_URL", "https://api.openai.com/v1")?,
            model: text("OPENAI_MODEL", "gpt-4")?,
            fallback_model: text("OPENAI_FALLBACK_MODEL", "gpt-3.5-turbo")?,
            embedding_model: text("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small")?,
            embedding_dim: env_var_or(&lookup, "EMBEDDING_DIM", 1536)?,
            qdrant_url: text("QDRANT_URL", "http://localhost:6334")?,
            qdrant_collection: text("QDRANT_COLLECTION", "memory_vectors")?,
            qdrant_api_key: env_var_opt(&lookup, "QDRANT_API_KEY"),
            neo4j_url: text("NEO4J_URL", "http://localhost:7474")?,
            neo4j_username: text("NEO4J_USERNAME", "neo4j")?,
            neo4j_password: text("NEO4J_PASSWORD", "password")?,
            neo4j_database: text("NEO4J_DATABASE", "neo4j")?,
            langfuse,
            host: text("APP_HOST", "0.0.0.0")?,
            port: env_var_or(&lookup, "APP_PORT", 8000)?,
            debug: env_var_or(&lookup, "DEBUG", false)?,
            store_timeout_secs: env_var_or(&lookup, "MEMORY_STORE_TIMEOUT_SECS", 10)?,
            completion_timeout_secs: env_var_or(&lookup, "COMPLETION_TIMEOUT_SECS", 60)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("OPENAI_BASE_URL", &self.openai_base_url),
            ("QDRANT_URL", &self.qdrant_url),
            ("NEO4J_URL", &self.neo4j_url),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(key));
            }
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_DIM",
                value: self.embedding_dim.to_string(),
            });
        }
        if self.store_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "MEMORY_STORE_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if self.completion_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "COMPLETION_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
