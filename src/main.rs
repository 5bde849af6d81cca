// src/main.rs
// Memory-aware chat assistant: HTTP server entry point

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use memory_assistant::{AppState, api::http_router, config::AppConfig};

#[derive(Parser)]
#[command(name = "memory-assistant")]
#[command(about = "Memory-aware AI assistant over Qdrant and Neo4j")]
#[command(version)]
struct Cli {
    /// Address to bind (overrides APP_HOST)
    #[arg(long, env = "APP_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides APP_PORT)
    #[arg(short, long, env = "APP_PORT")]
    port: Option<u16>,

    /// Keep memories in process instead of Qdrant/Neo4j
    #[arg(long, env = "MEMORY_IN_PROCESS")]
    in_memory: bool,
}

/// `debug` when DEBUG=true (process env or `.env`), else `info`.
fn default_log_level() -> &'static str {
    let _ = dotenvy::dotenv();
    log_level_for(std::env::var("DEBUG").ok().as_deref())
}

fn log_level_for(debug: Option<&str>) -> &'static str {
    match debug.map(|v| v.split('#').next().unwrap_or("").trim()) {
        Some(value) if value.parse::<bool>() == Ok(true) => "debug",
        _ => "info",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes up before config so config warnings are visible
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_level())),
        )
        .init();

    let mut config = AppConfig::from_env()?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!("Starting memory assistant v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {} (fallback: {})", config.model, config.fallback_model);

    let client = reqwest::Client::builder()
        .timeout(config.completion_timeout())
        .build()?;

    let bind_address = config.bind_address();
    let app_state = if cli.in_memory {
        info!("Using in-process memory backend");
        AppState::in_memory(config, client)
    } else {
        AppState::connect(config, client).await?
    };

    let app = http_router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("HTTP server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
