mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod resumes;
mod routes;
mod session;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::{HeuristicExtractor, LlmExtractor, ResumeExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::state::AppState;
use crate::storage::{MemoryResumeStore, PgResumeStore, ResumeStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Parser v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    let sessions = build_session_store(&config).await?;
    let extractor = build_extractor(&config)?;
    info!(
        "Backends: store={}, sessions={}, extractor={}",
        store.backend(),
        sessions.backend(),
        extractor.backend()
    );

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    info!("Upload scratch directory: {}", config.upload_dir.display());

    let state = AppState::new(store, sessions, extractor, config.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn ResumeStore>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(PgResumeStore::new(create_pool(url).await?))),
        None => {
            warn!("DATABASE_URL not set; saved resumes are kept in memory only");
            Ok(Arc::new(MemoryResumeStore::new()))
        }
    }
}

async fn build_session_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            Ok(Arc::new(
                RedisSessionStore::connect(&client, config.session_ttl_secs).await?,
            ))
        }
        None => {
            info!("REDIS_URL not set; using in-process sessions");
            Ok(Arc::new(MemorySessionStore::new()))
        }
    }
}

fn build_extractor(config: &Config) -> Result<Arc<dyn ResumeExtractor>> {
    match &config.anthropic_api_key {
        Some(key) => {
            info!("LLM extraction enabled (model: {})", llm_client::MODEL);
            Ok(Arc::new(LlmExtractor(LlmClient::new(key.clone())?)))
        }
        None => Ok(Arc::new(HeuristicExtractor)),
    }
}
