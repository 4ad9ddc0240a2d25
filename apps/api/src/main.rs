mod config;
mod errors;
mod ingest;
mod interview;
mod llm_client;
mod recommend;
mod retrieval;
mod retry;
mod routes;
mod speech;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::build_generator;
use crate::retrieval::{FlatJobIndex, HttpEmbedder};
use crate::routes::build_router;
use crate::speech::{GoogleTts, QuestionStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting advisor API v{}", env!("CARGO_PKG_VERSION"));

    // Text generation backend, chosen once
    let llm = build_generator(&config)?;
    info!("LLM backend initialized (provider: {})", llm.provider().name());

    // Job index; the service does not start without it
    let embedder = HttpEmbedder::new(
        &config.embedding_url,
        config.embedding_model.clone(),
        config.embedding_api_key.clone(),
        config.external_timeout,
    )?;
    let index = FlatJobIndex::load(&config.index_dir, Arc::new(embedder))
        .await
        .with_context(|| format!("loading job index from {}", config.index_dir.display()))?;
    if index.is_empty() {
        warn!("Job index has no postings; every recommendation will be empty");
    }

    // Speech synthesis + question store
    let tts = GoogleTts::new(config.tts_url.clone(), config.external_timeout)?;
    tokio::fs::create_dir_all(&config.audio_dir)
        .await
        .with_context(|| format!("creating audio dir {}", config.audio_dir.display()))?;
    let questions = QuestionStore::new(config.audio_dir.clone(), config.tts_language.clone());

    let state = AppState {
        llm,
        index: Arc::new(index),
        tts: Arc::new(tts),
        questions: Arc::new(questions),
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
