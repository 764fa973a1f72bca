mod config;
mod document;
mod errors;
mod llm;
mod models;
mod pipeline;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::document::extractor::ExtractionChain;
use crate::llm::gemini::GeminiExtractor;
use crate::llm::openai::OpenAiExtractor;
use crate::llm::StructuredExtractor;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing provider key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume parser API v{}", env!("CARGO_PKG_VERSION"));

    // Shared download client
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    // Structured extraction backend — OpenAI wins when both keys are set
    let llm = build_llm(&config);
    info!("LLM extractor initialized (provider: {})", llm.provider());

    // Text extraction chain (library-first, heuristic fallback)
    let extractors = Arc::new(ExtractionChain::default());

    let state = AppState {
        http,
        extractors,
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Selects the structured-extraction backend from whichever provider key is
/// configured. `Config::from_env` guarantees at least one is present.
fn build_llm(config: &Config) -> Arc<dyn StructuredExtractor> {
    if let Some(key) = &config.openai_api_key {
        Arc::new(OpenAiExtractor::new(key.clone()))
    } else if let Some(key) = &config.gemini_api_key {
        Arc::new(GeminiExtractor::new(key.clone()))
    } else {
        unreachable!("Config::from_env enforces a provider key")
    }
}
