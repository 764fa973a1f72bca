use std::sync::Arc;

use crate::config::Config;
use crate::document::extractor::ExtractionChain;
use crate::llm::StructuredExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Shared client for downloading resume files.
    pub http: reqwest::Client,
    /// Library-first, heuristic-fallback text extractors.
    pub extractors: Arc<ExtractionChain>,
    /// Active structured-extraction backend, selected at startup by which
    /// provider API key is configured.
    pub llm: Arc<dyn StructuredExtractor>,
    /// Kept for handlers that need runtime configuration beyond startup
    /// wiring; nothing reads it yet.
    #[allow(dead_code)]
    pub config: Config,
}
