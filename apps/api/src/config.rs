use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if no provider API key is configured.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        // The one failure mode not funneled through the pipeline's
        // 200-with-sentinel contract: without a provider key no
        // document-specific outcome can exist.
        if config.openai_api_key.is_none() && config.gemini_api_key.is_none() {
            bail!("No LLM provider configured: set OPENAI_API_KEY or GEMINI_API_KEY");
        }

        Ok(config)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
