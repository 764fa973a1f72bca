//! Structured LLM extraction — the single point of entry for provider calls.
//!
//! Two interchangeable backends (OpenAI, Gemini) share one prompt and one
//! schema contract; the active one is selected at startup by which API key
//! is configured and carried in `AppState` as `Arc<dyn StructuredExtractor>`.

pub mod gemini;
pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Low temperature keeps extraction deterministic across retries by callers.
pub const TEMPERATURE: f64 = 0.1;
/// Text-path prompts embed at most this many characters of resume text.
pub const MAX_TEXT_CHARS: usize = 12_000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("content blocked by provider: {0}")]
    Blocked(String),

    #[error("uploaded file never became ready: {0}")]
    FileNotReady(String),
}

/// A structured-extraction backend. The PDF path uploads raw bytes
/// (multimodal); the text path embeds normalized text in the prompt.
/// Both return the provider's raw JSON — transformation into the canonical
/// record happens downstream.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn extract_from_pdf(&self, pdf: &[u8]) -> Result<Value, LlmError>;
    async fn extract_from_text(&self, text: &str) -> Result<Value, LlmError>;
}

/// Char-boundary-safe truncation for the text path.
pub fn truncate_for_prompt(text: &str) -> &str {
    if text.len() <= MAX_TEXT_CHARS {
        return text;
    }
    let mut end = MAX_TEXT_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Tolerant JSON recovery from LLM text output.
///
/// Bounded fallback chain: strict parse → code-fence strip → outermost
/// `{...}` slice → empty object. The empty object flows through the
/// transformer's defaulting rules rather than raising, so a malformed reply
/// still yields a well-formed (if degraded) record.
pub fn recover_json(text: &str) -> Value {
    if let Ok(value) = serde_json::from_str(text) {
        return value;
    }

    let stripped = strip_json_fences(text);
    if let Ok(value) = serde_json::from_str(stripped) {
        debug!("recovered JSON from code-fenced LLM output");
        return value;
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                warn!("recovered JSON by slicing to outermost braces");
                return value;
            }
        }
    }

    warn!("LLM output was not recoverable JSON; substituting empty object");
    json!({})
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
