//! Gemini structured-extraction backend.
//!
//! Multimodal path: raw media upload to the Files API, then poll the file's
//! `state` until it reaches `ACTIVE` before referencing it in a
//! `generateContent` call. Polling replaces the fixed post-upload sleep the
//! upload API's eventual consistency otherwise requires.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::llm::prompts::{
    gemini_response_schema, text_prompt, EXTRACTION_INSTRUCTIONS, EXTRACTION_SYSTEM,
};
use crate::llm::{recover_json, truncate_for_prompt, LlmError, StructuredExtractor, TEMPERATURE};

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const MODEL: &str = "gemini-2.0-flash";

const POLL_INTERVAL_MS: u64 = 500;
const MAX_POLLS: u32 = 20;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
struct GeminiFile {
    name: String,
    uri: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileStatus {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiExtractor {
    client: Client,
    api_key: String,
}

impl GeminiExtractor {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn upload_pdf(&self, pdf: &[u8]) -> Result<GeminiFile, LlmError> {
        let url = format!("{BASE_URL}/upload/v1beta/files?key={}", self.api_key);
        let response = self
            .client
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", "application/pdf")
            .body(pdf.to_vec())
            .send()
            .await?;
        let response = check_status(response).await?;

        let uploaded: UploadResponse = response.json().await?;
        debug!(file = %uploaded.file.name, "uploaded pdf to gemini");
        Ok(uploaded.file)
    }

    /// Polls the uploaded file until it is usable for generation. Upload
    /// completion does not mean the file is ready; generation against a
    /// `PROCESSING` file fails.
    async fn await_active(&self, file: &GeminiFile) -> Result<(), LlmError> {
        if file.state.as_deref() == Some("ACTIVE") {
            return Ok(());
        }
        let url = format!("{BASE_URL}/v1beta/{}?key={}", file.name, self.api_key);

        for _ in 0..MAX_POLLS {
            tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
            let response = self.client.get(&url).send().await?;
            let response = check_status(response).await?;
            let status: FileStatus = response.json().await?;
            match status.state.as_deref() {
                Some("ACTIVE") => return Ok(()),
                Some("FAILED") => {
                    return Err(LlmError::FileNotReady(format!(
                        "{} failed provider-side processing",
                        file.name
                    )))
                }
                _ => continue,
            }
        }
        Err(LlmError::FileNotReady(format!(
            "{} still processing after {} polls",
            file.name, MAX_POLLS
        )))
    }

    async fn generate(&self, parts: Value) -> Result<Value, LlmError> {
        let url = format!(
            "{BASE_URL}/v1beta/models/{MODEL}:generateContent?key={}",
            self.api_key
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "systemInstruction": { "parts": [{ "text": EXTRACTION_SYSTEM }] },
            "generationConfig": {
                "temperature": TEMPERATURE,
                "responseMimeType": "application/json",
                "responseSchema": gemini_response_schema()
            }
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let generated: GenerateResponse = response.json().await?;

        if let Some(feedback) = &generated.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(LlmError::Blocked(reason.clone()));
            }
        }

        let candidate = generated.candidates.first().ok_or(LlmError::EmptyContent)?;
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::Blocked("SAFETY".to_string()));
        }

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        Ok(recover_json(&text))
    }
}

#[async_trait]
impl StructuredExtractor for GeminiExtractor {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn extract_from_pdf(&self, pdf: &[u8]) -> Result<Value, LlmError> {
        let file = self.upload_pdf(pdf).await?;
        self.await_active(&file).await?;
        self.generate(json!([
            { "file_data": { "mime_type": "application/pdf", "file_uri": file.uri } },
            { "text": EXTRACTION_INSTRUCTIONS }
        ]))
        .await
    }

    async fn extract_from_text(&self, text: &str) -> Result<Value, LlmError> {
        let prompt = text_prompt(truncate_for_prompt(text));
        self.generate(json!([{ "text": prompt }])).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}
