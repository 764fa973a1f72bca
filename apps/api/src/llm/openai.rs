//! OpenAI structured-extraction backend.
//!
//! Multimodal path: upload the PDF to the Files API (`purpose: user_data`),
//! then issue a Chat Completions call referencing the file by ID with a
//! `json_schema` response format. Text path: embed the resume text directly
//! in the user message.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::llm::prompts::{response_schema, text_prompt, EXTRACTION_INSTRUCTIONS, EXTRACTION_SYSTEM};
use crate::llm::{recover_json, truncate_for_prompt, LlmError, StructuredExtractor, TEMPERATURE};

const FILES_URL: &str = "https://api.openai.com/v1/files";
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
}

impl OpenAiExtractor {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn upload_pdf(&self, pdf: &[u8]) -> Result<String, LlmError> {
        let part = Part::bytes(pdf.to_vec())
            .file_name("resume.pdf")
            .mime_str("application/pdf")?;
        let form = Form::new().text("purpose", "user_data").part("file", part);

        let response = self
            .client
            .post(FILES_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;

        let uploaded: FileUploadResponse = response.json().await?;
        debug!(file_id = %uploaded.id, "uploaded pdf to openai");
        Ok(uploaded.id)
    }

    async fn complete(&self, user_content: Value) -> Result<Value, LlmError> {
        let body = json!({
            "model": MODEL,
            "temperature": TEMPERATURE,
            "messages": [
                { "role": "system", "content": EXTRACTION_SYSTEM },
                { "role": "user", "content": user_content }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "candidate_info",
                    "strict": true,
                    "schema": response_schema()
                }
            }
        });

        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        Ok(recover_json(content))
    }
}

#[async_trait]
impl StructuredExtractor for OpenAiExtractor {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn extract_from_pdf(&self, pdf: &[u8]) -> Result<Value, LlmError> {
        let file_id = self.upload_pdf(pdf).await?;
        self.complete(json!([
            { "type": "file", "file": { "file_id": file_id } },
            { "type": "text", "text": EXTRACTION_INSTRUCTIONS }
        ]))
        .await
    }

    async fn extract_from_text(&self, text: &str) -> Result<Value, LlmError> {
        let prompt = text_prompt(truncate_for_prompt(text));
        self.complete(Value::String(prompt)).await
    }
}

/// Maps non-2xx responses to `LlmError::Api`, extracting the provider's
/// error message when the body carries one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OpenAiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}
