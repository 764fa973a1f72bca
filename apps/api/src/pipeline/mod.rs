//! The resume parsing pipeline: download → detect → extract → normalize →
//! structured LLM extraction → transform.
//!
//! The pipeline is request-scoped and stateless, and it never lets a failure
//! propagate past its boundary: every error is classified into a user-safe
//! message and folded into a sentinel record, so callers always receive a
//! well-formed `CandidateInfo`.

pub mod handlers;
pub mod transform;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::extractor::ExtractionChain;
use crate::document::{self, normalize::normalize, FileType, RawDocument};
use crate::llm::{LlmError, StructuredExtractor};
use crate::models::candidate::CandidateInfo;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to download resume: {0}")]
    Download(String),

    #[error("could not extract readable text from document")]
    Unreadable,

    #[error("not enough readable content in document")]
    InsufficientContent,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Outcome of one pipeline invocation. `error` carries the classified
/// user-facing message when the candidate record is the sentinel.
pub struct ParseOutcome {
    pub candidate: CandidateInfo,
    pub error: Option<String>,
}

/// Runs the full pipeline for one document URL. Never fails.
pub async fn parse_resume(state: &AppState, resume_url: &str) -> ParseOutcome {
    match run(state, resume_url).await {
        Ok(candidate) => {
            info!(candidate = %candidate.full_name, "resume parsed");
            ParseOutcome {
                candidate,
                error: None,
            }
        }
        Err(e) => {
            let message = classify(&e);
            warn!(error = %e, "resume parsing failed");
            ParseOutcome {
                candidate: CandidateInfo::processing_failed(&message),
                error: Some(message),
            }
        }
    }
}

async fn run(state: &AppState, resume_url: &str) -> Result<CandidateInfo, ParseError> {
    let doc = download(&state.http, resume_url).await?;
    debug!(
        url = %doc.source_url,
        size = doc.bytes.len(),
        "resume downloaded"
    );
    process_document(&state.extractors, state.llm.as_ref(), &doc.bytes).await
}

/// Everything after the download: detection, extraction, the readability
/// gate, and the provider round trip.
pub(crate) async fn process_document(
    extractors: &ExtractionChain,
    llm: &dyn StructuredExtractor,
    bytes: &[u8],
) -> Result<CandidateInfo, ParseError> {
    let file_type = document::detect(bytes);
    debug!(
        file_type = file_type.as_str(),
        size = bytes.len(),
        "document classified"
    );

    // Extraction runs for every file type, PDFs included: the readability
    // gate keeps image-based and corrupted files away from the provider.
    let extracted = extractors.extract(bytes, file_type);
    debug!(
        file_type = extracted.file_type.as_str(),
        chars = extracted.text.len(),
        "text extracted"
    );
    if !document::is_readable(&extracted.text) {
        return Err(ParseError::Unreadable);
    }

    let raw = match file_type {
        // Multimodal path: the provider reads the PDF natively, which beats
        // any heuristic re-extraction of its text.
        FileType::Pdf => llm.extract_from_pdf(bytes).await?,
        FileType::Docx | FileType::Unknown => {
            let normalized = normalize(&extracted.text);
            if normalized.trim().is_empty() {
                return Err(ParseError::InsufficientContent);
            }
            llm.extract_from_text(&normalized).await?
        }
    };

    Ok(transform::transform(&raw))
}

async fn download(client: &reqwest::Client, url: &str) -> Result<RawDocument, ParseError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ParseError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ParseError::Download(format!("file host returned {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ParseError::Download(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ParseError::Download("empty response body".to_string()));
    }
    Ok(RawDocument {
        bytes,
        source_url: url.to_string(),
    })
}

/// Converts an internal pipeline error into a user-safe message.
/// First match wins; unmatched provider errors pass through verbatim.
pub fn classify(error: &ParseError) -> String {
    match error {
        ParseError::Download(_) => {
            "Could not access the resume file. Please check that the file exists and is accessible, then try again."
                .to_string()
        }
        ParseError::Unreadable => {
            "Unable to extract text from document. The file may be image-based or corrupted."
                .to_string()
        }
        ParseError::InsufficientContent => {
            "Not enough readable content found in the document.".to_string()
        }
        ParseError::Llm(e) => classify_llm(e),
    }
}

fn classify_llm(error: &LlmError) -> String {
    let message = error.to_string().to_lowercase();

    if message.contains("billing") || message.contains("quota") || message.contains("exceeded") {
        return "Resume processing is temporarily unavailable due to billing limits. Please contact support."
            .to_string();
    }
    if matches!(error, LlmError::Api { status: 429, .. })
        || message.contains("rate limit")
        || message.contains("too many requests")
    {
        return "Resume processing service is busy. Please try again in a few minutes.".to_string();
    }
    if matches!(
        error,
        LlmError::Api {
            status: 401 | 403,
            ..
        }
    ) || message.contains("api key")
        || message.contains("unauthorized")
    {
        return "Resume processing is temporarily unavailable. Please try again later.".to_string();
    }
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct MockExtractor(Value);

    #[async_trait]
    impl StructuredExtractor for MockExtractor {
        fn provider(&self) -> &'static str {
            "mock"
        }
        async fn extract_from_pdf(&self, _pdf: &[u8]) -> Result<Value, LlmError> {
            Ok(self.0.clone())
        }
        async fn extract_from_text(&self, _text: &str) -> Result<Value, LlmError> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor(fn() -> LlmError);

    #[async_trait]
    impl StructuredExtractor for FailingExtractor {
        fn provider(&self) -> &'static str {
            "mock"
        }
        async fn extract_from_pdf(&self, _pdf: &[u8]) -> Result<Value, LlmError> {
            Err((self.0)())
        }
        async fn extract_from_text(&self, _text: &str) -> Result<Value, LlmError> {
            Err((self.0)())
        }
    }

    fn mocked_candidate_json() -> Value {
        json!({
            "full_name": "John Doe",
            "email": "john@example.com",
            "experience_years": "4",
            "skills": ["SQL"],
            "education": [],
            "summary": ""
        })
    }

    #[tokio::test]
    async fn test_valid_pdf_scenario() {
        let pdf = b"%PDF-1.4\nBT (John Doe) Tj (john@example.com) Tj ET";
        let chain = ExtractionChain::default();
        let llm = MockExtractor(mocked_candidate_json());

        // Extraction itself recovers both operands.
        let extracted = chain.extract(pdf, FileType::Pdf);
        assert!(extracted.text.contains("John Doe"));
        assert!(extracted.text.contains("john@example.com"));

        let info = process_document(&chain, &llm, pdf).await.unwrap();
        assert_eq!(info.full_name, "John Doe");
        assert_eq!(info.email, "john@example.com");
        assert_eq!(info.experience_years, "4");
        assert_eq!(info.summary, "Professional summary not available");
    }

    #[tokio::test]
    async fn test_garbage_buffer_fails_readability_gate() {
        let chain = ExtractionChain::default();
        let llm = MockExtractor(mocked_candidate_json());
        let err = process_document(&chain, &llm, &[0x13, 0x37, 0x00, 0xfe, 0x01])
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Unreadable));
        let message = classify(&err);
        assert!(message.contains("image-based or corrupted"));
    }

    #[tokio::test]
    async fn test_docx_text_path_reaches_transform() {
        let docx = b"PK\x03\x04 word/document.xml <w:document><w:body><w:p><w:r>\
            <w:t>Jane Smith is a senior data engineer with Python skills.</w:t>\
            </w:r></w:p></w:body></w:document>";
        let chain = ExtractionChain::default();
        let llm = MockExtractor(json!({ "full_name": "Jane Smith", "skills": ["Python"] }));
        let info = process_document(&chain, &llm, docx).await.unwrap();
        assert_eq!(info.full_name, "Jane Smith");
        assert_eq!(info.skills, vec!["Python"]);
        assert_eq!(info.experience_years, "0");
    }

    #[tokio::test]
    async fn test_provider_error_surfaces_as_parse_error() {
        let pdf = b"%PDF-1.4 (John Doe worked at Acme Corp for years) Tj";
        let chain = ExtractionChain::default();
        let llm = FailingExtractor(|| LlmError::Api {
            status: 429,
            message: "Too Many Requests".to_string(),
        });
        let err = process_document(&chain, &llm, pdf).await.unwrap_err();
        assert!(matches!(err, ParseError::Llm(_)));
    }

    #[test]
    fn test_classify_download() {
        let message = classify(&ParseError::Download("dns failure".to_string()));
        assert!(message.starts_with("Could not access the resume file"));
    }

    #[test]
    fn test_classify_billing_before_generic_api() {
        let err = ParseError::Llm(LlmError::Api {
            status: 400,
            message: "Billing hard limit exceeded".to_string(),
        });
        assert!(classify(&err).contains("billing limits"));
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ParseError::Llm(LlmError::Api {
            status: 429,
            message: "slow down".to_string(),
        });
        assert!(classify(&err).contains("busy"));
    }

    #[test]
    fn test_classify_auth() {
        let err = ParseError::Llm(LlmError::Api {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        });
        assert!(classify(&err).contains("try again later"));
    }

    #[test]
    fn test_classify_default_passes_message_through() {
        let err = ParseError::Llm(LlmError::Blocked("PROHIBITED_CONTENT".to_string()));
        assert_eq!(classify(&err), "content blocked by provider: PROHIBITED_CONTENT");
    }

    #[test]
    fn test_classify_insufficient_content() {
        assert!(classify(&ParseError::InsufficientContent).contains("Not enough readable content"));
    }
}
