//! Document handling — file-type detection, text extraction, normalization.
//!
//! Extraction is organized behind the pluggable [`extractor::TextExtractor`]
//! capability: library-backed extractors run first, regex heuristics are the
//! fallback for producer variations the libraries choke on.

pub mod docx;
pub mod extractor;
pub mod normalize;
pub mod pdf;

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

/// One downloaded resume: opaque bytes plus where they came from.
/// Ephemeral — owned by a single parse invocation, never persisted.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub source_url: String,
}

/// Detected container format of an uploaded resume. Derived once from the
/// raw bytes, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Unknown => "unknown",
        }
    }
}

/// Classifies a raw byte buffer by magic-byte signature.
///
/// - `%PDF` prefix → PDF, regardless of trailing content.
/// - `PK` ZIP prefix AND `word/` or `document.xml` within the first
///   1000 bytes → DOCX.
/// - Anything else (including an empty buffer) → unknown. Never fails.
pub fn detect(bytes: &[u8]) -> FileType {
    if bytes.len() >= 4 && &bytes[..4] == b"%PDF" {
        return FileType::Pdf;
    }
    if bytes.len() >= 2 && &bytes[..2] == b"PK" {
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1000)]);
        if head.contains("word/") || head.contains("document.xml") {
            return FileType::Docx;
        }
    }
    FileType::Unknown
}

/// Extraction result: plain text plus the file type that produced it.
/// Quality is heuristic — may be empty, partial, or noisy.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub file_type: FileType,
}

static LETTER_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{3}").unwrap());

/// Minimum-readability gate applied before any LLM call: at least 10
/// characters and at least one run of 3 consecutive letters. Scanned PDFs
/// and garbage buffers fail here.
pub fn is_readable(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 10 && LETTER_RUN_RE.is_match(trimmed)
}
