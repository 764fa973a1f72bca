//! Pluggable text extraction — library-first with heuristic fallback.
//!
//! Each variant is total: it returns an empty string rather than erroring,
//! and the chain decides what counts as a usable result via the shared
//! readability gate. The `unknown` file-type branch tries the PDF
//! extractors and then the DOCX extractors, a safety net for misdetected
//! buffers.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::debug;

use crate::document::{docx, is_readable, pdf, ExtractedText, FileType};

/// One text-extraction capability. Implementations never fail; an empty
/// string signals "nothing recovered".
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> String;
}

/// `pdf-extract`-backed extraction. The crate panics on some malformed
/// producer output, so the call is isolated behind `catch_unwind`.
pub struct PdfLibrary;

impl TextExtractor for PdfLibrary {
    fn name(&self) -> &'static str {
        "pdf-library"
    }

    fn extract(&self, bytes: &[u8]) -> String {
        let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));
        match result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!("pdf-extract failed: {e}");
                String::new()
            }
            Err(_) => {
                debug!("pdf-extract panicked on malformed input");
                String::new()
            }
        }
    }
}

/// Regex heuristics over the raw content stream (see [`pdf`]).
pub struct PdfHeuristic;

impl TextExtractor for PdfHeuristic {
    fn name(&self) -> &'static str {
        "pdf-heuristic"
    }

    fn extract(&self, bytes: &[u8]) -> String {
        pdf::extract_pdf_text(bytes)
    }
}

/// Proper ZIP + XML walk of `word/document.xml` (see [`docx`]).
pub struct DocxLibrary;

impl TextExtractor for DocxLibrary {
    fn name(&self) -> &'static str {
        "docx-library"
    }

    fn extract(&self, bytes: &[u8]) -> String {
        docx::extract_docx_xml(bytes)
    }
}

/// Substring/regex search over the permissively decoded buffer (see [`docx`]).
pub struct DocxHeuristic;

impl TextExtractor for DocxHeuristic {
    fn name(&self) -> &'static str {
        "docx-heuristic"
    }

    fn extract(&self, bytes: &[u8]) -> String {
        docx::extract_docx_text(bytes)
    }
}

/// Ordered extractor chain, selected per detected file type.
pub struct ExtractionChain {
    pdf: Vec<Box<dyn TextExtractor>>,
    docx: Vec<Box<dyn TextExtractor>>,
}

impl Default for ExtractionChain {
    fn default() -> Self {
        Self {
            pdf: vec![Box::new(PdfLibrary), Box::new(PdfHeuristic)],
            docx: vec![Box::new(DocxLibrary), Box::new(DocxHeuristic)],
        }
    }
}

impl ExtractionChain {
    /// Runs the extractors for `file_type` in order and returns the first
    /// result that passes the readability gate. When nothing passes, the
    /// longest result is returned so the caller's gate produces the
    /// canonical "unreadable" failure.
    pub fn extract(&self, bytes: &[u8], file_type: FileType) -> ExtractedText {
        let order: Vec<&dyn TextExtractor> = match file_type {
            FileType::Pdf => self.pdf.iter().map(|e| e.as_ref()).collect(),
            FileType::Docx => self.docx.iter().map(|e| e.as_ref()).collect(),
            FileType::Unknown => self
                .pdf
                .iter()
                .chain(self.docx.iter())
                .map(|e| e.as_ref())
                .collect(),
        };

        let mut best = String::new();
        for extractor in order {
            let text = extractor.extract(bytes);
            debug!(
                extractor = extractor.name(),
                chars = text.len(),
                "extraction attempt"
            );
            if is_readable(&text) {
                return ExtractedText { text, file_type };
            }
            if text.len() > best.len() {
                best = text;
            }
        }
        ExtractedText {
            text: best,
            file_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::detect;

    #[test]
    fn test_pdf_chain_falls_back_to_heuristic() {
        // Not a structurally valid PDF, so the library path yields nothing,
        // but the heuristic pass still finds the literal strings.
        let bytes = b"%PDF-1.4 (John Doe) Tj (Software Engineer) Tj";
        let result = ExtractionChain::default().extract(bytes, FileType::Pdf);
        assert!(result.text.contains("John Doe"));
    }

    #[test]
    fn test_unknown_type_tries_pdf_then_docx() {
        // `PK` with no word/ marker: detected unknown, recovered by the
        // fallback chain.
        let bytes = b"PK\x03\x04 <w:t>Jane Smith Principal Engineer</w:t>";
        assert_eq!(detect(bytes), FileType::Unknown);
        let result = ExtractionChain::default().extract(bytes, FileType::Unknown);
        assert!(result.text.contains("Jane Smith"));
    }

    #[test]
    fn test_unreadable_buffer_yields_failing_text() {
        let bytes = [0x00, 0x01, 0x02, 0xff, 0x10];
        let result = ExtractionChain::default().extract(&bytes, FileType::Unknown);
        assert!(!crate::document::is_readable(&result.text));
    }
}
