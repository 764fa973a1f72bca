//! Canonical structured output of the resume parsing pipeline.

use serde::{Deserialize, Serialize};

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";
pub const PROCESSING_FAILED: &str = "Processing Failed";
pub const DEFAULT_SUMMARY: &str = "Professional summary not available";

/// The single externally visible record produced per parsed resume.
///
/// Always fully populated — callers never need null checks. On total
/// failure the pipeline substitutes the sentinel from
/// [`CandidateInfo::processing_failed`] instead of raising.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub full_name: String,
    /// Empty string when absent. Only ever populated with a value containing `@`.
    pub email: String,
    pub phone: String,
    /// Deduplicated, trimmed, first-seen casing wins.
    pub skills: Vec<String>,
    /// Banded experience code, one of `"0"` (0–1y), `"2"` (2–3y),
    /// `"4"` (4–6y), `"7"` (7–10y), `"10"` (10+y). Never a raw year count.
    pub experience_years: String,
    /// Flattened education entries: `"<degree>, <institution> (<year> <grade>)"`,
    /// pipe-joined for multiple entries.
    pub education: String,
    /// Three `"• "`-prefixed bullet lines covering the most recent roles.
    pub summary: String,
}

impl Default for CandidateInfo {
    fn default() -> Self {
        Self {
            full_name: UNKNOWN_CANDIDATE.to_string(),
            email: String::new(),
            phone: String::new(),
            skills: Vec::new(),
            experience_years: "0".to_string(),
            education: String::new(),
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

impl CandidateInfo {
    /// Sentinel record returned when processing failed end-to-end.
    /// Carries the classified user-facing message in `summary`.
    pub fn processing_failed(message: &str) -> Self {
        Self {
            full_name: PROCESSING_FAILED.to_string(),
            summary: format!("Error: {message}"),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fully_populated() {
        let info = CandidateInfo::default();
        assert_eq!(info.full_name, UNKNOWN_CANDIDATE);
        assert_eq!(info.experience_years, "0");
        assert_eq!(info.summary, DEFAULT_SUMMARY);
        assert!(info.email.is_empty());
        assert!(info.skills.is_empty());
    }

    #[test]
    fn test_processing_failed_carries_message() {
        let info = CandidateInfo::processing_failed("download failed");
        assert_eq!(info.full_name, PROCESSING_FAILED);
        assert_eq!(info.summary, "Error: download failed");
        assert_eq!(info.experience_years, "0");
    }

    #[test]
    fn test_serializes_with_snake_case_keys() {
        let json = serde_json::to_value(CandidateInfo::default()).unwrap();
        assert!(json.get("full_name").is_some());
        assert!(json.get("experience_years").is_some());
    }
}
