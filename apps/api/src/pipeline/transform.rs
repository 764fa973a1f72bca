//! Response transformation — maps the provider's raw JSON into the
//! canonical [`CandidateInfo`] record.
//!
//! Total function: any JSON shape (including the empty object the tolerant
//! parser substitutes) produces a fully populated record. Missing contact
//! fields fall back to regex scans over the serialized payload before
//! defaulting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::models::candidate::{CandidateInfo, DEFAULT_SUMMARY, UNKNOWN_CANDIDATE};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+ [A-Z][a-z]+)\b").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{8,13}\d").unwrap());

const EXPERIENCE_BUCKETS: &[&str] = &["0", "2", "4", "7", "10"];

/// Transforms raw provider JSON into the canonical record. Never fails.
pub fn transform(raw: &Value) -> CandidateInfo {
    let serialized = raw.to_string();

    let full_name = string_field(raw, "full_name")
        .or_else(|| fallback_scan(&NAME_RE, &serialized))
        .unwrap_or_else(|| {
            warn!("no candidate name found; defaulting");
            UNKNOWN_CANDIDATE.to_string()
        });

    let email = string_field(raw, "email")
        .filter(|e| e.contains('@'))
        .or_else(|| fallback_scan(&EMAIL_RE, &serialized))
        .unwrap_or_default();

    let phone = string_field(raw, "phone")
        .or_else(|| fallback_scan(&PHONE_RE, &serialized))
        .unwrap_or_default();

    let skills = dedup_skills(raw.get("skills"));
    if skills.is_empty() {
        warn!("no skills extracted from resume");
    }

    let summary = string_field(raw, "summary").unwrap_or_else(|| DEFAULT_SUMMARY.to_string());

    CandidateInfo {
        full_name,
        email,
        phone,
        skills,
        experience_years: bucket_experience(raw.get("experience_years")),
        education: flatten_education(raw.get("education")),
        summary,
    }
}

/// Non-empty trimmed string field, or None.
fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn fallback_scan(re: &Regex, serialized: &str) -> Option<String> {
    re.find(serialized).map(|m| m.as_str().trim().to_string())
}

/// Filters to non-empty trimmed strings, deduplicated case-insensitively
/// with first-seen casing preserved.
fn dedup_skills(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    let mut skills = Vec::new();
    for item in items {
        let Some(skill) = item.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        if seen.insert(skill.to_lowercase()) {
            skills.push(skill.to_string());
        }
    }
    skills
}

/// Maps the raw `experience_years` value onto the closed bucket enum.
/// Enum strings pass through; numeric values (or numeric strings) are
/// banded; anything unparseable lands in "0".
pub fn bucket_experience(value: Option<&Value>) -> String {
    let years = match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if EXPERIENCE_BUCKETS.contains(&trimmed) {
                return trimmed.to_string();
            }
            trimmed.parse::<f64>().ok()
        }
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    let Some(years) = years else {
        return "0".to_string();
    };
    let bucket = if years <= 1.0 {
        "0"
    } else if years <= 3.0 {
        "2"
    } else if years <= 6.0 {
        "4"
    } else if years <= 10.0 {
        "7"
    } else {
        "10"
    };
    bucket.to_string()
}

/// Flattens education into a single display string:
/// `"<degree>, <institution> (<year> <grade>)"`, pipe-joined across entries.
/// Accepts an array of objects, an array of strings, or a plain string.
fn flatten_education(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(entries)) => {
            let flattened: Vec<String> = entries.iter().filter_map(flatten_entry).collect();
            flattened.join(" | ")
        }
        _ => String::new(),
    }
}

fn flatten_entry(entry: &Value) -> Option<String> {
    if let Some(s) = entry.as_str() {
        let trimmed = s.trim();
        return (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
    let obj = entry.as_object()?;
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let head: Vec<&str> = [field("degree"), field("institution")]
        .into_iter()
        .flatten()
        .collect();
    if head.is_empty() {
        return None;
    }
    let mut out = head.join(", ");

    let paren: Vec<&str> = [field("year"), field("grade")]
        .into_iter()
        .flatten()
        .collect();
    if !paren.is_empty() {
        out.push_str(&format!(" ({})", paren.join(" ")));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_experience_bucketing_table() {
        let cases = [
            (0.0, "0"),
            (1.0, "0"),
            (1.5, "2"),
            (3.0, "2"),
            (6.0, "4"),
            (7.0, "7"),
            (10.0, "7"),
            (15.0, "10"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                bucket_experience(Some(&json!(input))),
                expected,
                "input {input}"
            );
        }
    }

    #[test]
    fn test_experience_enum_passthrough() {
        for code in ["0", "2", "4", "7", "10"] {
            assert_eq!(bucket_experience(Some(&json!(code))), code);
        }
    }

    #[test]
    fn test_experience_numeric_string() {
        assert_eq!(bucket_experience(Some(&json!("5"))), "4");
    }

    #[test]
    fn test_experience_unparseable_defaults_to_zero() {
        assert_eq!(bucket_experience(Some(&json!("senior"))), "0");
        assert_eq!(bucket_experience(None), "0");
        assert_eq!(bucket_experience(Some(&json!(null))), "0");
    }

    #[test]
    fn test_skill_dedup_first_seen_casing_wins() {
        let raw = json!({ "skills": ["Python", "python ", "Python", "SQL"] });
        let info = transform(&raw);
        assert_eq!(info.skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_skills_skip_non_strings_and_empties() {
        let raw = json!({ "skills": ["Rust", "", "   ", 42, null] });
        let info = transform(&raw);
        assert_eq!(info.skills, vec!["Rust"]);
    }

    #[test]
    fn test_education_object_flattening() {
        let raw = json!({ "education": [
            { "degree": "B.Tech", "institution": "IIT Delhi", "year": "2019", "grade": "8.2 CGPA" },
            { "degree": "M.Sc", "institution": "Stanford", "year": "", "grade": "" }
        ]});
        let info = transform(&raw);
        assert_eq!(
            info.education,
            "B.Tech, IIT Delhi (2019 8.2 CGPA) | M.Sc, Stanford"
        );
    }

    #[test]
    fn test_education_string_passthrough_and_array_of_strings() {
        let plain = transform(&json!({ "education": "BSc Computer Science" }));
        assert_eq!(plain.education, "BSc Computer Science");

        let list = transform(&json!({ "education": ["BSc CS", "MSc AI"] }));
        assert_eq!(list.education, "BSc CS | MSc AI");
    }

    #[test]
    fn test_education_absent_is_empty() {
        assert_eq!(transform(&json!({})).education, "");
    }

    #[test]
    fn test_email_requires_at_sign() {
        let info = transform(&json!({ "email": "not-an-email" }));
        assert_eq!(info.email, "");
    }

    #[test]
    fn test_email_fallback_scan_over_payload() {
        let raw = json!({ "summary": "reach me at jane.doe@example.com for details" });
        let info = transform(&raw);
        assert_eq!(info.email, "jane.doe@example.com");
    }

    #[test]
    fn test_name_fallback_scan() {
        let raw = json!({ "experience": [{ "company": "Acme", "position": "Led by Jane Smith" }] });
        let info = transform(&raw);
        assert_eq!(info.full_name, "Jane Smith");
    }

    #[test]
    fn test_empty_object_yields_defaults() {
        let info = transform(&json!({}));
        assert_eq!(info.full_name, UNKNOWN_CANDIDATE);
        assert_eq!(info.email, "");
        assert_eq!(info.phone, "");
        assert!(info.skills.is_empty());
        assert_eq!(info.experience_years, "0");
        assert_eq!(info.summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn test_empty_summary_gets_default() {
        let raw = json!({ "full_name": "John Doe", "summary": "" });
        let info = transform(&raw);
        assert_eq!(info.summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn test_mocked_llm_scenario() {
        let raw = json!({
            "full_name": "John Doe",
            "email": "john@example.com",
            "experience_years": "4",
            "skills": ["SQL"],
            "education": [],
            "summary": ""
        });
        let info = transform(&raw);
        assert_eq!(info.full_name, "John Doe");
        assert_eq!(info.email, "john@example.com");
        assert_eq!(info.experience_years, "4");
        assert_eq!(info.skills, vec!["SQL"]);
        assert_eq!(info.summary, DEFAULT_SUMMARY);
    }
}
