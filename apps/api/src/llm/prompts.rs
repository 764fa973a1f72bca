//! Prompt and schema contract shared by both structured-extraction backends.
//!
//! Both providers receive the same instruction block and the same JSON
//! schema so they stay interchangeable. Keep the two in sync: every field
//! named in the instructions must exist in the schema.

use serde_json::{json, Value};

/// System prompt enforcing JSON-only output.
pub const EXTRACTION_SYSTEM: &str = "You are a precise resume parsing assistant. \
    You MUST respond with valid JSON matching the provided schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Provider-agnostic extraction instructions.
pub const EXTRACTION_INSTRUCTIONS: &str = "\
Extract the candidate's information from this resume.

Rules:
1. experience_years: Compute total professional experience from ALL employment \
periods found in the document. Use month/year precision where available and \
deduplicate overlapping periods so concurrent roles are not double-counted. \
Then report ONE of exactly these codes: \"0\" (0-1 years), \"2\" (2-3 years), \
\"4\" (4-6 years), \"7\" (7-10 years), \"10\" (more than 10 years). \
NEVER return a raw year count.
2. skills: Extract ALL skills mentioned anywhere in the document — dedicated \
skills sections, job descriptions, project notes, certifications.
3. full_name, email, phone: Look in the header, footer, and body.
4. education: List every qualification, in the order it appears in the document.
5. summary: Write EXACTLY three bullet points, each starting with \"\u{2022} \", \
one per role for the candidate's three most recent roles. If the candidate has \
fewer than three roles, write one bullet per role. If no roles are found, write \
one bullet summarizing the candidate's profile.
6. Use empty strings or empty arrays for anything genuinely absent. Do not invent data.";

/// JSON Schema for the structured response, in the strict dialect OpenAI's
/// `json_schema` response format requires (every property required,
/// `additionalProperties: false` at every level).
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "full_name": { "type": "string" },
            "email": { "type": "string" },
            "phone": { "type": "string" },
            "skills": { "type": "array", "items": { "type": "string" } },
            "experience_years": { "type": "string", "enum": ["0", "2", "4", "7", "10"] },
            "education": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "degree": { "type": "string" },
                        "institution": { "type": "string" },
                        "year": { "type": "string" },
                        "grade": { "type": "string" }
                    },
                    "required": ["degree", "institution", "year", "grade"],
                    "additionalProperties": false
                }
            },
            "summary": { "type": "string" },
            "certifications": { "type": "array", "items": { "type": "string" } },
            "experience": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "company": { "type": "string" },
                        "position": { "type": "string" },
                        "period": { "type": "string" },
                        "duration": { "type": "string" }
                    },
                    "required": ["company", "position", "period", "duration"],
                    "additionalProperties": false
                }
            }
        },
        "required": [
            "full_name", "email", "phone", "skills", "experience_years",
            "education", "summary", "certifications", "experience"
        ],
        "additionalProperties": false
    })
}

/// The same schema in the OpenAPI-style subset Gemini's `responseSchema`
/// accepts (no `additionalProperties`).
pub fn gemini_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "full_name": { "type": "string" },
            "email": { "type": "string" },
            "phone": { "type": "string" },
            "skills": { "type": "array", "items": { "type": "string" } },
            "experience_years": { "type": "string", "enum": ["0", "2", "4", "7", "10"] },
            "education": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "degree": { "type": "string" },
                        "institution": { "type": "string" },
                        "year": { "type": "string" },
                        "grade": { "type": "string" }
                    }
                }
            },
            "summary": { "type": "string" },
            "certifications": { "type": "array", "items": { "type": "string" } },
            "experience": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "company": { "type": "string" },
                        "position": { "type": "string" },
                        "period": { "type": "string" },
                        "duration": { "type": "string" }
                    }
                }
            }
        },
        "required": ["full_name", "experience_years", "skills", "summary"]
    })
}

/// Builds the text-path prompt: instructions plus the (already truncated)
/// resume text.
pub fn text_prompt(resume_text: &str) -> String {
    format!("{EXTRACTION_INSTRUCTIONS}\n\nRESUME TEXT:\n{resume_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_every_property() {
        let schema = response_schema();
        let props: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for prop in props {
            assert!(required.contains(&prop.as_str()), "{prop} missing from required");
        }
    }

    #[test]
    fn test_experience_enum_is_closed() {
        let schema = response_schema();
        let values: Vec<&str> = schema["properties"]["experience_years"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(values, vec!["0", "2", "4", "7", "10"]);
    }

    #[test]
    fn test_text_prompt_embeds_resume() {
        let prompt = text_prompt("John Doe, engineer");
        assert!(prompt.contains("RESUME TEXT:\nJohn Doe, engineer"));
        assert!(prompt.contains("NEVER return a raw year count"));
    }
}
