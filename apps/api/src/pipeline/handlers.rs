use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::candidate::CandidateInfo;
use crate::pipeline::parse_resume;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResumeRequest {
    pub resume_url: String,
}

/// Uniform response shape: `candidateInfo` is always present (sentinel on
/// failure), `error` only when processing failed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResumeResponse {
    pub candidate_info: CandidateInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/resumes/parse
///
/// Always responds 200 once a well-formed request is in hand — failures are
/// folded into the body so clients parse one shape. The only non-200 paths
/// are request validation and the fatal missing-key configuration case,
/// which never reaches this handler.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Json(req): Json<ParseResumeRequest>,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let resume_url = req.resume_url.trim();
    if resume_url.is_empty() {
        return Err(AppError::Validation("resumeUrl must not be empty".to_string()));
    }

    let outcome = parse_resume(&state, resume_url).await;
    Ok(Json(ParseResumeResponse {
        candidate_info: outcome.candidate,
        error: outcome.error,
    }))
}
