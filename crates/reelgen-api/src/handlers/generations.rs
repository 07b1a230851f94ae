//! Generation submission and polling handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use reelgen_models::{GenerationId, Tier};

use crate::error::{ApiError, ApiResult};
use crate::services::PollSnapshot;
use crate::state::AppState;

/// Maximum prompt length in characters.
const MAX_PROMPT_CHARS: u64 = 500;

/// Longest clip duration any chain vendor accepts.
const MAX_DURATION_SECONDS: u32 = 30;

const DEFAULT_RESOLUTION: &str = "720p";

fn default_duration() -> u32 {
    5
}

fn default_resolution() -> String {
    DEFAULT_RESOLUTION.to_string()
}

/// Submit request body.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitGenerationRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,

    #[validate(length(min = 1, max = 500, message = "prompt must be 1-500 characters"))]
    pub prompt: String,

    #[serde(default)]
    pub tier: Tier,

    #[serde(default = "default_duration")]
    pub duration_seconds: u32,

    #[serde(default = "default_resolution")]
    pub resolution: String,
}

/// Submit response.
#[derive(Serialize)]
pub struct SubmitGenerationResponse {
    pub generation_id: String,
    pub provider_task_id: String,
    pub provider: String,
    pub status: String,
    pub cost_estimate: u32,
    pub poll_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Submit a generation request.
pub async fn submit_generation(
    State(state): State<AppState>,
    Json(body): Json<SubmitGenerationRequest>,
) -> ApiResult<(StatusCode, Json<SubmitGenerationResponse>)> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    // validator's length filter counts bytes; enforce chars explicitly
    if body.prompt.chars().count() as u64 > MAX_PROMPT_CHARS {
        return Err(ApiError::bad_request(format!(
            "prompt must be at most {} characters",
            MAX_PROMPT_CHARS
        )));
    }
    if body.duration_seconds == 0 || body.duration_seconds > MAX_DURATION_SECONDS {
        return Err(ApiError::bad_request(format!(
            "duration_seconds must be 1-{}",
            MAX_DURATION_SECONDS
        )));
    }

    let outcome = state
        .generations
        .submit(
            &body.user_id,
            body.prompt.trim(),
            body.tier,
            body.duration_seconds,
            &body.resolution,
        )
        .await?;

    let task = outcome.task;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitGenerationResponse {
            poll_url: format!("/api/generations/{}", task.id),
            generation_id: task.id.to_string(),
            provider_task_id: task.provider_task_id.to_string(),
            provider: task.provider,
            status: task.status.to_string(),
            cost_estimate: task.cost_estimate,
            warning: outcome.warning,
        }),
    ))
}

/// Poll a generation task.
pub async fn poll_generation(
    State(state): State<AppState>,
    Path(generation_id): Path<String>,
) -> ApiResult<Json<PollSnapshot>> {
    let id = GenerationId::from_string(generation_id);
    let snapshot = state.generations.poll(&id).await?;
    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let body: SubmitGenerationRequest =
            serde_json::from_str(r#"{"user_id":"u1","prompt":"a cat"}"#).unwrap();
        assert_eq!(body.tier, Tier::Free);
        assert_eq!(body.duration_seconds, 5);
        assert_eq!(body.resolution, "720p");
    }

    #[test]
    fn test_validation_rejects_empty_prompt() {
        let body: SubmitGenerationRequest =
            serde_json::from_str(r#"{"user_id":"u1","prompt":""}"#).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_missing_user() {
        let body: SubmitGenerationRequest =
            serde_json::from_str(r#"{"user_id":"","prompt":"a cat"}"#).unwrap();
        assert!(body.validate().is_err());
    }
}
