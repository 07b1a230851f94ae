//! User status handler.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use reelgen_models::{GenerationTask, Tier};

use crate::error::ApiResult;
use crate::state::AppState;

/// Quota snapshot for one tier.
#[derive(Serialize)]
pub struct TierUsage {
    pub used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

/// One entry of the generation history.
#[derive(Serialize)]
pub struct GenerationSummary {
    pub generation_id: String,
    pub prompt: String,
    pub tier: String,
    pub provider: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
}

impl From<GenerationTask> for GenerationSummary {
    fn from(t: GenerationTask) -> Self {
        Self {
            generation_id: t.id.to_string(),
            prompt: t.prompt,
            tier: t.tier.to_string(),
            provider: t.provider,
            status: t.status.to_string(),
            video_url: t.result_url,
            error: t.error_message,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// User status response.
#[derive(Serialize)]
pub struct UserStatusResponse {
    pub user_id: String,
    pub free: TierUsage,
    pub paid: TierUsage,
    pub reset_date: String,
    pub recent: Vec<GenerationSummary>,
}

/// Recent generation history and remaining quota for a user.
pub async fn get_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserStatusResponse>> {
    let (quota, recent) = state
        .generations
        .user_status(&user_id, state.config.history_limit)
        .await?;

    let policy = state.generations.policy();
    let usage = |tier: Tier| -> TierUsage {
        let used = quota.used(tier);
        let limit = policy.limit_for(tier);
        TierUsage {
            used,
            limit,
            remaining: limit.map(|l| l.saturating_sub(used)),
        }
    };

    Ok(Json(UserStatusResponse {
        user_id,
        free: usage(Tier::Free),
        paid: usage(Tier::Paid),
        reset_date: quota.reset_date.to_rfc3339(),
        recent: recent.into_iter().map(Into::into).collect(),
    }))
}
