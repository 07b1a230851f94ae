//! Kling adapter.
//!
//! API-key header auth. The task envelope lives under `data`; result URLs
//! moved between API versions, so both shapes are listed.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use reelgen_models::ProviderTaskId;

use crate::adapter::{finalize_poll, NormalizedStatus, ProviderAdapter, ProviderPoll, SubmitRequest};
use crate::config::VendorConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::extract::{first_string, first_u64};
use crate::http::HttpClient;

const NAME: &str = "kling";

/// Known result-URL paths, most-recent-first.
const RESULT_PATHS: &[&str] = &[
    "data.task_result.videos[0].url",
    "data.works[0].resource.resource",
];

const ERROR_PATHS: &[&str] = &["data.task_status_msg", "message"];

const PROGRESS_PATHS: &[&str] = &["data.progress"];

const COST_PER_BLOCK: u32 = 2;

pub struct KlingAdapter {
    config: VendorConfig,
    http: HttpClient,
}

impl KlingAdapter {
    pub fn new(config: VendorConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    fn map_status(state: &str) -> NormalizedStatus {
        match state.to_lowercase().as_str() {
            "submitted" => NormalizedStatus::Queued,
            "processing" => NormalizedStatus::Processing,
            "succeed" | "succeeded" => NormalizedStatus::Completed,
            "failed" => NormalizedStatus::Failed,
            _ => NormalizedStatus::Processing,
        }
    }
}

#[async_trait]
impl ProviderAdapter for KlingAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn cost_estimate(&self, duration_seconds: u32) -> u32 {
        COST_PER_BLOCK * duration_seconds.div_ceil(5).max(1)
    }

    async fn submit(&self, request: &SubmitRequest) -> ProviderResult<ProviderTaskId> {
        let url = format!("{}/v1/videos/text2video", self.config.base_url);
        let body = json!({
            "prompt": request.prompt,
            "duration": request.duration_seconds.to_string(),
            "mode": "std",
            "aspect_ratio": "9:16",
        });

        let key = self.config.api_key.clone().unwrap_or_default();
        let response = self
            .http
            .post_json(&url, &[("X-Api-Key", key.as_str())], &body)
            .await?;

        if !response.is_success() {
            return Err(ProviderError::from_status(
                NAME,
                response.status.as_u16(),
                response.snippet,
            ));
        }

        first_string(&response.body, &["data.task_id", "task_id"])
            .map(ProviderTaskId::from_string)
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no task id in response"))
    }

    async fn poll_status(&self, task_id: &ProviderTaskId) -> ProviderResult<ProviderPoll> {
        let url = format!(
            "{}/v1/videos/text2video/{}",
            self.config.base_url,
            task_id.as_str()
        );

        let key = self.config.api_key.clone().unwrap_or_default();
        let response = self
            .http
            .get_json(&url, &[("X-Api-Key", key.as_str())])
            .await?;

        if !response.is_success() {
            return Err(ProviderError::from_status(
                NAME,
                response.status.as_u16(),
                response.snippet,
            ));
        }

        let state = first_string(&response.body, &["data.task_status", "status"])
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no task status in response"))?;
        let status = Self::map_status(&state);
        debug!(provider = NAME, vendor_state = %state, "Mapped vendor status");

        finalize_poll(
            NAME,
            ProviderPoll {
                status,
                progress: first_u64(&response.body, PROGRESS_PATHS).map(|p| p.min(100) as u8),
                result_url: first_string(&response.body, RESULT_PATHS),
                error: first_string(&response.body, ERROR_PATHS),
            },
        )
    }
}
