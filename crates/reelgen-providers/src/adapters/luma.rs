//! Luma Dream Machine adapter.
//!
//! Bearer-token auth. States: queued, dreaming, completed, failed.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use reelgen_models::ProviderTaskId;

use crate::adapter::{finalize_poll, NormalizedStatus, ProviderAdapter, ProviderPoll, SubmitRequest};
use crate::config::VendorConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::extract::{first_string, first_u64};
use crate::http::HttpClient;

const NAME: &str = "luma";

/// Known result-URL paths, most-recent-first. The raw asset is preferred
/// over the watermarked one.
const RESULT_PATHS: &[&str] = &["assets.video", "assets.video_raw", "video.download_url"];

const ERROR_PATHS: &[&str] = &["failure_reason", "error.message", "detail"];

const PROGRESS_PATHS: &[&str] = &["progress_percent"];

/// Credits per clip per 5-second block.
const COST_PER_BLOCK: u32 = 5;

pub struct LumaAdapter {
    config: VendorConfig,
    http: HttpClient,
}

impl LumaAdapter {
    pub fn new(config: VendorConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.config.api_key.as_deref().unwrap_or_default())
    }

    fn map_status(state: &str) -> NormalizedStatus {
        match state.to_lowercase().as_str() {
            "queued" => NormalizedStatus::Queued,
            "dreaming" | "processing" => NormalizedStatus::Processing,
            "completed" => NormalizedStatus::Completed,
            "failed" => NormalizedStatus::Failed,
            // Unknown vendor strings are never treated as terminal
            _ => NormalizedStatus::Processing,
        }
    }
}

#[async_trait]
impl ProviderAdapter for LumaAdapter {
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
        let url = format!("{}/dream-machine/v1/generations", self.config.base_url);
        let body = json!({
            "prompt": request.prompt,
            "model": "ray-2",
            "duration": format!("{}s", request.duration_seconds),
            "resolution": request.resolution,
        });

        let auth = self.auth_header();
        let response = self
            .http
            .post_json(&url, &[("Authorization", auth.as_str())], &body)
            .await?;

        if !response.is_success() {
            return Err(ProviderError::from_status(
                NAME,
                response.status.as_u16(),
                response.snippet,
            ));
        }

        first_string(&response.body, &["id", "generation_id"])
            .map(ProviderTaskId::from_string)
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no generation id in response"))
    }

    async fn poll_status(&self, task_id: &ProviderTaskId) -> ProviderResult<ProviderPoll> {
        let url = format!(
            "{}/dream-machine/v1/generations/{}",
            self.config.base_url,
            task_id.as_str()
        );

        let auth = self.auth_header();
        let response = self
            .http
            .get_json(&url, &[("Authorization", auth.as_str())])
            .await?;

        if !response.is_success() {
            return Err(ProviderError::from_status(
                NAME,
                response.status.as_u16(),
                response.snippet,
            ));
        }

        let state = first_string(&response.body, &["state", "status"])
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no state in response"))?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(base_url: &str) -> LumaAdapter {
        LumaAdapter::new(
            VendorConfig::new(Some("test-key".into()), base_url),
            HttpClient::default(),
        )
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(LumaAdapter::map_status("DREAMING"), NormalizedStatus::Processing);
        assert_eq!(LumaAdapter::map_status("queued"), NormalizedStatus::Queued);
        assert_eq!(LumaAdapter::map_status("Completed"), NormalizedStatus::Completed);
        assert_eq!(LumaAdapter::map_status("failed"), NormalizedStatus::Failed);
        // Vendors invent states; never treat unknowns as terminal
        assert_eq!(LumaAdapter::map_status("rendering_v2"), NormalizedStatus::Processing);
    }

    #[test]
    fn test_cost_scales_with_duration() {
        let a = adapter("https://unused");
        assert_eq!(a.cost_estimate(5), 5);
        assert_eq!(a.cost_estimate(6), 10);
        assert_eq!(a.cost_estimate(0), 5);
    }

    #[tokio::test]
    async fn test_submit_extracts_generation_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dream-machine/v1/generations"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "gen-1", "state": "queued"})),
            )
            .mount(&server)
            .await;

        let id = adapter(&server.uri())
            .submit(&SubmitRequest {
                prompt: "cat playing piano".into(),
                duration_seconds: 5,
                resolution: "720p".into(),
            })
            .await
            .unwrap();
        assert_eq!(id.as_str(), "gen-1");
    }

    #[tokio::test]
    async fn test_poll_prefers_raw_asset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dream-machine/v1/generations/gen-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "completed",
                "assets": {"video": "https://a/raw.mp4", "video_raw": "https://a/older.mp4"}
            })))
            .mount(&server)
            .await;

        let poll = adapter(&server.uri())
            .poll_status(&ProviderTaskId::from_string("gen-1"))
            .await
            .unwrap();
        assert_eq!(poll.status, NormalizedStatus::Completed);
        assert_eq!(poll.result_url.as_deref(), Some("https://a/raw.mp4"));
    }

    #[tokio::test]
    async fn test_poll_completed_without_result_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dream-machine/v1/generations/gen-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"state": "completed", "assets": {}})),
            )
            .mount(&server)
            .await;

        let err = adapter(&server.uri())
            .poll_status(&ProviderTaskId::from_string("gen-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ResultNotFound { .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dream-machine/v1/generations"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad key"})))
            .mount(&server)
            .await;

        let err = adapter(&server.uri())
            .submit(&SubmitRequest {
                prompt: "x".into(),
                duration_seconds: 5,
                resolution: "720p".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Auth { status: 401, .. }));
    }
}
