//! PixVerse adapter.
//!
//! API-key header auth. Status is a numeric code; the response envelope
//! changed from `Resp` to `data` between API versions.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use reelgen_models::ProviderTaskId;

use crate::adapter::{finalize_poll, NormalizedStatus, ProviderAdapter, ProviderPoll, SubmitRequest};
use crate::config::VendorConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::extract::{first_string, first_u64};
use crate::http::HttpClient;

const NAME: &str = "pixverse";

/// Known result-URL paths, most-recent-first.
const RESULT_PATHS: &[&str] = &["data.url", "Resp.url"];

const ERROR_PATHS: &[&str] = &["ErrMsg", "data.err_msg", "Resp.err_msg"];

const TASK_ID_PATHS: &[&str] = &["data.video_id", "Resp.video_id"];

const STATUS_PATHS: &[&str] = &["data.status", "Resp.status"];

const COST_PER_BLOCK: u32 = 1;

pub struct PixverseAdapter {
    config: VendorConfig,
    http: HttpClient,
}

impl PixverseAdapter {
    pub fn new(config: VendorConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    /// Map the vendor's numeric status code.
    ///
    /// 1 = success, 5 = generating, 6 = queued, 7 = moderation rejection,
    /// 8 = generation failure. Unknown codes stay processing.
    fn map_status(code: u64) -> NormalizedStatus {
        match code {
            1 => NormalizedStatus::Completed,
            6 => NormalizedStatus::Queued,
            5 => NormalizedStatus::Processing,
            7 | 8 => NormalizedStatus::Failed,
            _ => NormalizedStatus::Processing,
        }
    }
}

#[async_trait]
impl ProviderAdapter for PixverseAdapter {
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
        let url = format!("{}/openapi/v2/video/text/generate", self.config.base_url);
        let body = json!({
            "prompt": request.prompt,
            "duration": request.duration_seconds,
            "quality": request.resolution,
            "aspect_ratio": "9:16",
        });

        let key = self.config.api_key.clone().unwrap_or_default();
        let response = self
            .http
            .post_json(&url, &[("API-KEY", key.as_str())], &body)
            .await?;

        if !response.is_success() {
            return Err(ProviderError::from_status(
                NAME,
                response.status.as_u16(),
                response.snippet,
            ));
        }

        // Task id is numeric in both envelope versions
        first_u64(&response.body, TASK_ID_PATHS)
            .map(|id| ProviderTaskId::from_string(id.to_string()))
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no video id in response"))
    }

    async fn poll_status(&self, task_id: &ProviderTaskId) -> ProviderResult<ProviderPoll> {
        let url = format!(
            "{}/openapi/v2/video/result/{}",
            self.config.base_url,
            task_id.as_str()
        );

        let key = self.config.api_key.clone().unwrap_or_default();
        let response = self
            .http
            .get_json(&url, &[("API-KEY", key.as_str())])
            .await?;

        if !response.is_success() {
            return Err(ProviderError::from_status(
                NAME,
                response.status.as_u16(),
                response.snippet,
            ));
        }

        let code = first_u64(&response.body, STATUS_PATHS)
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no status code in response"))?;
        let status = Self::map_status(code);
        debug!(provider = NAME, vendor_code = code, "Mapped vendor status");

        finalize_poll(
            NAME,
            ProviderPoll {
                status,
                progress: None,
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
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(base_url: &str) -> PixverseAdapter {
        PixverseAdapter::new(
            VendorConfig::new(Some("test-key".into()), base_url),
            HttpClient::default(),
        )
    }

    #[test]
    fn test_numeric_status_mapping() {
        assert_eq!(PixverseAdapter::map_status(1), NormalizedStatus::Completed);
        assert_eq!(PixverseAdapter::map_status(5), NormalizedStatus::Processing);
        assert_eq!(PixverseAdapter::map_status(6), NormalizedStatus::Queued);
        assert_eq!(PixverseAdapter::map_status(7), NormalizedStatus::Failed);
        assert_eq!(PixverseAdapter::map_status(8), NormalizedStatus::Failed);
        assert_eq!(PixverseAdapter::map_status(99), NormalizedStatus::Processing);
    }

    #[tokio::test]
    async fn test_submit_converts_numeric_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openapi/v2/video/text/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"video_id": 123456}})),
            )
            .mount(&server)
            .await;

        let id = adapter(&server.uri())
            .submit(&SubmitRequest {
                prompt: "neon city".into(),
                duration_seconds: 5,
                resolution: "540p".into(),
            })
            .await
            .unwrap();
        assert_eq!(id.as_str(), "123456");
    }

    #[tokio::test]
    async fn test_poll_reads_legacy_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi/v2/video/result/123456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Resp": {"status": 1, "url": "https://p/clip.mp4"}
            })))
            .mount(&server)
            .await;

        let poll = adapter(&server.uri())
            .poll_status(&ProviderTaskId::from_string("123456"))
            .await
            .unwrap();
        assert_eq!(poll.status, NormalizedStatus::Completed);
        assert_eq!(poll.result_url.as_deref(), Some("https://p/clip.mp4"));
    }

    #[tokio::test]
    async fn test_poll_success_code_without_url_is_result_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi/v2/video/result/123456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"status": 1}
            })))
            .mount(&server)
            .await;

        let err = adapter(&server.uri())
            .poll_status(&ProviderTaskId::from_string("123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ResultNotFound { .. }));
    }
}
