//! Provider adapter contract.

use async_trait::async_trait;

use reelgen_models::ProviderTaskId;

use crate::error::{ProviderError, ProviderResult};

/// Vendor-agnostic status set every adapter maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl NormalizedStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NormalizedStatus::Completed | NormalizedStatus::Failed)
    }
}

/// A generation request as the adapter sees it.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub prompt: String,
    pub duration_seconds: u32,
    pub resolution: String,
}

/// Normalized result of one status poll.
#[derive(Debug, Clone)]
pub struct ProviderPoll {
    pub status: NormalizedStatus,
    /// Heuristic progress estimate (0-100), when the vendor reports one
    pub progress: Option<u8>,
    /// Set iff status is completed
    pub result_url: Option<String>,
    /// Vendor error message, when status is failed
    pub error: Option<String>,
}

/// One vendor integration.
///
/// Everything vendor-specific lives behind this trait: request body shape,
/// auth scheme, status vocabulary, and the ordered result-URL paths.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name used in chains and task records.
    fn name(&self) -> &'static str;

    /// Whether credentials are configured. Unconfigured providers are
    /// skipped by the chain without counting as a failure.
    fn is_configured(&self) -> bool;

    /// Estimated cost in credits for a clip of the given duration.
    fn cost_estimate(&self, duration_seconds: u32) -> u32;

    /// Submit a generation job, returning the vendor task id.
    async fn submit(&self, request: &SubmitRequest) -> ProviderResult<ProviderTaskId>;

    /// Poll the vendor for the current task state.
    async fn poll_status(&self, task_id: &ProviderTaskId) -> ProviderResult<ProviderPoll>;
}

/// Enforce the completed-implies-result invariant on a poll result.
///
/// A vendor-terminal "completed" with no extractable URL becomes
/// [`ProviderError::ResultNotFound`] so the caller fails the task instead
/// of polling forever.
pub fn finalize_poll(provider: &str, poll: ProviderPoll) -> ProviderResult<ProviderPoll> {
    if poll.status == NormalizedStatus::Completed && poll.result_url.is_none() {
        return Err(ProviderError::ResultNotFound {
            provider: provider.to_string(),
        });
    }
    Ok(poll)
}
