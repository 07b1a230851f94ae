//! Generation orchestration service.
//!
//! Owns the submit and poll flows:
//! - Submit: quota reservation (optimistic, before the vendor call), then
//!   the fallback chain, then task persistence. A persistence failure after
//!   the vendor accepted does not abort the job; tracking degrades to
//!   best-effort and the response carries a warning.
//! - Poll: client-driven. Terminal tasks return the cached payload without
//!   re-contacting the vendor. Transient vendor errors leave the task
//!   untouched and surface as a warning so the client's poll loop keeps
//!   going. A failure observed at poll time rolls the quota reservation
//!   back exactly once per task.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use reelgen_models::{GenerationId, GenerationStatus, GenerationTask, QuotaPolicy, Tier};
use reelgen_providers::{
    NormalizedStatus, ProviderError, ProviderRegistry, SubmitRequest,
};
use reelgen_store::{GenerationStore, ReserveOutcome};

use crate::error::{ApiError, ApiResult};

/// Warning attached when task persistence fails after a vendor accepted.
const TRACKING_DEGRADED: &str =
    "generation accepted but status tracking is degraded; polling may lag";

/// Reason recorded when a vendor reports completion with no result URL.
const RESULT_NOT_FOUND: &str = "result not found";

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub task: GenerationTask,
    pub warning: Option<String>,
}

/// What a poll returns to the client.
#[derive(Debug, Clone, Serialize)]
pub struct PollSnapshot {
    pub generation_id: String,
    pub provider: String,
    pub status: GenerationStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PollSnapshot {
    fn from_task(task: &GenerationTask, warning: Option<String>) -> Self {
        Self {
            generation_id: task.id.to_string(),
            provider: task.provider.clone(),
            status: task.status,
            progress: task.progress,
            video_url: task.result_url.clone(),
            error: task.error_message.clone(),
            warning,
        }
    }
}

/// Orchestrates submissions and polling against the provider layer and store.
#[derive(Clone)]
pub struct GenerationService {
    store: Arc<dyn GenerationStore>,
    providers: Arc<ProviderRegistry>,
    policy: QuotaPolicy,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        providers: Arc<ProviderRegistry>,
        policy: QuotaPolicy,
    ) -> Self {
        Self {
            store,
            providers,
            policy,
        }
    }

    /// Submit a generation request.
    ///
    /// Quota is reserved before any vendor call, so a denied request has no
    /// side effects. If every provider rejects the job the reservation is
    /// released again.
    pub async fn submit(
        &self,
        user_id: &str,
        prompt: &str,
        tier: Tier,
        duration_seconds: u32,
        resolution: &str,
    ) -> ApiResult<SubmitOutcome> {
        let limit = self.policy.limit_for(tier);
        match self.store.try_reserve(user_id, tier, limit).await? {
            ReserveOutcome::Reserved { used_after } => {
                info!(user_id = %user_id, tier = %tier, used_after, "Reserved quota");
            }
            ReserveOutcome::Denied { used, limit } => {
                return Err(ApiError::payment_required(format!(
                    "Monthly {} generation limit reached ({}/{}). Upgrade your plan to keep generating.",
                    tier, used, limit
                )));
            }
        }

        let request = SubmitRequest {
            prompt: prompt.to_string(),
            duration_seconds,
            resolution: resolution.to_string(),
        };

        let job = match self.providers.submit_with_fallback(tier, &request).await {
            Ok(job) => job,
            Err(e) => {
                // The vendor never accepted, so the reservation is released
                // rather than rolled back through a task record.
                if let Err(re) = self.store.release(user_id, tier).await {
                    warn!(user_id = %user_id, error = %re, "Failed to release quota reservation");
                }
                return Err(match e {
                    ProviderError::Unconfigured { .. } => {
                        ApiError::internal("No video providers are configured")
                    }
                    other => ApiError::internal(format!("All providers failed: {}", other)),
                });
            }
        };

        let task = GenerationTask::new(
            user_id,
            prompt,
            tier,
            duration_seconds,
            resolution,
            job.provider,
            job.task_id,
            job.cost_estimate,
        );

        // The vendor job is already running; a write failure here degrades
        // status tracking to best-effort instead of aborting the request.
        let warning = match self.store.put_task(&task).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    generation_id = %task.id,
                    provider = %task.provider,
                    error = %e,
                    "Failed to persist generation task"
                );
                Some(TRACKING_DEGRADED.to_string())
            }
        };

        info!(
            generation_id = %task.id,
            provider = %task.provider,
            user_id = %user_id,
            "Created generation task"
        );

        Ok(SubmitOutcome { task, warning })
    }

    /// Poll a generation task, delegating to the adapter that accepted it.
    pub async fn poll(&self, id: &GenerationId) -> ApiResult<PollSnapshot> {
        let mut task = self
            .store
            .get_task(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Generation not found: {}", id)))?;

        // Terminal tasks are served from the store; the vendor is not
        // contacted again.
        if task.is_terminal() {
            return Ok(PollSnapshot::from_task(&task, None));
        }

        let adapter = self.providers.adapter(&task.provider).ok_or_else(|| {
            ApiError::internal(format!("Unknown provider on task: {}", task.provider))
        })?;

        match adapter.poll_status(&task.provider_task_id).await {
            Ok(poll) => match poll.status {
                NormalizedStatus::Completed => {
                    // finalize_poll in the adapter guarantees a URL here
                    let url = poll.result_url.ok_or_else(|| {
                        ApiError::internal("completed poll without result URL")
                    })?;
                    task.complete(url);
                    let warning = self.persist(&task).await;
                    info!(generation_id = %task.id, "Generation completed");
                    Ok(PollSnapshot::from_task(&task, warning))
                }
                NormalizedStatus::Failed => {
                    let reason = poll
                        .error
                        .unwrap_or_else(|| "provider reported failure".to_string());
                    self.fail_and_rollback(&mut task, reason).await
                }
                NormalizedStatus::Queued | NormalizedStatus::Processing => {
                    if let Some(p) = poll.progress {
                        task.set_progress(p);
                    }
                    let warning = self.persist(&task).await;
                    Ok(PollSnapshot::from_task(&task, warning))
                }
            },
            Err(ProviderError::ResultNotFound { .. }) => {
                // Vendor says done but nothing extractable: a generation
                // failure, not a still-processing state. Prevents infinite
                // polling.
                self.fail_and_rollback(&mut task, RESULT_NOT_FOUND.to_string())
                    .await
            }
            Err(e) if e.is_transient() => {
                // Timed-out or unreachable vendor: no state change, the
                // client polls again later.
                warn!(generation_id = %task.id, error = %e, "Transient poll failure");
                Ok(PollSnapshot::from_task(
                    &task,
                    Some(format!("provider temporarily unreachable: {}", e)),
                ))
            }
            Err(e) => {
                // Vendor rejection on a status read (auth revoked, rate
                // limit). The task may still finish, so report the last
                // known status with a warning instead of failing it.
                warn!(generation_id = %task.id, error = %e, "Poll rejected by provider");
                Ok(PollSnapshot::from_task(
                    &task,
                    Some(format!("status check failed: {}", e)),
                ))
            }
        }
    }

    /// Recent generations and the quota snapshot for a user.
    pub async fn user_status(
        &self,
        user_id: &str,
        history_limit: usize,
    ) -> ApiResult<(reelgen_models::UserQuota, Vec<GenerationTask>)> {
        let quota = self.store.get_quota(user_id).await?;
        let recent = self.store.list_user_tasks(user_id, history_limit).await?;
        Ok((quota, recent))
    }

    /// The configured quota policy.
    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    async fn fail_and_rollback(
        &self,
        task: &mut GenerationTask,
        reason: String,
    ) -> ApiResult<PollSnapshot> {
        task.fail(reason);
        let warning = self.persist(task).await;

        // Tracked per task: repeated polls after failure never decrement twice
        match self.store.rollback_once(&task.id).await {
            Ok(true) => {
                info!(generation_id = %task.id, user_id = %task.user_id, "Rolled back quota");
            }
            Ok(false) => {}
            Err(e) => {
                warn!(generation_id = %task.id, error = %e, "Quota rollback failed");
            }
        }

        Ok(PollSnapshot::from_task(task, warning))
    }

    async fn persist(&self, task: &GenerationTask) -> Option<String> {
        match self.store.put_task(task).await {
            Ok(()) => None,
            Err(e) => {
                warn!(generation_id = %task.id, error = %e, "Failed to persist task update");
                Some(TRACKING_DEGRADED.to_string())
            }
        }
    }
}
