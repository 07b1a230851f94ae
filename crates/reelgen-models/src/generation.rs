//! Generation task definitions.
//!
//! A [`GenerationTask`] represents one request for a generated video clip,
//! from submission through polling to a terminal state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Tier;

/// Caller-visible identifier for a generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GenerationId(pub String);

impl GenerationId {
    /// Generate a new random generation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vendor-assigned task identifier, opaque to everything outside the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProviderTaskId(pub String);

impl ProviderTaskId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Accepted but not yet submitted to a provider
    #[default]
    Pending,
    /// Provider accepted the job, waiting to start
    Queued,
    /// Provider is generating the clip
    Processing,
    /// Clip is ready, result URL is set
    Completed,
    /// Generation failed, error message is set
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Queued => "queued",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One request for a generated video clip.
///
/// Status transitions are monotonic: `pending`/`queued`/`processing` may move
/// to `completed` or `failed`, both terminal. The result URL is set if and
/// only if the task completed. Mutators ignore updates once terminal.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationTask {
    /// Caller-visible generation ID
    pub id: GenerationId,

    /// User who requested this generation
    pub user_id: String,

    /// Prompt text (bounded at the API layer)
    pub prompt: String,

    /// Service tier the request was billed against
    pub tier: Tier,

    /// Requested clip duration in seconds
    pub duration_seconds: u32,

    /// Requested resolution, e.g. "720p"
    pub resolution: String,

    /// Provider that accepted the job
    pub provider: String,

    /// Vendor-assigned task ID
    pub provider_task_id: ProviderTaskId,

    /// Current status
    #[serde(default)]
    pub status: GenerationStatus,

    /// Progress estimate (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Result URL, set iff status is completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,

    /// Error message, set when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Estimated cost in credits
    #[serde(default)]
    pub cost_estimate: u32,

    /// Whether the quota reservation for this task has been rolled back.
    /// Guards against double-rollback when a failed task is polled again.
    #[serde(default)]
    pub quota_rolled_back: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// When the provider accepted the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl GenerationTask {
    /// Create a new task for a job a provider just accepted.
    pub fn new(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        tier: Tier,
        duration_seconds: u32,
        resolution: impl Into<String>,
        provider: impl Into<String>,
        provider_task_id: ProviderTaskId,
        cost_estimate: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GenerationId::new(),
            user_id: user_id.into(),
            prompt: prompt.into(),
            tier,
            duration_seconds,
            resolution: resolution.into(),
            provider: provider.into(),
            provider_task_id,
            status: GenerationStatus::Processing,
            progress: 0,
            result_url: None,
            error_message: None,
            cost_estimate,
            quota_rolled_back: false,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
            updated_at: now,
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Update progress. Monotonic non-decreasing: vendors occasionally report
    /// a lower estimate on a later poll, which we clamp away. No-op once terminal.
    pub fn set_progress(&mut self, progress: u8) {
        if self.is_terminal() {
            return;
        }
        self.progress = self.progress.max(progress.min(100));
        self.updated_at = Utc::now();
    }

    /// Mark the task as completed with its result URL. No-op once terminal,
    /// so a stored result URL never changes on subsequent polls.
    pub fn complete(&mut self, result_url: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.status = GenerationStatus::Completed;
        self.result_url = Some(result_url.into());
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Mark the task as failed. No-op once terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.status = GenerationStatus::Failed;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> GenerationTask {
        GenerationTask::new(
            "user123",
            "cat playing piano",
            Tier::Free,
            5,
            "720p",
            "kling",
            ProviderTaskId::from_string("vendor-42"),
            1,
        )
    }

    #[test]
    fn test_task_creation() {
        let t = task();
        assert_eq!(t.status, GenerationStatus::Processing);
        assert!(t.result_url.is_none());
        assert!(!t.is_terminal());
        assert!(t.started_at.is_some());
    }

    #[test]
    fn test_complete_sets_result_url() {
        let mut t = task();
        t.complete("https://cdn.example.com/clip.mp4");
        assert_eq!(t.status, GenerationStatus::Completed);
        assert_eq!(t.progress, 100);
        assert_eq!(t.result_url.as_deref(), Some("https://cdn.example.com/clip.mp4"));
        assert!(t.is_terminal());
    }

    #[test]
    fn test_terminal_state_is_immutable() {
        let mut t = task();
        t.complete("https://cdn.example.com/a.mp4");

        // Later polls must not change the stored result
        t.complete("https://cdn.example.com/b.mp4");
        t.fail("late failure");
        t.set_progress(10);

        assert_eq!(t.status, GenerationStatus::Completed);
        assert_eq!(t.result_url.as_deref(), Some("https://cdn.example.com/a.mp4"));
        assert_eq!(t.progress, 100);
        assert!(t.error_message.is_none());
    }

    #[test]
    fn test_fail_sets_error() {
        let mut t = task();
        t.fail("result not found");
        assert_eq!(t.status, GenerationStatus::Failed);
        assert_eq!(t.error_message.as_deref(), Some("result not found"));
        assert!(t.result_url.is_none());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut t = task();
        t.set_progress(40);
        t.set_progress(25);
        assert_eq!(t.progress, 40);
        t.set_progress(90);
        assert_eq!(t.progress, 90);
    }
}
