//! Store contract.

use async_trait::async_trait;

use reelgen_models::{GenerationId, GenerationTask, Tier, UserQuota};

use crate::error::StoreResult;

/// Outcome of an atomic quota reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Counter was incremented; `used_after` is the new value.
    Reserved { used_after: u32 },
    /// Limit reached; nothing changed.
    Denied { used: u32, limit: u32 },
}

impl ReserveOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved { .. })
    }
}

/// Persistence contract for quota and task records.
///
/// `try_reserve` must perform check-and-increment as one atomic conditional
/// update, and `rollback_once` must decrement at most once per task no
/// matter how many times it is called.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Create a fresh quota record for a user.
    async fn create_user(&self, user_id: &str) -> StoreResult<UserQuota>;

    /// Read a user's quota, applying the lazy monthly reset first.
    async fn get_quota(&self, user_id: &str) -> StoreResult<UserQuota>;

    /// Atomically increment the tier counter if below `limit`.
    ///
    /// `limit: None` means the tier is unmetered here; the counter is still
    /// incremented for reporting. The monthly reset is applied before the
    /// check.
    async fn try_reserve(
        &self,
        user_id: &str,
        tier: Tier,
        limit: Option<u32>,
    ) -> StoreResult<ReserveOutcome>;

    /// Release a reservation that never became a task (e.g. every provider
    /// rejected the submission). Saturating at zero.
    async fn release(&self, user_id: &str, tier: Tier) -> StoreResult<()>;

    /// Persist a generation task (insert or overwrite by id).
    async fn put_task(&self, task: &GenerationTask) -> StoreResult<()>;

    /// Read a generation task by id.
    async fn get_task(&self, id: &GenerationId) -> StoreResult<Option<GenerationTask>>;

    /// Recent tasks for a user, newest first.
    async fn list_user_tasks(&self, user_id: &str, limit: usize) -> StoreResult<Vec<GenerationTask>>;

    /// Roll back the quota reservation for a failed task, at most once.
    ///
    /// Returns true if the rollback was performed by this call, false if it
    /// had already happened. Sets the task's `quota_rolled_back` flag and
    /// decrements the counter in the same atomic step.
    async fn rollback_once(&self, id: &GenerationId) -> StoreResult<bool>;
}
