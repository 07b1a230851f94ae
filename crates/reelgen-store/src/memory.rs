//! In-memory store.
//!
//! All mutations happen under a single write lock, which makes the
//! check-and-increment and rollback-once contracts trivially atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use reelgen_models::{GenerationId, GenerationTask, Tier, UserQuota};

use crate::error::{StoreError, StoreResult};
use crate::store::{GenerationStore, ReserveOutcome};

#[derive(Default)]
struct Inner {
    quotas: HashMap<String, UserQuota>,
    tasks: HashMap<String, GenerationTask>,
}

/// In-memory [`GenerationStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed users up front (tests and dev).
    pub async fn with_users(user_ids: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().await;
            for uid in user_ids {
                inner
                    .quotas
                    .insert(uid.to_string(), UserQuota::new(*uid));
            }
        }
        store
    }

    /// Overwrite a quota record directly (tests).
    pub async fn set_quota(&self, quota: UserQuota) {
        let mut inner = self.inner.write().await;
        inner.quotas.insert(quota.user_id.clone(), quota);
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn create_user(&self, user_id: &str) -> StoreResult<UserQuota> {
        let mut inner = self.inner.write().await;
        if inner.quotas.contains_key(user_id) {
            return Err(StoreError::AlreadyExists(user_id.to_string()));
        }
        let quota = UserQuota::new(user_id);
        inner.quotas.insert(user_id.to_string(), quota.clone());
        Ok(quota)
    }

    async fn get_quota(&self, user_id: &str) -> StoreResult<UserQuota> {
        let mut inner = self.inner.write().await;
        let quota = inner
            .quotas
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;
        quota.maybe_reset(Utc::now());
        Ok(quota.clone())
    }

    async fn try_reserve(
        &self,
        user_id: &str,
        tier: Tier,
        limit: Option<u32>,
    ) -> StoreResult<ReserveOutcome> {
        let mut inner = self.inner.write().await;
        let quota = inner
            .quotas
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

        quota.maybe_reset(Utc::now());

        let used = quota.used(tier);
        if let Some(limit) = limit {
            if used >= limit {
                return Ok(ReserveOutcome::Denied { used, limit });
            }
        }

        quota.increment(tier);
        let used_after = quota.used(tier);
        debug!(user_id = %user_id, tier = %tier, used_after, "Reserved quota");
        Ok(ReserveOutcome::Reserved { used_after })
    }

    async fn release(&self, user_id: &str, tier: Tier) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let quota = inner
            .quotas
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;
        quota.decrement(tier);
        Ok(())
    }

    async fn put_task(&self, task: &GenerationTask) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.tasks.insert(task.id.as_str().to_string(), task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &GenerationId) -> StoreResult<Option<GenerationTask>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.get(id.as_str()).cloned())
    }

    async fn list_user_tasks(&self, user_id: &str, limit: usize) -> StoreResult<Vec<GenerationTask>> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<GenerationTask> = inner
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        Ok(tasks)
    }

    async fn rollback_once(&self, id: &GenerationId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;

        let (user_id, tier) = {
            let task = inner
                .tasks
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
            if task.quota_rolled_back {
                return Ok(false);
            }
            task.quota_rolled_back = true;
            (task.user_id.clone(), task.tier)
        };

        // Same write lock as the flag flip, so this is one atomic step
        if let Some(quota) = inner.quotas.get_mut(&user_id) {
            quota.decrement(tier);
        }
        debug!(generation_id = %id, user_id = %user_id, "Rolled back quota reservation");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reelgen_models::ProviderTaskId;

    fn task_for(user: &str) -> GenerationTask {
        GenerationTask::new(
            user,
            "cat playing piano",
            Tier::Free,
            5,
            "720p",
            "kling",
            ProviderTaskId::from_string("kt-1"),
            1,
        )
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_quota("ghost").await,
            Err(StoreError::UserNotFound(_))
        ));
        assert!(matches!(
            store.try_reserve("ghost", Tier::Free, Some(10)).await,
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reserve_boundary() {
        let store = MemoryStore::with_users(&["u1"]).await;

        // 9/10 -> allowed, becomes 10
        for _ in 0..9 {
            assert!(store
                .try_reserve("u1", Tier::Free, Some(10))
                .await
                .unwrap()
                .is_reserved());
        }
        let outcome = store.try_reserve("u1", Tier::Free, Some(10)).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Reserved { used_after: 10 });

        // At the limit -> denied
        let outcome = store.try_reserve("u1", Tier::Free, Some(10)).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Denied { used: 10, limit: 10 });
    }

    #[tokio::test]
    async fn test_unmetered_tier_still_counts_usage() {
        let store = MemoryStore::with_users(&["u1"]).await;
        for _ in 0..3 {
            assert!(store
                .try_reserve("u1", Tier::Paid, None)
                .await
                .unwrap()
                .is_reserved());
        }
        assert_eq!(store.get_quota("u1").await.unwrap().paid_used, 3);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_exceed_limit() {
        use std::sync::Arc;
        let store = Arc::new(MemoryStore::with_users(&["u1"]).await);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.try_reserve("u1", Tier::Free, Some(10)).await.unwrap()
            }));
        }

        let mut reserved = 0;
        for h in handles {
            if h.await.unwrap().is_reserved() {
                reserved += 1;
            }
        }
        assert_eq!(reserved, 10);
        assert_eq!(store.get_quota("u1").await.unwrap().free_used, 10);
    }

    #[tokio::test]
    async fn test_rollback_fires_exactly_once() {
        let store = MemoryStore::with_users(&["u1"]).await;
        store.try_reserve("u1", Tier::Free, Some(10)).await.unwrap();

        let task = task_for("u1");
        let id = task.id.clone();
        store.put_task(&task).await.unwrap();

        assert!(store.rollback_once(&id).await.unwrap());
        // Polled again after failure: no double rollback
        assert!(!store.rollback_once(&id).await.unwrap());

        assert_eq!(store.get_quota("u1").await.unwrap().free_used, 0);
    }

    #[tokio::test]
    async fn test_lazy_monthly_reset_on_access() {
        let store = MemoryStore::with_users(&["u1"]).await;

        let mut quota = store.get_quota("u1").await.unwrap();
        quota.free_used = 9;
        quota.paid_used = 2;
        quota.reset_date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        store.set_quota(quota).await;

        let quota = store.get_quota("u1").await.unwrap();
        assert_eq!(quota.free_used, 0);
        assert_eq!(quota.paid_used, 0);
        assert!(quota.reset_date > Utc::now());
    }

    #[tokio::test]
    async fn test_list_user_tasks_newest_first() {
        let store = MemoryStore::with_users(&["u1"]).await;
        let mut older = task_for("u1");
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let newer = task_for("u1");
        store.put_task(&older).await.unwrap();
        store.put_task(&newer).await.unwrap();
        store.put_task(&task_for("u2")).await.unwrap();

        let tasks = store.list_user_tasks("u1", 10).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, newer.id);
    }
}
