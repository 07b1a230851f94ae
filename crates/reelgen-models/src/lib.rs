//! Shared data models for the Reelgen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation tasks and their status lifecycle
//! - Service tiers and quota policy
//! - Per-user usage counters with monthly reset

pub mod generation;
pub mod quota;
pub mod tier;

// Re-export common types
pub use generation::{GenerationId, GenerationStatus, GenerationTask, ProviderTaskId};
pub use quota::{first_of_next_month, QuotaPolicy, UserQuota, DEFAULT_FREE_MONTHLY_LIMIT};
pub use tier::Tier;
