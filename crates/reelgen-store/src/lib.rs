//! Persistence boundary for generation tasks and usage quotas.
//!
//! The [`GenerationStore`] trait is the contract the orchestration layer
//! depends on. Any durable key-value or relational store can implement it;
//! the one hard requirement is that quota reservation is an atomic
//! conditional update, so concurrent submissions cannot both pass the
//! check before either increments.
//!
//! Ships with an in-memory implementation used for development and tests.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{GenerationStore, ReserveOutcome};
