//! Service layer.

pub mod generation;

pub use generation::{GenerationService, PollSnapshot, SubmitOutcome};
