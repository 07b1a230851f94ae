//! HTTP handlers.

pub mod generations;
pub mod health;
pub mod users;

pub use health::{health, ready};
