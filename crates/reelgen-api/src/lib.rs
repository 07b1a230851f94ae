//! Axum HTTP API server.
//!
//! This crate provides:
//! - Generation submission with provider fallback
//! - Status polling against vendor APIs
//! - Monthly quota enforcement with rollback on failure
//! - Rate limiting and security headers

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::GenerationService;
pub use state::AppState;
