//! Video generation vendor integrations.
//!
//! This crate provides:
//! - A thin outbound HTTP wrapper with per-call timeouts
//! - Per-vendor adapters normalizing divergent request/response shapes
//! - A fallback chain selector walking tier-indexed provider lists
//!
//! Vendor response shapes are encapsulated entirely inside each adapter;
//! nothing outside this crate may assume a specific vendor contract.

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod registry;

pub use adapter::{NormalizedStatus, ProviderAdapter, ProviderPoll, SubmitRequest};
pub use config::{ProvidersConfig, VendorConfig};
pub use error::{ProviderError, ProviderResult};
pub use http::{HttpClient, HttpResponse};
pub use registry::{ProviderRegistry, SubmittedJob};
