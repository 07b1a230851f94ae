//! Provider configuration.
//!
//! Credentials and base URLs are read once at startup and injected as an
//! immutable object; the orchestration core never reads ambient process
//! state.

use std::time::Duration;

use reelgen_models::Tier;

use crate::http::DEFAULT_TIMEOUT;

/// Configuration for one vendor.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    /// API key; `None` means the provider is unconfigured and skipped.
    pub api_key: Option<String>,
    /// Base URL without trailing slash.
    pub base_url: String,
}

impl VendorConfig {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { api_key, base_url }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.is_empty()).unwrap_or(false)
    }
}

/// Full provider-layer configuration.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    pub luma: VendorConfig,
    pub kling: VendorConfig,
    pub pixverse: VendorConfig,
    /// Ordered chain for the free tier, cost-ascending.
    pub free_chain: Vec<String>,
    /// Ordered chain for the paid tier, quality-first.
    pub paid_chain: Vec<String>,
    /// Per-call timeout for vendor requests.
    pub timeout: Duration,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            luma: VendorConfig::new(None, "https://api.lumalabs.ai"),
            kling: VendorConfig::new(None, "https://api.klingai.com"),
            pixverse: VendorConfig::new(None, "https://app-api.pixverse.ai"),
            free_chain: vec!["pixverse".to_string(), "kling".to_string()],
            paid_chain: vec!["luma".to_string(), "kling".to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProvidersConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            luma: VendorConfig::new(
                std::env::var("LUMA_API_KEY").ok(),
                std::env::var("LUMA_BASE_URL").unwrap_or(defaults.luma.base_url),
            ),
            kling: VendorConfig::new(
                std::env::var("KLING_API_KEY").ok(),
                std::env::var("KLING_BASE_URL").unwrap_or(defaults.kling.base_url),
            ),
            pixverse: VendorConfig::new(
                std::env::var("PIXVERSE_API_KEY").ok(),
                std::env::var("PIXVERSE_BASE_URL").unwrap_or(defaults.pixverse.base_url),
            ),
            free_chain: chain_from_env("FREE_PROVIDER_CHAIN", defaults.free_chain),
            paid_chain: chain_from_env("PAID_PROVIDER_CHAIN", defaults.paid_chain),
            timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT.as_secs()),
            ),
        }
    }

    /// Ordered provider names for a tier.
    pub fn chain_for(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Free => &self.free_chain,
            Tier::Paid => &self.paid_chain,
        }
    }
}

fn chain_from_env(var: &str, default: Vec<String>) -> Vec<String> {
    match std::env::var(var) {
        Ok(s) => {
            let chain: Vec<String> = s
                .split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            if chain.is_empty() {
                default
            } else {
                chain
            }
        }
        Err(_) => default,
    }
}
