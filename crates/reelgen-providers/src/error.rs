//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur talking to a video generation vendor.
///
/// Auth, rate-limit and validation failures are fatal for the attempt and
/// advance the fallback chain. Only network failures and timeouts are
/// transient: a poll that hits one leaves the task state untouched.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: authentication rejected (HTTP {status}): {snippet}")]
    Auth {
        provider: String,
        status: u16,
        snippet: String,
    },

    #[error("{provider}: rate limited (HTTP {status}): {snippet}")]
    RateLimited {
        provider: String,
        status: u16,
        snippet: String,
    },

    #[error("{provider}: request rejected (HTTP {status}): {snippet}")]
    Validation {
        provider: String,
        status: u16,
        snippet: String,
    },

    #[error("{provider}: API error (HTTP {status}): {snippet}")]
    Api {
        provider: String,
        status: u16,
        snippet: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider}: request timed out")]
    Timeout { provider: String },

    #[error("{provider}: invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("{provider}: generation finished but no result URL in any known response path")]
    ResultNotFound { provider: String },

    #[error("{provider}: no credentials configured")]
    Unconfigured { provider: String },

    #[error("All providers failed, last attempted '{provider}': {source}")]
    AllProvidersFailed {
        provider: String,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to the matching error variant.
    pub fn from_status(provider: impl Into<String>, status: u16, snippet: impl Into<String>) -> Self {
        let provider = provider.into();
        let snippet = snippet.into();
        match status {
            401 | 403 => Self::Auth {
                provider,
                status,
                snippet,
            },
            429 => Self::RateLimited {
                provider,
                status,
                snippet,
            },
            422 => Self::Validation {
                provider,
                status,
                snippet,
            },
            _ => Self::Api {
                provider,
                status,
                snippet,
            },
        }
    }

    /// True for errors the caller should retry on the next poll interval.
    /// Vendor rejections are not transient: they either fail the attempt
    /// (submit path) or the task (poll path).
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } => true,
            ProviderError::Network(e) => {
                // reqwest reports client-side timeouts as a connect/request error
                e.is_timeout() || e.is_connect() || e.is_request()
            }
            _ => false,
        }
    }
}
