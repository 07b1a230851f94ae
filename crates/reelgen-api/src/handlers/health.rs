//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use reelgen_models::Tier;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    /// Provider names with configured credentials, per tier chain.
    pub providers: ProviderReadiness,
}

#[derive(Serialize)]
pub struct ProviderReadiness {
    pub free_chain: Vec<String>,
    pub paid_chain: Vec<String>,
}

/// Readiness check endpoint (readiness probe).
///
/// Reports which providers in each chain are actually usable. Vendors are
/// not contacted; this only reflects configuration.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let configured = |tier: Tier| -> Vec<String> {
        state
            .providers
            .chain_for(tier)
            .iter()
            .filter(|name| {
                state
                    .providers
                    .adapter(name)
                    .map(|a| a.is_configured())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    };

    let free_chain = configured(Tier::Free);
    let paid_chain = configured(Tier::Paid);
    let any_configured = !free_chain.is_empty() || !paid_chain.is_empty();

    Json(ReadinessResponse {
        status: if any_configured { "ready" } else { "degraded" }.to_string(),
        providers: ProviderReadiness {
            free_chain,
            paid_chain,
        },
    })
}
