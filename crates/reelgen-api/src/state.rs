//! Application state.

use std::sync::Arc;

use reelgen_providers::{ProviderRegistry, ProvidersConfig};
use reelgen_store::{GenerationStore, MemoryStore};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::services::GenerationService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn GenerationStore>,
    pub providers: Arc<ProviderRegistry>,
    pub generations: GenerationService,
}

impl AppState {
    /// Create application state from environment configuration.
    pub fn from_env(config: ApiConfig) -> Result<Self, ApiError> {
        let providers = ProviderRegistry::from_config(&ProvidersConfig::from_env())
            .map_err(|e| ApiError::internal(format!("provider setup failed: {}", e)))?;
        let store: Arc<dyn GenerationStore> = Arc::new(MemoryStore::new());
        Ok(Self::new(config, store, Arc::new(providers)))
    }

    /// Create application state with explicit collaborators (tests inject
    /// seeded stores and mock-backed registries here).
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn GenerationStore>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        let generations = GenerationService::new(
            Arc::clone(&store),
            Arc::clone(&providers),
            config.quota.clone(),
        );
        Self {
            config,
            store,
            providers,
            generations,
        }
    }
}
