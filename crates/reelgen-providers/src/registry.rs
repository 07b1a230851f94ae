//! Provider registry and fallback chain selection.
//!
//! The registry is a read-only capability table keyed by provider name,
//! built once at startup from [`ProvidersConfig`]. Submission walks the
//! tier's ordered chain: unconfigured providers are skipped without
//! counting as a failure; vendor rejections advance to the next provider;
//! exhaustion surfaces the last attempted provider's error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use reelgen_models::{ProviderTaskId, Tier};

use crate::adapter::{ProviderAdapter, SubmitRequest};
use crate::adapters::{KlingAdapter, LumaAdapter, PixverseAdapter};
use crate::config::ProvidersConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpClient;

/// A job accepted by some provider in the chain.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub provider: String,
    pub task_id: ProviderTaskId,
    pub cost_estimate: u32,
}

/// Read-only table of adapters plus tier-indexed fallback chains.
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    free_chain: Vec<String>,
    paid_chain: Vec<String>,
}

impl ProviderRegistry {
    /// Build the registry from configuration.
    pub fn from_config(config: &ProvidersConfig) -> ProviderResult<Self> {
        let http = HttpClient::new(config.timeout)?;

        let mut adapters: HashMap<String, Arc<dyn ProviderAdapter>> = HashMap::new();
        let luma = Arc::new(LumaAdapter::new(config.luma.clone(), http.clone()));
        let kling = Arc::new(KlingAdapter::new(config.kling.clone(), http.clone()));
        let pixverse = Arc::new(PixverseAdapter::new(config.pixverse.clone(), http));
        adapters.insert(luma.name().to_string(), luma);
        adapters.insert(kling.name().to_string(), kling);
        adapters.insert(pixverse.name().to_string(), pixverse);

        Ok(Self {
            adapters,
            free_chain: config.free_chain.clone(),
            paid_chain: config.paid_chain.clone(),
        })
    }

    /// Build from explicit adapters (tests inject doubles here).
    pub fn with_adapters(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        free_chain: Vec<String>,
        paid_chain: Vec<String>,
    ) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|a| (a.name().to_string(), a))
                .collect(),
            free_chain,
            paid_chain,
        }
    }

    /// Look up an adapter by provider name.
    pub fn adapter(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(name).cloned()
    }

    /// Ordered provider names for a tier.
    pub fn chain_for(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Free => &self.free_chain,
            Tier::Paid => &self.paid_chain,
        }
    }

    /// Walk the tier's chain until a provider accepts the job.
    pub async fn submit_with_fallback(
        &self,
        tier: Tier,
        request: &SubmitRequest,
    ) -> ProviderResult<SubmittedJob> {
        let chain = self.chain_for(tier);
        let mut last_error: Option<(String, ProviderError)> = None;

        for name in chain {
            let adapter = match self.adapter(name) {
                Some(a) => a,
                None => {
                    warn!(provider = %name, "Chain references unknown provider, skipping");
                    continue;
                }
            };

            if !adapter.is_configured() {
                info!(provider = %name, "Provider unconfigured, skipping");
                continue;
            }

            match adapter.submit(request).await {
                Ok(task_id) => {
                    info!(
                        provider = %name,
                        task_id = %task_id,
                        tier = %tier,
                        "Provider accepted generation job"
                    );
                    return Ok(SubmittedJob {
                        provider: name.clone(),
                        task_id,
                        cost_estimate: adapter.cost_estimate(request.duration_seconds),
                    });
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "Provider rejected job, trying next");
                    last_error = Some((name.clone(), e));
                }
            }
        }

        match last_error {
            Some((provider, source)) => Err(ProviderError::AllProvidersFailed {
                provider,
                source: Box::new(source),
            }),
            // Every provider in the chain was unconfigured
            None => Err(ProviderError::Unconfigured {
                provider: chain.last().cloned().unwrap_or_else(|| "none".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::adapter::ProviderPoll;

    /// Scriptable adapter double.
    struct FakeAdapter {
        name: &'static str,
        configured: bool,
        submit_error: Option<fn() -> ProviderError>,
        submits: AtomicU32,
    }

    impl FakeAdapter {
        fn accepting(name: &'static str) -> Self {
            Self {
                name,
                configured: true,
                submit_error: None,
                submits: AtomicU32::new(0),
            }
        }

        fn rejecting(name: &'static str, error: fn() -> ProviderError) -> Self {
            Self {
                name,
                configured: true,
                submit_error: Some(error),
                submits: AtomicU32::new(0),
            }
        }

        fn unconfigured(name: &'static str) -> Self {
            Self {
                name,
                configured: false,
                submit_error: None,
                submits: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for FakeAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn cost_estimate(&self, _duration_seconds: u32) -> u32 {
            1
        }

        async fn submit(&self, _request: &SubmitRequest) -> ProviderResult<ProviderTaskId> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            match self.submit_error {
                Some(make) => Err(make()),
                None => Ok(ProviderTaskId::from_string(format!("{}-task", self.name))),
            }
        }

        async fn poll_status(&self, _task_id: &ProviderTaskId) -> ProviderResult<ProviderPoll> {
            unimplemented!("not used in registry tests")
        }
    }

    fn request() -> SubmitRequest {
        SubmitRequest {
            prompt: "cat playing piano".into(),
            duration_seconds: 5,
            resolution: "720p".into(),
        }
    }

    #[tokio::test]
    async fn test_first_configured_provider_wins() {
        let registry = ProviderRegistry::with_adapters(
            vec![
                Arc::new(FakeAdapter::accepting("pixverse")),
                Arc::new(FakeAdapter::accepting("kling")),
            ],
            vec!["pixverse".into(), "kling".into()],
            vec![],
        );

        let job = registry
            .submit_with_fallback(Tier::Free, &request())
            .await
            .unwrap();
        assert_eq!(job.provider, "pixverse");
        assert_eq!(job.task_id.as_str(), "pixverse-task");
    }

    #[tokio::test]
    async fn test_validation_error_advances_to_secondary() {
        let registry = ProviderRegistry::with_adapters(
            vec![
                Arc::new(FakeAdapter::rejecting("pixverse", || {
                    ProviderError::from_status("pixverse", 422, "unsupported duration")
                })),
                Arc::new(FakeAdapter::accepting("kling")),
            ],
            vec!["pixverse".into(), "kling".into()],
            vec![],
        );

        let job = registry
            .submit_with_fallback(Tier::Free, &request())
            .await
            .unwrap();
        assert_eq!(job.provider, "kling");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_skipped_not_failed() {
        let skipped = Arc::new(FakeAdapter::unconfigured("pixverse"));
        let registry = ProviderRegistry::with_adapters(
            vec![skipped.clone(), Arc::new(FakeAdapter::accepting("kling"))],
            vec!["pixverse".into(), "kling".into()],
            vec![],
        );

        let job = registry
            .submit_with_fallback(Tier::Free, &request())
            .await
            .unwrap();
        assert_eq!(job.provider, "kling");
        assert_eq!(skipped.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_last_provider_error() {
        let registry = ProviderRegistry::with_adapters(
            vec![
                Arc::new(FakeAdapter::rejecting("pixverse", || {
                    ProviderError::from_status("pixverse", 429, "slow down")
                })),
                Arc::new(FakeAdapter::rejecting("kling", || {
                    ProviderError::from_status("kling", 401, "bad key")
                })),
            ],
            vec!["pixverse".into(), "kling".into()],
            vec![],
        );

        let err = registry
            .submit_with_fallback(Tier::Free, &request())
            .await
            .unwrap_err();
        match err {
            ProviderError::AllProvidersFailed { provider, source } => {
                assert_eq!(provider, "kling");
                assert!(matches!(*source, ProviderError::Auth { .. }));
            }
            other => panic!("expected AllProvidersFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fully_unconfigured_chain() {
        let registry = ProviderRegistry::with_adapters(
            vec![
                Arc::new(FakeAdapter::unconfigured("pixverse")),
                Arc::new(FakeAdapter::unconfigured("kling")),
            ],
            vec!["pixverse".into(), "kling".into()],
            vec![],
        );

        let err = registry
            .submit_with_fallback(Tier::Free, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unconfigured { .. }));
    }

    #[tokio::test]
    async fn test_paid_tier_uses_its_own_chain() {
        let registry = ProviderRegistry::with_adapters(
            vec![
                Arc::new(FakeAdapter::accepting("pixverse")),
                Arc::new(FakeAdapter::accepting("luma")),
            ],
            vec!["pixverse".into()],
            vec!["luma".into()],
        );

        let job = registry
            .submit_with_fallback(Tier::Paid, &request())
            .await
            .unwrap();
        assert_eq!(job.provider, "luma");
    }
}
