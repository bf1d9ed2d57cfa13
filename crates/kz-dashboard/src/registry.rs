//! Sampler discovery at start-up.

use std::sync::Arc;
use std::time::Duration;

use kz_adapter_classical::{ClassicalConfig, ClassicalSampler};
use kz_adapter_cloud::CloudSampler;
use kz_hal::SamplerRegistry;
use kz_sched::Config;
use tracing::{info, warn};

/// Build the sampler registry from configuration.
///
/// Cloud solvers come first so that the default choice is a quantum
/// annealer whenever one is reachable. Failing to reach the cloud leaves
/// only the classical sampler; with that disabled too, the registry is
/// empty and the session starts without a solver.
pub async fn build_registry(config: &Config) -> SamplerRegistry {
    let mut registry = SamplerRegistry::new();

    if let (Some(endpoint), Some(token)) = (&config.cloud.endpoint, &config.cloud.token) {
        match CloudSampler::connect(
            endpoint,
            token,
            config.cloud.fast_anneal_range_us,
            Duration::from_secs(config.cloud.timeout_secs),
        )
        .await
        {
            Ok(samplers) => {
                for sampler in samplers {
                    info!("Registered cloud sampler {}", sampler.solver_id());
                    registry.register(Arc::new(sampler));
                }
            }
            Err(e) => warn!("Cloud samplers unavailable: {}", e),
        }
    }

    if config.use_classical {
        let sampler = ClassicalSampler::with_config(ClassicalConfig {
            name: config.classical_name.clone(),
            ..ClassicalConfig::default()
        });
        info!("Registered classical sampler {}", sampler.config().name);
        registry.register(Arc::new(sampler));
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_classical_only_by_default() {
        let registry = build_registry(&Config::default()).await;
        assert_eq!(registry.names(), ["Diffusion [Classical]".to_string()]);
        assert!(registry.classical().is_some());
    }

    #[tokio::test]
    async fn test_no_samplers() {
        let config = Config {
            use_classical: false,
            ..Config::default()
        };
        assert!(build_registry(&config).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_cloud_degrades_to_classical() {
        let mut config = Config::default();
        config.cloud.endpoint = Some("http://127.0.0.1:9/sapi".to_string());
        config.cloud.token = Some("token".to_string());
        config.cloud.timeout_secs = 1;
        let registry = build_registry(&config).await;
        assert_eq!(registry.len(), 1);
        assert!(registry.classical().is_some());
    }
}
