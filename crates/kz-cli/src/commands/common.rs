//! Shared helpers for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;

use kz_adapter_classical::{ClassicalConfig, ClassicalSampler};
use kz_adapter_cloud::CloudSampler;
use kz_hal::{Sampler, SamplerRegistry};
use kz_sched::Config;

/// Default configuration file (`~/.config/kz/config.yaml` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kz").join("config.yaml"))
}

/// Load configuration from `path`, else from the default location if that
/// file exists, else from defaults. `KZ_*` variables apply in every case.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    let file = match path {
        Some(p) => {
            let p = PathBuf::from(p);
            if !p.exists() {
                anyhow::bail!("Configuration file not found: {}", p.display());
            }
            Some(p)
        }
        None => default_config_path().filter(|p| p.exists()),
    };
    Config::load(file.as_deref())
        .with_context(|| format!("Failed to load configuration{}", describe(file.as_deref())))
}

fn describe(path: Option<&Path>) -> String {
    path.map(|p| format!(" from {}", p.display()))
        .unwrap_or_default()
}

/// Build the sampler registry: cloud solvers first, then the classical
/// sampler. An unreachable cloud is reported and skipped.
pub async fn create_registry(config: &Config) -> SamplerRegistry {
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
                    registry.register(Arc::new(sampler));
                }
            }
            Err(e) => {
                eprintln!(
                    "{} Cloud samplers unavailable: {}",
                    style("!").yellow().bold(),
                    e
                );
            }
        }
    }

    if config.use_classical {
        registry.register(Arc::new(ClassicalSampler::with_config(ClassicalConfig {
            name: config.classical_name.clone(),
            ..ClassicalConfig::default()
        })));
    }

    registry
}

/// Look up a sampler by name, or take the first registered one.
pub fn pick_sampler(registry: &SamplerRegistry, name: Option<&str>) -> Result<Arc<dyn Sampler>> {
    match name {
        Some(name) => registry.get(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown sampler: '{name}'. Available: {}",
                registry.names().join(", ")
            )
        }),
        None => registry
            .iter()
            .next()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No sampler available")),
    }
}
