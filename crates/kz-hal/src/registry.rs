//! Sampler registry.
//!
//! The [`SamplerRegistry`] maps sampler names to live sampler handles. An
//! empty registry is the "no solver" configuration: the dashboard still
//! starts, but every submission is refused.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::sampler::Sampler;

/// Central registry of available samplers.
#[derive(Default, Clone)]
pub struct SamplerRegistry {
    /// Samplers keyed by name.
    samplers: FxHashMap<String, Arc<dyn Sampler>>,
    /// Registration order, used for listing and for the default choice.
    order: Vec<String>,
}

impl SamplerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sampler under its own name. Re-registering replaces the
    /// previous handle but keeps its position.
    pub fn register(&mut self, sampler: Arc<dyn Sampler>) {
        let name = sampler.name().to_string();
        debug!("Registering sampler: {}", name);
        if self.samplers.insert(name.clone(), sampler).is_none() {
            self.order.push(name);
        }
    }

    /// Look up a sampler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Sampler>> {
        self.samplers.get(name).cloned()
    }

    /// Look up a sampler by name, failing if it is not registered.
    pub fn require(&self, name: &str) -> HalResult<Arc<dyn Sampler>> {
        self.get(name)
            .ok_or_else(|| HalError::SamplerUnavailable(name.to_string()))
    }

    /// Names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Samplers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Sampler>> {
        self.order.iter().filter_map(|n| self.samplers.get(n))
    }

    /// Number of registered samplers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no sampler is available.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Name of the first registered sampler.
    pub fn default_name(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    /// The first classical sampler, if any.
    pub fn classical(&self) -> Option<Arc<dyn Sampler>> {
        self.iter().find(|s| s.is_classical()).cloned()
    }
}

impl std::fmt::Debug for SamplerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerRegistry")
            .field("samplers", &self.order)
            .finish()
    }
}
