//! In-memory embedding store.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::embedding::EmbeddingCache;
use crate::error::SchedResult;
use crate::persistence::EmbeddingRepository;

/// Keeps caches in memory. Used for tests and for runs without a data
/// directory.
#[derive(Debug, Default)]
pub struct MemoryEmbeddingStore {
    caches: RwLock<FxHashMap<String, EmbeddingCache>>,
}

impl MemoryEmbeddingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one sampler's cache.
    pub fn with_cache(sampler_name: impl Into<String>, cache: EmbeddingCache) -> Self {
        let mut caches = FxHashMap::default();
        caches.insert(sampler_name.into(), cache);
        Self {
            caches: RwLock::new(caches),
        }
    }
}

#[async_trait]
impl EmbeddingRepository for MemoryEmbeddingStore {
    async fn load(&self, sampler_name: &str) -> SchedResult<EmbeddingCache> {
        Ok(self
            .caches
            .read()
            .await
            .get(sampler_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, sampler_name: &str, cache: &EmbeddingCache) -> SchedResult<()> {
        self.caches
            .write()
            .await
            .insert(sampler_name.to_string(), cache.clone());
        Ok(())
    }
}
