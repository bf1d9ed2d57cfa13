//! Persistence layer for embedding caches.
//!
//! Each sampler owns one cache; repositories load and save it by sampler
//! name. The session never reads embedding files itself.

mod json_store;
mod memory;

pub use json_store::JsonEmbeddingStore;
pub use memory::MemoryEmbeddingStore;

use async_trait::async_trait;

use crate::embedding::EmbeddingCache;
use crate::error::SchedResult;

/// Trait for embedding-cache storage.
#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    /// Load the cache for a sampler. A sampler without stored embeddings
    /// yields an empty cache.
    async fn load(&self, sampler_name: &str) -> SchedResult<EmbeddingCache>;

    /// Replace the stored cache for a sampler.
    async fn save(&self, sampler_name: &str, cache: &EmbeddingCache) -> SchedResult<()>;
}
