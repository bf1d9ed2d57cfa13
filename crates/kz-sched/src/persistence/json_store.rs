//! JSON file-based embedding store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::embedding::EmbeddingCache;
use crate::error::{SchedError, SchedResult};
use crate::persistence::EmbeddingRepository;

/// Stores each sampler's cache as `emb_<sampler>.json` in one directory.
///
/// Characters outside `[A-Za-z0-9._-]` in the sampler name are replaced by
/// `_` in the file name.
#[derive(Debug, Clone)]
pub struct JsonEmbeddingStore {
    /// Base directory for storage.
    base_dir: PathBuf,
}

impl JsonEmbeddingStore {
    /// Create a store rooted at `base_dir`, creating the directory.
    pub async fn new(base_dir: impl AsRef<Path>) -> SchedResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    /// Directory holding the embedding files.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File backing a sampler's cache.
    pub fn cache_path(&self, sampler_name: &str) -> PathBuf {
        let safe: String = sampler_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("emb_{safe}.json"))
    }
}

#[async_trait]
impl EmbeddingRepository for JsonEmbeddingStore {
    async fn load(&self, sampler_name: &str) -> SchedResult<EmbeddingCache> {
        let path = self.cache_path(sampler_name);
        match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<EmbeddingCache>(&content) {
                Ok(cache) => {
                    debug!("Loaded {} embeddings from {:?}", cache.len(), path);
                    Ok(cache)
                }
                Err(e) => {
                    warn!("Failed to parse embedding file {:?}: {}", path, e);
                    Ok(EmbeddingCache::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EmbeddingCache::new()),
            Err(e) => Err(SchedError::Io(e)),
        }
    }

    async fn save(&self, sampler_name: &str, cache: &EmbeddingCache) -> SchedResult<()> {
        let path = self.cache_path(sampler_name);
        let json = serde_json::to_string_pretty(cache)?;
        fs::write(&path, json).await?;
        debug!("Saved {} embeddings to {:?}", cache.len(), path);
        Ok(())
    }
}
