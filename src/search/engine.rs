//! Search session - combines the embedder, the cache store, and the
//! in-memory cache behind one handle
//!
//! There is no process-wide state: every operation goes through an
//! explicitly constructed session that owns all three parts.

use std::path::PathBuf;

use super::cache::{CacheError, CacheStore, EmbeddingCache, RebuildStats};
use super::embedding::{EmbedError, Embedder};
use super::ranker::{self, DocumentScore};

/// One user session over one cache file and one embedding model.
pub struct SearchSession<E: Embedder> {
    embedder: E,
    store: CacheStore,
    cache: EmbeddingCache,
}

impl<E: Embedder> SearchSession<E> {
    /// Open a session, loading the persisted cache if it is usable.
    ///
    /// A cache file that does not parse, or whose model or vector
    /// dimension does not match the active embedder, degrades to an empty
    /// working cache with a warning; the next rebuild replaces it. I/O
    /// failures other than not-found are errors.
    pub fn open(embedder: E, cache_path: PathBuf) -> Result<Self, CacheError> {
        let store = CacheStore::new(cache_path);
        let cache = match store.load(embedder.name(), embedder.dimension()) {
            Ok(cache) => cache,
            Err(CacheError::Malformed(e)) => {
                tracing::warn!("cache file unusable ({e}); starting empty, rebuild to repair");
                EmbeddingCache::empty(embedder.name(), embedder.dimension())
            }
            Err(e @ (CacheError::ModelMismatch { .. } | CacheError::DimensionMismatch { .. })) => {
                tracing::warn!("{e}; starting empty, rebuild to repair");
                EmbeddingCache::empty(embedder.name(), embedder.dimension())
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            embedder,
            store,
            cache,
        })
    }

    /// Rebuild the persisted cache from `paths`, then reload it from disk.
    ///
    /// The working cache is replaced only after the rebuild fully
    /// completes; a failed rebuild leaves both the previous cache file and
    /// the working copy exactly as they were.
    pub fn rebuild(&mut self, paths: &[String]) -> Result<RebuildStats, CacheError> {
        let stats = self.store.rebuild(&self.embedder, paths)?;
        self.cache = self
            .store
            .load(self.embedder.name(), self.embedder.dimension())?;
        Ok(stats)
    }

    /// Rank `paths` against a free-text query using the working cache.
    pub fn query(&self, text: &str, paths: &[String]) -> Result<Vec<DocumentScore>, EmbedError> {
        ranker::rank(&self.embedder, text, paths, &self.cache)
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn has_embeddings(&self) -> bool {
        !self.cache.is_empty()
    }
}
