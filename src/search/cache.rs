//! Embedding cache
//!
//! The persisted cache is a single JSON document:
//!
//! ```json
//! {
//!   "model": "htp-384",
//!   "dimension": 384,
//!   "built_at": "2026-08-22T12:34:56Z",
//!   "documents": { "<path>": [[...], ...] }
//! }
//! ```
//!
//! `documents` maps document path → one vector per line segment, in segment
//! order. `model` and `dimension` stamp the vector space; a cache built with
//! a different embedder is rejected on load, as is a stored vector whose
//! length contradicts the stamp. Vector components are `f32` written as
//! JSON decimal text, which round-trips exactly.
//!
//! Rebuilds are all-or-nothing: any unreadable document or embedding failure
//! aborts before anything is written, and the write itself goes through a
//! temp file + rename so a previously-valid cache file survives a failure
//! mid-write.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::embedding::{EmbedError, Embedder};
use super::segment;

/// Errors from cache persistence and rebuilds.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot read document {path}: {source}")]
    DocumentRead { path: String, source: io::Error },

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("malformed cache file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cache was built with model '{found}', active model is '{expected}'")]
    ModelMismatch { expected: String, found: String },

    #[error("cache vector dimension is {found}, active model produces {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// In-memory cache: the deserialized form of the persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingCache {
    pub model: String,
    pub dimension: usize,
    pub built_at: DateTime<Utc>,
    documents: HashMap<String, Vec<Vec<f32>>>,
}

impl EmbeddingCache {
    /// A cache with no documents, stamped for the given embedder.
    pub fn empty(model: &str, dimension: usize) -> Self {
        Self {
            model: model.to_string(),
            dimension,
            built_at: Utc::now(),
            documents: HashMap::new(),
        }
    }

    /// Segment vectors for a document, or None if the document is not
    /// cached. Uncached documents are excluded from ranking, never scored
    /// as zero.
    pub fn lookup(&self, path: &str) -> Option<&[Vec<f32>]> {
        self.documents.get(path).map(|vectors| vectors.as_slice())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn segment_count(&self) -> usize {
        self.documents.values().map(|vectors| vectors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Rebuilds fill a fresh cache with this; the working copy held by a
    /// session is never patched in place.
    pub(crate) fn insert(&mut self, path: String, vectors: Vec<Vec<f32>>) {
        self.documents.insert(path, vectors);
    }
}

/// Statistics from a completed rebuild.
#[derive(Debug)]
pub struct RebuildStats {
    pub documents: usize,
    pub segments: usize,
    pub duration_ms: u128,
}

/// Owns the on-disk cache file.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted cache into memory.
    ///
    /// A missing file is an empty cache, not an error. A file that does not
    /// parse, that was built with a different model name or vector
    /// dimension, or that holds a vector whose length contradicts the
    /// stamped dimension, is an error; the caller decides whether that is
    /// fatal or just means "rebuild needed".
    pub fn load(&self, model: &str, dimension: usize) -> Result<EmbeddingCache, CacheError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no cache file, starting empty");
                return Ok(EmbeddingCache::empty(model, dimension));
            }
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let cache: EmbeddingCache = serde_json::from_reader(reader)?;

        if cache.model != model {
            return Err(CacheError::ModelMismatch {
                expected: model.to_string(),
                found: cache.model,
            });
        }
        if cache.dimension != dimension {
            return Err(CacheError::DimensionMismatch {
                expected: dimension,
                found: cache.dimension,
            });
        }
        // The stamp alone does not vouch for the vectors; a hand-edited
        // file can hold wrong-arity entries under a correct header.
        for vectors in cache.documents.values() {
            for vector in vectors {
                if vector.len() != dimension {
                    return Err(CacheError::DimensionMismatch {
                        expected: dimension,
                        found: vector.len(),
                    });
                }
            }
        }

        tracing::debug!(
            documents = cache.document_count(),
            segments = cache.segment_count(),
            "cache loaded"
        );
        Ok(cache)
    }

    /// Embed every document and overwrite the persisted cache wholesale.
    ///
    /// The in-memory working copy is untouched; callers load the fresh
    /// cache from disk after this returns. Any unreadable document or
    /// embedding failure aborts the rebuild before the file is replaced.
    pub fn rebuild(
        &self,
        embedder: &dyn Embedder,
        paths: &[String],
    ) -> Result<RebuildStats, CacheError> {
        let start = Instant::now();

        let mut cache = EmbeddingCache::empty(embedder.name(), embedder.dimension());
        let mut segments = 0usize;

        for path in paths {
            let content = fs::read_to_string(path).map_err(|source| CacheError::DocumentRead {
                path: path.clone(),
                source,
            })?;
            let lines = segment::split(&content);
            let vectors = embedder.embed_batch(&lines)?;
            segments += vectors.len();
            cache.insert(path.clone(), vectors);
        }

        cache.built_at = Utc::now();
        self.save(&cache)?;

        let stats = RebuildStats {
            documents: cache.document_count(),
            segments,
            duration_ms: start.elapsed().as_millis(),
        };
        tracing::debug!(
            documents = stats.documents,
            segments = stats.segments,
            duration_ms = stats.duration_ms,
            "cache rebuilt"
        );
        Ok(stats)
    }

    /// Atomic write: temp file -> flush -> sync -> rename.
    fn save(&self, cache: &EmbeddingCache) -> Result<(), CacheError> {
        let temp_path = self.path.with_extension("tmp");

        if let Err(e) = write_cache_file(&temp_path, cache) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

fn write_cache_file(path: &Path, cache: &EmbeddingCache) -> Result<(), CacheError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, cache)?;
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::embedding::{cosine_similarity, HtpEmbedder};

    struct ToyEmbedder {
        name: &'static str,
        dim: usize,
    }

    impl Embedder for ToyEmbedder {
        fn name(&self) -> &str {
            self.name
        }

        fn dimension(&self) -> usize {
            self.dim
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            let mut v = vec![0.0; self.dim];
            v[text.len() % self.dim] = 1.0;
            Ok(v)
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_rebuild_stores_one_vector_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let model = HtpEmbedder::new();
        let store = CacheStore::new(dir.path().join("cache.json"));

        let three = write_file(dir.path(), "three.txt", "one\ntwo\nthree");
        let trailing = write_file(dir.path(), "trailing.txt", "alpha\n");
        let empty = write_file(dir.path(), "empty.txt", "");
        let paths = vec![three.clone(), trailing.clone(), empty.clone()];

        let stats = store.rebuild(&model, &paths).unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.segments, 3 + 2 + 1);

        let cache = store.load(model.name(), model.dimension()).unwrap();
        assert_eq!(cache.lookup(&three).unwrap().len(), 3);
        assert_eq!(cache.lookup(&trailing).unwrap().len(), 2);
        // An empty file still has exactly one (empty) segment.
        assert_eq!(cache.lookup(&empty).unwrap().len(), 1);
    }

    #[test]
    fn test_round_trip_preserves_similarities() {
        let dir = tempfile::tempdir().unwrap();
        let model = HtpEmbedder::new();
        let store = CacheStore::new(dir.path().join("cache.json"));

        let doc = write_file(dir.path(), "doc.txt", "embedding cache store\nresult pagination");
        store.rebuild(&model, &[doc.clone()]).unwrap();

        let cache = store.load(model.name(), model.dimension()).unwrap();
        let cached = cache.lookup(&doc).unwrap();
        let query = model.embed("cache store").unwrap();

        let fresh = [
            model.embed("embedding cache store").unwrap(),
            model.embed("result pagination").unwrap(),
        ];
        for (cached_vec, fresh_vec) in cached.iter().zip(fresh.iter()) {
            assert_eq!(cached_vec.len(), fresh_vec.len());
            let diff = cosine_similarity(&query, cached_vec) - cosine_similarity(&query, fresh_vec);
            assert!(diff.abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_file_loads_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("absent.json"));

        let cache = store.load("htp-384", 384).unwrap();
        assert!(cache.is_empty());
        assert!(!store.exists());
    }

    #[test]
    fn test_rebuild_with_no_documents_writes_empty_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = ToyEmbedder { name: "toy", dim: 4 };
        let store = CacheStore::new(dir.path().join("cache.json"));

        let stats = store.rebuild(&model, &[]).unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.segments, 0);

        // Distinct from "no file": the empty cache exists on disk.
        assert!(store.exists());
        let cache = store.load("toy", 4).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_cache_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json at all {").unwrap();

        let store = CacheStore::new(path);
        match store.load("toy", 4) {
            Err(CacheError::Malformed(_)) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_model_and_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let model = ToyEmbedder { name: "toy", dim: 4 };
        let store = CacheStore::new(dir.path().join("cache.json"));

        let doc = write_file(dir.path(), "doc.txt", "line");
        store.rebuild(&model, &[doc]).unwrap();

        match store.load("other-model", 4) {
            Err(CacheError::ModelMismatch { expected, found }) => {
                assert_eq!(expected, "other-model");
                assert_eq!(found, "toy");
            }
            other => panic!("expected ModelMismatch, got {other:?}"),
        }

        match store.load("toy", 8) {
            Err(CacheError::DimensionMismatch { expected, found }) => {
                assert_eq!(expected, 8);
                assert_eq!(found, 4);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_arity_vector_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        // Correct header, but the stored vector is a float short.
        fs::write(
            &path,
            r#"{"model":"toy","dimension":4,"built_at":"2026-08-22T00:00:00Z","documents":{"doc.txt":[[1.0,0.0,0.0]]}}"#,
        )
        .unwrap();

        let store = CacheStore::new(path);
        match store.load("toy", 4) {
            Err(CacheError::DimensionMismatch { expected, found }) => {
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_document_aborts_and_keeps_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let model = ToyEmbedder { name: "toy", dim: 4 };
        let store = CacheStore::new(dir.path().join("cache.json"));

        let good = write_file(dir.path(), "good.txt", "kept line");
        store.rebuild(&model, &[good.clone()]).unwrap();

        let missing = dir.path().join("missing.txt").to_string_lossy().into_owned();
        let err = store.rebuild(&model, &[good.clone(), missing]).unwrap_err();
        match err {
            CacheError::DocumentRead { ref path, .. } => assert!(path.ends_with("missing.txt")),
            other => panic!("expected DocumentRead, got {other:?}"),
        }

        // All-or-nothing: the previous cache file is still the valid one.
        let cache = store.load("toy", 4).unwrap();
        assert_eq!(cache.document_count(), 1);
        assert!(cache.contains(&good));
    }

    #[test]
    fn test_no_temp_file_left_after_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let model = ToyEmbedder { name: "toy", dim: 4 };
        let store = CacheStore::new(dir.path().join("cache.json"));

        let doc = write_file(dir.path(), "doc.txt", "line");
        store.rebuild(&model, &[doc]).unwrap();

        assert!(store.exists());
        assert!(!dir.path().join("cache.tmp").exists());
    }
}
