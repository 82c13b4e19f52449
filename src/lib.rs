//! docsim library
//!
//! Local semantic document search: line-level embeddings, a persisted
//! JSON cache, and exact cosine ranking over a glob-configured file set.
//!
//! # Modules
//!
//! - `core`: pattern configuration and file-set resolution
//! - `search`: embedding, cache store, ranking, pagination, session

pub mod core;
pub mod search;

// Re-exports for convenience
pub use crate::core::config::{ConfigError, PatternConfig};
pub use crate::search::cache::{CacheError, CacheStore, EmbeddingCache, RebuildStats};
pub use crate::search::embedding::{cosine_similarity, Embedder, HtpEmbedder};
pub use crate::search::engine::SearchSession;
pub use crate::search::pager::ResultPager;
pub use crate::search::ranker::DocumentScore;
