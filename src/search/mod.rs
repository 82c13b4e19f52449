//! Semantic search over cached line embeddings
//!
//! Documents are split into line segments, each segment is embedded once
//! during a rebuild, and queries rank documents by their best-segment
//! cosine similarity. The cache is a JSON file owned by [`CacheStore`];
//! a [`SearchSession`] ties the embedder, store, and working cache
//! together for the lifetime of one run.

pub mod cache;
pub mod embedding;
pub mod engine;
pub mod pager;
pub mod ranker;
pub mod segment;

pub use cache::{CacheError, CacheStore, EmbeddingCache, RebuildStats};
pub use embedding::{cosine_similarity, Embedder, HtpEmbedder, EMBEDDING_DIM};
pub use engine::SearchSession;
pub use pager::{PageView, ResultPager};
pub use ranker::{rank, DocumentScore};

/// Default on-disk cache location, relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = ".docsim_embeddings.json";

/// Default number of results shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 5;
