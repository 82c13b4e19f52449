//! Similarity ranking
//!
//! A query is embedded once and scored against every cached document; a
//! document's score is the best cosine similarity among its line segments.
//! This is an exact linear scan, O(documents × segments) vector
//! comparisons, sized for a personal corpus rather than an index structure.

use super::cache::EmbeddingCache;
use super::embedding::{cosine_similarity, EmbedError, Embedder};

/// One ranked entry: a cached document and its best-segment similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentScore {
    pub path: String,
    pub score: f32,
}

/// Rank `paths` against `query`.
///
/// Paths absent from the cache are skipped entirely rather than scored as
/// zero. A cached document with no segment vectors scores 0. The result is
/// ordered by score descending; equal scores order by path ascending, so
/// the ranking is deterministic for a fixed cache and query.
pub fn rank(
    embedder: &dyn Embedder,
    query: &str,
    paths: &[String],
    cache: &EmbeddingCache,
) -> Result<Vec<DocumentScore>, EmbedError> {
    let query_vec = embedder.embed(query)?;

    let mut results = Vec::new();
    for path in paths {
        let Some(vectors) = cache.lookup(path) else {
            continue;
        };

        let mut best: Option<f32> = None;
        for vector in vectors {
            let score = cosine_similarity(&query_vec, vector);
            if best.map_or(true, |b| score > b) {
                best = Some(score);
            }
        }

        results.push(DocumentScore {
            path: path.clone(),
            score: best.unwrap_or(0.0),
        });
    }

    // IEEE total order keeps the comparator total even if a tampered
    // cache produces a non-finite score.
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.path.cmp(&b.path)));

    Ok(results)
}
