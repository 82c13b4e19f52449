//! Text embedding
//!
//! The shipped model is Harmonic Token Projection (HTP), a deterministic,
//! training-free embedding method based on:
//! "Harmonic Token Projection: A Vocabulary-Free, Training-Free,
//!  Deterministic, and Reversible Embedding Methodology"
//! https://arxiv.org/html/2511.20665
//!
//! Key properties:
//! - No neural network, no model files
//! - Deterministic (same input → same output, across processes)
//! - Unicode-based (multilingual support)
//! - Fast enough to embed every line of a corpus on demand
//!
//! The [`Embedder`] trait is the seam between the engine and the model:
//! cached vectors are only comparable to vectors from the embedder whose
//! name and dimension they were stamped with.

use std::f64::consts::PI;

use thiserror::Error;

/// Embedding dimension (2 * number of coprime moduli)
/// Using 192 moduli → 384 dimensions (matching common transformer dims)
pub const EMBEDDING_DIM: usize = 384;

/// Number of coprime moduli for harmonic projection
const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Maximum token length (Unicode code points)
const MAX_TOKEN_LENGTH: usize = 64;

/// Coprime moduli for modular decomposition
/// Using first NUM_MODULI primes for guaranteed coprimality
static COPRIME_MODULI: &[u64] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181,
];

/// Embedding failure, propagated unchanged through rebuilds and queries.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding failed: {reason}")]
    Failed { reason: String },
}

/// Text → fixed-length vector.
///
/// Implementations must be deterministic for a fixed model and input, and
/// total over arbitrary input including the empty string. `name` and
/// `dimension` identify the vector space; they are stamped into the
/// persisted cache and checked on load.
pub trait Embedder {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embed several texts in order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// HTP embedding model
pub struct HtpEmbedder {
    moduli: &'static [u64],
}

impl HtpEmbedder {
    pub fn new() -> Self {
        Self {
            moduli: &COPRIME_MODULI[..NUM_MODULI],
        }
    }

    /// Embed a single token using harmonic projection
    ///
    /// Steps:
    /// 1. Encode the token's code points as a base-2^16 integer N
    /// 2. For each modulus m_i, compute r_i = N mod m_i
    /// 3. Project to unit circle: E_i = [sin(2πr_i/m_i), cos(2πr_i/m_i)]
    fn embed_token(&self, token: &str) -> Vec<f64> {
        let n = token_to_integer(token);

        let mut embedding = Vec::with_capacity(EMBEDDING_DIM);
        for &m in self.moduli {
            let r = n % m;
            let theta = 2.0 * PI * (r as f64) / (m as f64);
            embedding.push(theta.sin());
            embedding.push(theta.cos());
        }

        embedding
    }
}

impl Default for HtpEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HtpEmbedder {
    fn name(&self) -> &str {
        "htp-384"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Tokenize, embed each token, mean-pool, L2-normalize.
    ///
    /// Text with no tokens (empty or all whitespace/punctuation) embeds to
    /// the zero vector; cosine against it is 0 everywhere.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let tokens = tokenize(text);

        if tokens.is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        let mut sum = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            let token_emb = self.embed_token(token);
            for (acc, val) in sum.iter_mut().zip(token_emb.iter()) {
                *acc += val;
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum {
            *val /= count;
        }

        let norm: f64 = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        let embedding: Vec<f32> = if norm > 0.0 {
            sum.iter().map(|x| (*x / norm) as f32).collect()
        } else {
            sum.iter().map(|x| *x as f32).collect()
        };

        Ok(embedding)
    }
}

/// Convert a token to its integer representation
///
/// N = Σ u_j * B^(L-j) where B = 2^16, with wrapping arithmetic on overflow
fn token_to_integer(token: &str) -> u64 {
    let mut n: u64 = 0;
    for c in token.chars().take(MAX_TOKEN_LENGTH) {
        n = n.wrapping_mul(65536).wrapping_add(c as u64);
    }
    n
}

/// Simple tokenization
///
/// Splits on whitespace and ASCII punctuation, normalizes to lowercase
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Cosine similarity between two embeddings
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_across_instances() {
        let a = HtpEmbedder::new();
        let b = HtpEmbedder::new();

        let text = "deterministic embeddings need no model files";
        assert_eq!(a.embed(text).unwrap(), b.embed(text).unwrap());
    }

    #[test]
    fn test_dimension_and_normalization() {
        let model = HtpEmbedder::new();

        let emb = model.embed("hello world").unwrap();
        assert_eq!(emb.len(), EMBEDDING_DIM);
        assert_eq!(emb.len(), model.dimension());

        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let model = HtpEmbedder::new();

        for text in ["", "   ", "\t"] {
            let emb = model.embed(text).unwrap();
            assert_eq!(emb.len(), EMBEDDING_DIM);
            assert!(emb.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_token_order_does_not_matter() {
        // Mean pooling over a two-token bag is exactly commutative.
        let model = HtpEmbedder::new();

        let ab = model.embed("alpha beta").unwrap();
        let ba = model.embed("beta alpha").unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_different_text_different_vector() {
        let model = HtpEmbedder::new();

        let a = model.embed("storage engine internals").unwrap();
        let b = model.embed("sourdough starter feeding").unwrap();
        assert_ne!(a, b);
        assert!(cosine_similarity(&a, &b) < 1.0 - 1e-6);
    }

    #[test]
    fn test_multilingual_input() {
        let model = HtpEmbedder::new();

        let ko = model.embed("한국어 테스트").unwrap();
        let en = model.embed("Korean test").unwrap();
        assert_eq!(ko.len(), EMBEDDING_DIM);
        assert_eq!(en.len(), EMBEDDING_DIM);

        let norm: f32 = ko.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_embed_batch_preserves_order() {
        let model = HtpEmbedder::new();

        let batch = model.embed_batch(&["first line", "second line"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], model.embed("first line").unwrap());
        assert_eq!(batch[1], model.embed("second line").unwrap());
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        let a = vec![1.0, 0.0];
        let zero = vec![0.0, 0.0];
        let longer = vec![1.0, 0.0, 0.0];

        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&a, &longer), 0.0);
    }
}
