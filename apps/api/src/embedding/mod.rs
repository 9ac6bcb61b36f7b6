//! Text embedding backends.
//!
//! - [`bert::BertEmbedder`]: candle BERT encoder (default `all-MiniLM-L6-v2`).
//! - [`StubEmbedder`]: deterministic hashed bag-of-words, no model files required.
//!
//! Backends are created once by `lifecycle::ModelHandles` and shared read-only.

pub mod bert;
mod device;
mod error;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::debug;

pub use error::EmbeddingError;

/// Dimension of [`StubEmbedder`] vectors (matches MiniLM).
pub const STUB_EMBEDDING_DIM: usize = 384;

/// Maps text to a fixed-dimension vector. Implementations must be deterministic and
/// safe to call from several threads at once.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn model_id(&self) -> &str;
}

/// Hashed bag-of-words embedder for local development and tests.
/// Texts sharing vocabulary score higher; unrelated texts approach zero.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dim: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self {
            dim: STUB_EMBEDDING_DIM,
        }
    }
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embedding = vec![0.0_f32; self.dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dim as u64) as usize;
            embedding[bucket] += 1.0;
        }

        debug!(text_len = text.len(), "Generated stub embedding");
        Ok(l2_normalize(embedding))
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

/// Scales a vector to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}

/// Embedders with scripted behavior, shared by the scoring and route tests.
#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use super::{Embedder, EmbeddingError};

    /// Returns preset vectors per exact text; unknown text gets `default`.
    pub struct FixedEmbedder {
        pub vectors: HashMap<String, Vec<f32>>,
        pub default: Vec<f32>,
    }

    impl FixedEmbedder {
        pub fn new(pairs: &[(&str, Vec<f32>)], default: Vec<f32>) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.clone()))
                    .collect(),
                default,
            }
        }
    }

    impl Embedder for FixedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.default.clone()))
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    /// Fails (or panics) whenever the text contains `trigger`; otherwise delegates.
    pub struct FailingEmbedder<E> {
        pub inner: E,
        pub trigger: &'static str,
        pub panic: bool,
    }

    impl<E: Embedder> Embedder for FailingEmbedder<E> {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if text.contains(self.trigger) {
                if self.panic {
                    panic!("embedding backend crashed");
                }
                return Err(EmbeddingError::InferenceFailed {
                    reason: "backend unavailable".to_string(),
                });
            }
            self.inner.embed(text)
        }

        fn model_id(&self) -> &str {
            self.inner.model_id()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_is_deterministic() {
        let embedder = StubEmbedder::default();
        let a = embedder.embed("Rust engineer with Kafka").unwrap();
        let b = embedder.embed("Rust engineer with Kafka").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), STUB_EMBEDDING_DIM);
    }

    #[test]
    fn test_stub_vectors_are_unit_length() {
        let v = StubEmbedder::default().embed("python sql spark").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_stub_is_case_insensitive() {
        let embedder = StubEmbedder::default();
        assert_eq!(
            embedder.embed("PYTHON Sql").unwrap(),
            embedder.embed("python sql").unwrap()
        );
    }

    #[test]
    fn test_stub_empty_text_is_zero_vector() {
        let v = StubEmbedder::default().embed("  ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_l2_normalize_leaves_zero_vector() {
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(l2_normalize(vec![3.0, 4.0]), vec![0.6, 0.8]);
    }
}
