//! Semantic similarity between two texts, degrading to `Signal::Unavailable`
//! instead of failing.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::embedding::{Embedder, EmbeddingError};

/// Outcome of a similarity estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Cosine similarity clamped to `[0, 1]`.
    Value(f32),
    /// Embedding failed; callers substitute their own default.
    Unavailable,
}

impl Signal {
    pub fn or_zero(self) -> f32 {
        match self {
            Signal::Value(v) => v,
            Signal::Unavailable => 0.0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Signal::Value(_))
    }
}

/// Cosine similarity of two vectors in `[-1, 1]`.
///
/// `None` for empty or mismatched dimensions and for non-finite results.
/// A zero-norm vector yields `Some(0.0)`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    let score = dot / (norm_a * norm_b);
    score.is_finite().then_some(score)
}

/// Embeds both texts with the shared model and reduces them to one [`Signal`].
#[derive(Clone)]
pub struct SimilarityEstimator {
    embedder: Arc<dyn Embedder>,
}

impl SimilarityEstimator {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Both inputs must be non-empty; the orchestrator filters blank documents first.
    /// Embedding runs on the blocking pool so inference never stalls the runtime.
    pub async fn similarity(&self, text_a: &str, text_b: &str) -> Signal {
        let embedder = Arc::clone(&self.embedder);
        let (text_a, text_b) = (text_a.to_owned(), text_b.to_owned());

        let joined = tokio::task::spawn_blocking(move || -> Result<_, EmbeddingError> {
            Ok((embedder.embed(&text_a)?, embedder.embed(&text_b)?))
        })
        .await;

        let (vec_a, vec_b) = match joined {
            Ok(Ok(vectors)) => vectors,
            Ok(Err(e)) => {
                warn!(error = %e, model = self.embedder.model_id(), "Embedding failed; similarity unavailable");
                return Signal::Unavailable;
            }
            Err(e) => {
                warn!(error = %e, model = self.embedder.model_id(), "Embedding task aborted; similarity unavailable");
                return Signal::Unavailable;
            }
        };

        match cosine_similarity(&vec_a, &vec_b) {
            Some(raw) => {
                debug!(raw_cosine = raw, "Computed similarity");
                Signal::Value(raw.clamp(0.0, 1.0))
            }
            None => {
                warn!(
                    dim_a = vec_a.len(),
                    dim_b = vec_b.len(),
                    "Embeddings not comparable; similarity unavailable"
                );
                Signal::Unavailable
            }
        }
    }
}
