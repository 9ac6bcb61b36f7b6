//! Process-wide model handles: built once at startup, released once after the
//! server has drained.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Config, EmbeddingBackend};
use crate::embedding::bert::BertEmbedder;
use crate::embedding::{Embedder, StubEmbedder};
use crate::llm_client::LlmClient;
use crate::scoring::feedback::{FeedbackGenerator, LlmFeedback, UnavailableFeedback};

pub struct ModelHandles {
    pub embedder: Arc<dyn Embedder>,
    pub feedback: Arc<dyn FeedbackGenerator>,
}

impl ModelHandles {
    pub async fn init(config: &Config) -> Result<Self> {
        let embedder = build_embedder(config).await?;
        let feedback = build_feedback(config)?;
        Ok(Self { embedder, feedback })
    }

    /// Drops the shared handles. Any clones still held elsewhere keep their model alive
    /// until they are dropped too.
    pub fn shutdown(self) {
        let model_id = self.embedder.model_id().to_string();
        let outstanding = Arc::strong_count(&self.embedder) - 1;
        if outstanding > 0 {
            warn!(outstanding, "Embedding model still referenced at shutdown");
        }
        drop(self.embedder);
        drop(self.feedback);
        info!(model_id = %model_id, "Model handles released");
    }
}

async fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedding_backend {
        EmbeddingBackend::Stub => {
            warn!("EMBEDDING_BACKEND=stub; similarity scores use hashed bag-of-words vectors");
            Ok(Arc::new(StubEmbedder::default()))
        }
        EmbeddingBackend::Bert => {
            let embedder = match &config.embedding_model_dir {
                Some(dir) => {
                    let dir = dir.clone();
                    let model_id = config.embedding_model.clone();
                    let max_seq_len = config.embedding_max_seq_len;
                    tokio::task::spawn_blocking(move || {
                        BertEmbedder::load(&dir, &model_id, max_seq_len)
                    })
                    .await
                    .context("Embedding model load task failed")?
                }
                None => {
                    BertEmbedder::from_hub(&config.embedding_model, config.embedding_max_seq_len)
                        .await
                }
            }
            .with_context(|| format!("Failed to load embedding model '{}'", config.embedding_model))?;
            Ok(Arc::new(embedder))
        }
    }
}

fn build_feedback(config: &Config) -> Result<Arc<dyn FeedbackGenerator>> {
    let Some(api_key) = &config.gemini_api_key else {
        warn!("GEMINI_API_KEY not set; feedback will always be the fallback message");
        return Ok(Arc::new(UnavailableFeedback));
    };

    let llm = LlmClient::new(
        api_key.clone(),
        &config.gemini_base_url,
        &config.gemini_model,
        config.feedback_timeout,
    )
    .context("Failed to build generative model client")?;
    info!(model = llm.model(), "LLM client initialized");

    Ok(Arc::new(LlmFeedback::new(llm, config.feedback_timeout)))
}
