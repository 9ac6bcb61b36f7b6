//! Sentence embeddings from a BERT-family encoder (e.g. `all-MiniLM-L6-v2`).
//!
//! Pipeline: tokenize (truncated) → encoder forward pass → attention-masked mean pooling
//! → L2 normalization. Same model + same text gives the same vector.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::tokio::Api;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::device::select_device;
use super::error::EmbeddingError;
use super::{l2_normalize, Embedder};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("model_id", &self.model_id)
            .field("device", &self.device)
            .finish()
    }
}

impl BertEmbedder {
    /// Loads config, tokenizer and safetensors weights from a local model directory.
    pub fn load(
        model_dir: &Path,
        model_id: &str,
        max_seq_len: usize,
    ) -> Result<Self, EmbeddingError> {
        let config_path = model_dir.join(CONFIG_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let weights_path = model_dir.join(WEIGHTS_FILE);

        for path in [&config_path, &tokenizer_path, &weights_path] {
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
        }

        let config_content = std::fs::read_to_string(&config_path)?;
        let config: BertConfig =
            serde_json::from_str(&config_content).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("invalid {CONFIG_FILE}: {e}"),
            })?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {e}"),
            }
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_len,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("failed to configure truncation: {e}"),
            })?;

        let device = select_device();
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };

        // sentence-transformers checkpoints store the encoder at the root; HF exports
        // nest it under "bert." or "roberta.".
        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)?
        } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("roberta"), &config)?
        } else {
            BertModel::load(vb, &config)?
        };

        info!(
            model_id,
            model_dir = %model_dir.display(),
            hidden_size = config.hidden_size,
            max_seq_len,
            "BERT embedding model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: model_id.to_string(),
        })
    }

    /// Downloads (or reuses the local Hugging Face cache for) `repo_id`, then loads it.
    pub async fn from_hub(repo_id: &str, max_seq_len: usize) -> Result<Self, EmbeddingError> {
        let model_dir = download_model(repo_id).await?;
        Self::load(&model_dir, repo_id, max_seq_len)
    }

    fn embed_tokens(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Embedding text"
        );

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // [1, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean over real tokens only: [1, seq_len, 1] mask broadcast across hidden.
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?.squeeze(0)?;

        Ok(l2_normalize(pooled.to_vec1::<f32>()?))
    }
}

impl Embedder for BertEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_tokens(text)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Fetches the three model files into the Hugging Face cache and returns their directory.
async fn download_model(repo_id: &str) -> Result<PathBuf, EmbeddingError> {
    let download_err = |e: hf_hub::api::tokio::ApiError| EmbeddingError::DownloadFailed {
        repo_id: repo_id.to_string(),
        reason: e.to_string(),
    };

    info!(repo_id, "Fetching embedding model from Hugging Face Hub");
    let api = Api::new().map_err(download_err)?;
    let repo = api.model(repo_id.to_string());

    let config_path = repo.get(CONFIG_FILE).await.map_err(download_err)?;
    repo.get(TOKENIZER_FILE).await.map_err(download_err)?;
    repo.get(WEIGHTS_FILE).await.map_err(download_err)?;

    config_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| EmbeddingError::ModelNotFound { path: config_path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = BertEmbedder::load(dir.path(), "local", 128).unwrap_err();
        match err {
            EmbeddingError::ModelNotFound { path } => {
                assert!(path.ends_with(CONFIG_FILE));
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        std::fs::write(dir.path().join(TOKENIZER_FILE), "{}").unwrap();
        std::fs::write(dir.path().join(WEIGHTS_FILE), b"").unwrap();

        let err = BertEmbedder::load(dir.path(), "local", 128).unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelLoadFailed { .. }));
    }
}
