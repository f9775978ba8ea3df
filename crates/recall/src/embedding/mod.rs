//! Text embeddings for context similarity search

use fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::config::EmbeddingConfig;
use crate::error::{RecallError, Result};

pub const EMBEDDING_DIMENSION: usize = 384;

/// Turns context text into a vector
pub trait Embedder: Send {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>>;
}

pub struct EmbeddingModel {
    model: TextEmbedding,
}

impl EmbeddingModel {
    /// Load the default multilingual model
    pub fn new() -> Result<Self> {
        Self::load(FastEmbedModel::MultilingualE5Small)
    }

    /// Load the model named in `[embedding]`
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::load(model_by_name(&config.model)?)
    }

    fn load(model: FastEmbedModel) -> Result<Self> {
        info!("Loading embedding model {:?}", model);
        let model = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|e| RecallError::Embedding(e.to_string()))?;
        Ok(Self { model })
    }

    pub fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| RecallError::Embedding(e.to_string()))
    }
}

impl Embedder for EmbeddingModel {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| RecallError::Embedding(e.to_string()))?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RecallError::Embedding("No embedding returned".to_string()))
    }
}

/// 384-dimensional models accepted in `[embedding] model`
fn model_by_name(name: &str) -> Result<FastEmbedModel> {
    match name.to_ascii_lowercase().as_str() {
        "multilingual-e5-small" => Ok(FastEmbedModel::MultilingualE5Small),
        "all-minilm-l6-v2" => Ok(FastEmbedModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(FastEmbedModel::BGESmallENV15),
        other => Err(RecallError::Config(format!(
            "unknown embedding model '{other}'"
        ))),
    }
}
