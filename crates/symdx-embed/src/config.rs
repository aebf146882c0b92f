//! Configuration for the embedding service.

use serde::{Deserialize, Serialize};

/// Configuration for the sentence embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Hugging Face model ID
    pub model_id: String,

    /// Embedding dimension the model outputs
    pub dimension: usize,

    /// Maximum sequence length
    pub max_length: usize,

    /// Batch size for inference
    pub batch_size: usize,

    /// L2-normalize embeddings (required for cosine search)
    pub normalize: bool,

    /// Pooling strategy
    pub pooling: super::PoolingStrategy,

    /// Use GPU if available
    pub use_gpu: bool,

    /// Maximum cache size for embeddings (number of entries)
    pub cache_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            max_length: 256,
            batch_size: 32,
            normalize: true,
            pooling: super::PoolingStrategy::Mean,
            use_gpu: false,
            cache_size: 10_000,
        }
    }
}

impl EmbeddingConfig {
    /// CPU-only inference.
    pub fn cpu() -> Self {
        Self { use_gpu: false, ..Default::default() }
    }

    pub fn with_model(mut self, model_id: impl Into<String>, dimension: usize) -> Self {
        self.model_id = model_id.into();
        self.dimension = dimension;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
}
