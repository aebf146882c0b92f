//! Pooling strategies for embedding extraction.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// Converts token embeddings to a single sentence embedding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolingStrategy {
    /// Mean pooling over non-padding tokens
    #[default]
    Mean,

    /// Use [CLS] token embedding
    Cls,
}

impl PoolingStrategy {
    /// Apply pooling.
    ///
    /// `embeddings` has shape (batch, seq_len, hidden); `attention_mask`
    /// has shape (batch, seq_len). Returns (batch, hidden).
    pub fn apply(&self, embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            PoolingStrategy::Mean => mean_pool(embeddings, attention_mask),
            PoolingStrategy::Cls => cls_pool(embeddings),
        }
    }
}

/// Mean pooling over non-padding tokens, weighted by the attention mask.
fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask_expanded = attention_mask.unsqueeze(2)?.expand(embeddings.shape())?;

    let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;

    // Clamp to avoid division by zero on all-padding rows
    let sum_mask = attention_mask
        .unsqueeze(2)?
        .sum(1)?
        .clamp(1e-9f32, f32::MAX)?;

    sum_embeddings.broadcast_div(&sum_mask)
}

/// Extract the [CLS] token embedding (first token).
fn cls_pool(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    embeddings.narrow(1, 0, 1)?.squeeze(1)
}

/// L2 normalize embeddings of shape (batch, hidden).
pub fn l2_normalize(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norms_clamped = norms.clamp(1e-9f32, f32::MAX)?;
    embeddings.broadcast_div(&norms_clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_mean_pool_ignores_padding() {
        let device = Device::Cpu;

        let embeddings = Tensor::from_vec(
            vec![
                1.0f32, 2.0, 3.0, 4.0,
                2.0, 3.0, 4.0, 5.0,
                3.0, 4.0, 5.0, 6.0,
                1.0, 1.0, 1.0, 1.0,
                2.0, 2.0, 2.0, 2.0,
                0.0, 0.0, 0.0, 0.0, // padding
            ],
            (2, 3, 4),
            &device,
        )
        .unwrap();

        let attention_mask = Tensor::from_vec(
            vec![1.0f32, 1.0, 1.0, 1.0, 1.0, 0.0],
            (2, 3),
            &device,
        )
        .unwrap();

        let pooled = mean_pool(&embeddings, &attention_mask).unwrap();
        let result = pooled.to_vec2::<f32>().unwrap();

        assert!((result[0][0] - 2.0).abs() < 1e-5);
        assert!((result[0][1] - 3.0).abs() < 1e-5);
        assert!((result[1][0] - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_l2_normalize_unit_norms() {
        let device = Device::Cpu;

        let embeddings = Tensor::from_vec(
            vec![3.0f32, 4.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            (2, 4),
            &device,
        )
        .unwrap();

        let normalized = l2_normalize(&embeddings).unwrap();
        let result = normalized.to_vec2::<f32>().unwrap();

        assert!((result[0][0] - 0.6).abs() < 1e-5);
        assert!((result[0][1] - 0.8).abs() < 1e-5);

        for row in result {
            let norm: f32 = row.iter().map(|x| x * x).sum();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }
}
