//! Flat cosine-similarity index.
//!
//! The symptom vocabulary and the explanation-doc corpus are both small
//! (hundreds of entries), so an exact scan over L2-normalized vectors is
//! the whole index. Scores are dot products, i.e. cosine similarity.

use crate::{EmbedError, Result};

#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self { dimension, vectors: Vec::new() }
    }

    /// Add a vector. Must match the index dimension and be L2-normalized
    /// by the caller (the embedder normalizes by default).
    pub fn add(&mut self, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    pub fn add_all(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        for v in vectors {
            self.add(v)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Top-k most similar entries, (index, cosine score), descending.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_ranks_by_cosine() {
        let mut index = FlatIndex::new(3);
        index.add(vec![1.0, 0.0, 0.0]).unwrap();
        index.add(vec![0.0, 1.0, 0.0]).unwrap();
        index.add(vec![0.6, 0.8, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 2);
        assert!((results[1].1 - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = FlatIndex::new(3);
        assert!(matches!(
            index.add(vec![1.0, 0.0]),
            Err(EmbedError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        index.add(vec![1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_k_larger_than_index() {
        let mut index = FlatIndex::new(2);
        index.add(vec![1.0, 0.0]).unwrap();
        let results = index.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 1);
    }
}
