//! symdx-embed — Sentence embeddings and symptom canonicalization.
//!
//! Pure Rust embeddings using Candle; models load straight from the
//! Hugging Face Hub. The canonicalizer maps free-text symptom phrases onto
//! the knowledge-base vocabulary via cosine similarity over a flat index,
//! with an acceptance threshold and an ambiguity window.

pub mod error;
pub mod config;
pub mod pooling;
pub mod embedder;
pub mod index;
pub mod canonicalizer;

pub use canonicalizer::{CanonicalSymptom, Canonicalization, SymptomCanonicalizer};
pub use config::EmbeddingConfig;
pub use embedder::SentenceEmbedder;
pub use error::{EmbedError, Result};
pub use index::FlatIndex;
pub use pooling::PoolingStrategy;
