//! symdx-ranker — Disease prediction engine.
//!
//! A TF-IDF + logistic-regression text classifier, fusion of classifier
//! and knowledge-graph scores, the evaluation harness, and the
//! end-to-end diagnosis pipeline that the web UI and agent binary drive.

pub mod stopwords;
pub mod tfidf;
pub mod classifier;
pub mod weights;
pub mod scorer;
pub mod eval;
pub mod pipeline;

pub use classifier::{DiseaseClassifier, TrainConfig};
pub use pipeline::{Diagnosis, DiagnosisPipeline, DiagnosisRequest, PipelineTimings};
pub use scorer::{DiseaseCandidate, PredictionMode};
pub use tfidf::TfidfVectorizer;
pub use weights::WeightVector;

pub type Result<T> = std::result::Result<T, RankerError>;

#[derive(Debug, thiserror::Error)]
pub enum RankerError {
    #[error("Knowledge graph error: {0}")]
    Kg(#[from] symdx_kg::KgError),

    #[error("LLM error: {0}")]
    Llm(#[from] symdx_llm::LlmError),

    #[error("Extraction error: {0}")]
    Ner(#[from] symdx_ner::NerError),

    #[error("Embedding error: {0}")]
    Embed(#[from] symdx_embed::EmbedError),

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
