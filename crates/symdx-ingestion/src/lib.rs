//! symdx-ingestion — Dataset transformation and enrichment.
//!
//! Turns the symptom–disease dataset into the knowledge base: symptom
//! vocabulary, disease–symptom facts, and per-disease explanation docs.
//! Enrichment pulls reference material from MedlinePlus and Wikidata and
//! compresses it with the (local) LLM. Network enrichment is best-effort:
//! failures log and degrade, they never abort a run.

pub mod dataset;
pub mod docs_gen;
pub mod pipeline;
pub mod sources;
pub mod summary;

pub use dataset::{DatasetReader, DatasetRow};
pub use pipeline::{run_ingestion, IngestionContext, IngestionJob, IngestionProgress, IngestionResult};

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Knowledge graph error: {0}")]
    Kg(#[from] symdx_kg::KgError),

    #[error("Database error: {0}")]
    Db(#[from] symdx_db::DbError),

    #[error("Extraction error: {0}")]
    Ner(#[from] symdx_ner::NerError),

    #[error("LLM error: {0}")]
    Llm(#[from] symdx_llm::LlmError),
}
