//! symdx-kg — Knowledge graph construction and querying.
//!
//! Facts are disease–symptom triples with role-typed predicates derived
//! from dataset row frequencies. Scoring runs over an in-memory graph
//! cache that the rescore queue refreshes when facts change.

pub mod extraction;
pub mod repository;
pub mod scoring;
pub mod update;

pub use extraction::{assign_role, build_fact_drafts, DiseaseObservations, FactDraft, RoleThresholds};
pub use repository::KgRepository;
pub use scoring::{DiseaseGraph, DiseaseMatch};
pub use update::{start_rescore_queue, KgEvent};

pub type Result<T> = std::result::Result<T, KgError>;

#[derive(Debug, thiserror::Error)]
pub enum KgError {
    #[error("Database error: {0}")]
    Db(#[from] symdx_db::DbError),

    #[error("Knowledge graph has no diseases; run ingestion first")]
    EmptyGraph,
}
