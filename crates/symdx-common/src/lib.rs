//! symdx-common — Shared types and helpers used across all symdx crates.
//!
//! Error handling stays per-crate (each boundary has its own thiserror
//! enum); what lives here is what every layer must agree on: canonical
//! IDs, text normalization, and the evidence confidence model.

pub mod ids;
pub mod normalize;
pub mod confidence;

// Re-export commonly used types
pub use ids::{DiseaseId, SymptomId};
