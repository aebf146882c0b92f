//! Symptom phrase extraction from patient-entered text.
//!
//! Dictionary matching against the symptom vocabulary using an
//! Aho-Corasick automaton (linear-time, no per-phrase regex). Nothing in
//! this crate touches the network or a model; unmatched text degrades to
//! candidate chunks so the canonicalizer can still try them.

pub mod matcher;
pub mod candidates;
pub mod vocab;

pub use matcher::{ExtractedSymptom, SymptomMatcher};
pub use candidates::mine_candidates;

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("Automaton build failed: {0}")]
    Build(String),

    #[error("Empty symptom vocabulary")]
    EmptyVocabulary,
}
