//! Canonical identifiers for diseases and symptoms.
//!
//! The reasoning layer never operates on raw user text, only on canonical
//! IDs. IDs are derived deterministically (UUID v5 over the normalized
//! label) so that independent ingestion runs agree on them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::normalize_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiseaseId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomId(pub Uuid);

impl DiseaseId {
    /// Deterministic ID from a disease label.
    pub fn from_label(label: &str) -> Self {
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("disease:{}", normalize_label(label)).as_bytes(),
        ))
    }
}

impl SymptomId {
    /// Deterministic ID from a symptom label.
    pub fn from_label(label: &str) -> Self {
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("symptom:{}", normalize_label(label)).as_bytes(),
        ))
    }
}

impl std::fmt::Display for DiseaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for SymptomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deterministic() {
        assert_eq!(DiseaseId::from_label("Psoriasis"), DiseaseId::from_label("psoriasis"));
        assert_eq!(SymptomId::from_label("sore-throat"), SymptomId::from_label("sore throat"));
    }

    #[test]
    fn test_disease_and_symptom_namespaces_differ() {
        assert_ne!(
            DiseaseId::from_label("fever").0,
            SymptomId::from_label("fever").0,
        );
    }
}
