//! Record types stored in LanceDB.
//!
//! LanceDB uses Apache Arrow for storage; Arrow schemas and conversions
//! live in `schema_arrow`.

use symdx_common::{DiseaseId, SymptomId};

pub const TABLE_DISEASES: &str = "diseases";
pub const TABLE_SYMPTOMS: &str = "symptoms";
pub const TABLE_KG_FACTS: &str = "kg_facts";
pub const TABLE_DOCS: &str = "docs";

/// Embedding dimension (MiniLM-class sentence encoders output 384-dim vectors).
pub const EMBEDDING_DIM: usize = 384;

// =============================================================================
// Disease
// =============================================================================

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Disease {
    pub id: DiseaseId,
    pub name: String,
    pub canonical_name: String,
    /// Wikidata entity ID (e.g. Q30953), filled in by enrichment.
    pub wikidata_id: Option<String>,
    pub description: Option<String>,
    pub medline_url: Option<String>,
    /// LLM-compressed summary from MedlinePlus, filled in by enrichment.
    pub summary: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Disease {
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now();
        let canonical_name = symdx_common::normalize::normalize_label(&name);
        Self {
            id: DiseaseId::from_label(&name),
            name,
            canonical_name,
            wikidata_id: None,
            description: None,
            medline_url: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Symptom
// =============================================================================

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Symptom {
    pub id: SymptomId,
    pub name: String,
    pub canonical_name: String,
    /// Optional grouping (e.g. "systemic", "skin"); not all symptoms have one.
    pub category: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Symptom {
    pub fn new(name: String) -> Self {
        let canonical_name = symdx_common::normalize::normalize_label(&name);
        Self {
            id: SymptomId::from_label(&name),
            name,
            canonical_name,
            category: None,
            created_at: chrono::Utc::now(),
        }
    }
}

// =============================================================================
// KG fact
// =============================================================================

/// Role a symptom plays for a disease. Primary symptoms are the ones most
/// rows report; complications are rare co-mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SymptomRole {
    Primary,
    Secondary,
    Complication,
}

impl SymptomRole {
    pub fn as_predicate(&self) -> &'static str {
        match self {
            SymptomRole::Primary => "has_primary_symptom",
            SymptomRole::Secondary => "has_secondary_symptom",
            SymptomRole::Complication => "has_complication",
        }
    }
}

impl std::str::FromStr for SymptomRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "has_primary_symptom" => Ok(SymptomRole::Primary),
            "has_secondary_symptom" => Ok(SymptomRole::Secondary),
            "has_complication" => Ok(SymptomRole::Complication),
            _ => Err(format!("Unknown predicate: {}", s)),
        }
    }
}

/// Disease–symptom triple with evidence bookkeeping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KgFact {
    pub id: uuid::Uuid,
    pub disease_id: DiseaseId,
    pub disease_name: String,
    pub predicate: String,
    pub symptom_id: SymptomId,
    pub symptom_name: String,
    pub confidence: Option<f32>,
    /// Number of dataset rows supporting this triple.
    pub evidence_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl KgFact {
    pub fn new(
        disease: &Disease,
        symptom: &Symptom,
        role: SymptomRole,
        evidence_count: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            disease_id: disease.id,
            disease_name: disease.name.clone(),
            predicate: role.as_predicate().to_string(),
            symptom_id: symptom.id,
            symptom_name: symptom.name.clone(),
            confidence: None,
            evidence_count,
            created_at: chrono::Utc::now(),
        }
    }
}

// =============================================================================
// Explanation doc
// =============================================================================

/// Per-disease explanation document used by the RAG explainer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Doc {
    pub id: uuid::Uuid,
    pub disease_id: DiseaseId,
    pub title: String,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Doc {
    pub fn new(disease_id: DiseaseId, title: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            disease_id,
            title,
            content,
            embedding: None,
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicate_round_trip() {
        for role in [SymptomRole::Primary, SymptomRole::Secondary, SymptomRole::Complication] {
            let parsed: SymptomRole = role.as_predicate().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("has_symptom".parse::<SymptomRole>().is_err());
    }

    #[test]
    fn test_disease_canonical_name() {
        let d = Disease::new("Chicken-Pox".to_string());
        assert_eq!(d.canonical_name, "chicken pox");
        assert_eq!(d.id, DiseaseId::from_label("chicken pox"));
    }
}
