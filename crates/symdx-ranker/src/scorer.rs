//! Prediction fusion.
//!
//! The UI's three modes: knowledge base only, classifier only, or both
//! fused. Hybrid score = w_clf × classifier_prob + w_kg × kg_jaccard,
//! clamped to [0, 1]. Ordering is deterministic: fused score desc,
//! classifier prob desc, disease name asc.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use symdx_common::normalize::normalize_label;
use symdx_kg::DiseaseMatch;

use crate::weights::WeightVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Knowledge-graph ranking only.
    KbOnly,
    /// Text classifier only.
    ClassifierOnly,
    /// Weighted fusion of both.
    Hybrid,
}

impl std::str::FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kb" | "kb_only" | "only kb" => Ok(PredictionMode::KbOnly),
            "classifier" | "classifier_only" | "only classifier" | "only llm" => {
                Ok(PredictionMode::ClassifierOnly)
            }
            "hybrid" | "both" => Ok(PredictionMode::Hybrid),
            _ => Err(format!("Unknown prediction mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionMode::KbOnly => write!(f, "kb_only"),
            PredictionMode::ClassifierOnly => write!(f, "classifier_only"),
            PredictionMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// One ranked disease candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseCandidate {
    pub disease_name: String,
    pub score: f64,
    pub classifier_score: Option<f64>,
    pub kg_score: Option<f64>,
    pub matched_symptoms: Vec<String>,
}

/// Fuse classifier probabilities and KG matches into one ranking.
/// Diseases are joined by normalized label.
pub fn fuse(
    classifier_scores: &[(String, f32)],
    kg_matches: &[DiseaseMatch],
    weights: WeightVector,
    mode: PredictionMode,
) -> Vec<DiseaseCandidate> {
    let kg_by_name: HashMap<String, &DiseaseMatch> = kg_matches
        .iter()
        .map(|m| (normalize_label(&m.disease_name), m))
        .collect();

    let mut candidates: HashMap<String, DiseaseCandidate> = HashMap::new();

    if mode != PredictionMode::KbOnly {
        for (name, prob) in classifier_scores {
            let key = normalize_label(name);
            candidates.insert(
                key,
                DiseaseCandidate {
                    disease_name: name.clone(),
                    score: 0.0,
                    classifier_score: Some(*prob as f64),
                    kg_score: None,
                    matched_symptoms: Vec::new(),
                },
            );
        }
    }

    if mode != PredictionMode::ClassifierOnly {
        for m in kg_matches {
            let key = normalize_label(&m.disease_name);
            let entry = candidates.entry(key).or_insert_with(|| DiseaseCandidate {
                disease_name: m.disease_name.clone(),
                score: 0.0,
                classifier_score: None,
                kg_score: None,
                matched_symptoms: Vec::new(),
            });
            entry.kg_score = Some(m.similarity_score);
            entry.matched_symptoms = m.matched_symptoms.clone();
        }
    } else {
        // Classifier-only rankings still show which symptoms the KG knows
        for candidate in candidates.values_mut() {
            if let Some(m) = kg_by_name.get(&normalize_label(&candidate.disease_name)) {
                candidate.matched_symptoms = m.matched_symptoms.clone();
            }
        }
    }

    let mut out: Vec<DiseaseCandidate> = candidates
        .into_values()
        .map(|mut c| {
            c.score = match mode {
                PredictionMode::KbOnly => c.kg_score.unwrap_or(0.0),
                PredictionMode::ClassifierOnly => c.classifier_score.unwrap_or(0.0),
                PredictionMode::Hybrid => {
                    weights.classifier * c.classifier_score.unwrap_or(0.0)
                        + weights.knowledge_graph * c.kg_score.unwrap_or(0.0)
                }
            }
            .clamp(0.0, 1.0);
            c
        })
        .collect();

    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.classifier_score
                    .unwrap_or(0.0)
                    .partial_cmp(&a.classifier_score.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.disease_name.cmp(&b.disease_name))
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use symdx_common::DiseaseId;

    fn kg_match(name: &str, score: f64, matched: &[&str]) -> DiseaseMatch {
        DiseaseMatch {
            disease_id: DiseaseId::from_label(name),
            disease_name: name.to_string(),
            matched_symptoms: matched.iter().map(|s| s.to_string()).collect(),
            match_count: matched.len(),
            similarity_score: score,
            total_disease_symptoms: 5,
            total_input_symptoms: matched.len(),
        }
    }

    #[test]
    fn test_kb_only_ignores_classifier() {
        let clf = vec![("Dengue".to_string(), 0.9f32)];
        let kg = vec![kg_match("Malaria", 0.7, &["fever"])];
        let out = fuse(&clf, &kg, WeightVector::default(), PredictionMode::KbOnly);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].disease_name, "Malaria");
        assert!((out[0].score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_classifier_only_ignores_kg_scores() {
        let clf = vec![("Dengue".to_string(), 0.9f32), ("Malaria".to_string(), 0.1f32)];
        let kg = vec![kg_match("Malaria", 0.99, &["fever"])];
        let out = fuse(&clf, &kg, WeightVector::default(), PredictionMode::ClassifierOnly);
        assert_eq!(out[0].disease_name, "Dengue");
        assert!((out[0].score - 0.9).abs() < 1e-6);
        // Malaria keeps its matched symptoms for display, not its score
        let malaria = out.iter().find(|c| c.disease_name == "Malaria").unwrap();
        assert_eq!(malaria.matched_symptoms, vec!["fever"]);
        assert!((malaria.score - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_hybrid_interpolates() {
        let clf = vec![("Dengue".to_string(), 1.0f32)];
        let kg = vec![kg_match("Dengue", 0.5, &["fever"])];
        let w = WeightVector { classifier: 0.6, knowledge_graph: 0.4 };
        let out = fuse(&clf, &kg, w, PredictionMode::Hybrid);
        // 0.6 * 1.0 + 0.4 * 0.5 = 0.8
        assert!((out[0].score - 0.8).abs() < 1e-9);
        assert_eq!(out[0].classifier_score, Some(1.0));
        assert_eq!(out[0].kg_score, Some(0.5));
    }

    #[test]
    fn test_hybrid_merges_by_normalized_name() {
        let clf = vec![("chicken pox".to_string(), 0.5f32)];
        let kg = vec![kg_match("Chicken-Pox", 0.5, &["rash"])];
        let out = fuse(&clf, &kg, WeightVector::default(), PredictionMode::Hybrid);
        assert_eq!(out.len(), 1);
        assert!(out[0].classifier_score.is_some());
        assert!(out[0].kg_score.is_some());
    }

    #[test]
    fn test_hybrid_between_extremes() {
        let clf = vec![("Dengue".to_string(), 0.9f32)];
        let kg = vec![kg_match("Dengue", 0.3, &["fever"])];
        let w = WeightVector::default();

        let kb = fuse(&clf, &kg, w, PredictionMode::KbOnly)[0].score;
        let only_clf = fuse(&clf, &kg, w, PredictionMode::ClassifierOnly)[0].score;
        let hybrid = fuse(&clf, &kg, w, PredictionMode::Hybrid)[0].score;

        assert!(hybrid > kb && hybrid < only_clf);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Only KB".parse::<PredictionMode>().unwrap(), PredictionMode::KbOnly);
        assert_eq!("Only LLM".parse::<PredictionMode>().unwrap(), PredictionMode::ClassifierOnly);
        assert_eq!("both".parse::<PredictionMode>().unwrap(), PredictionMode::Hybrid);
        assert!("nope".parse::<PredictionMode>().is_err());
    }
}
