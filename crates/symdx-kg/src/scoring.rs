//! Disease ranking over the knowledge graph.
//!
//! An in-memory snapshot of the graph (diseases with role-typed symptom
//! sets) scores canonical symptom input by Jaccard similarity. Ordering is
//! deterministic: score desc, match count desc, disease name asc.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use symdx_common::normalize::normalize_label;
use symdx_common::{DiseaseId, SymptomId};
use symdx_db::{Disease, KgFact, SymptomRole};

/// One disease node with its symptom sets.
#[derive(Debug, Clone)]
pub struct DiseaseNode {
    pub id: DiseaseId,
    pub name: String,
    pub canonical_name: String,
    pub wikidata_id: Option<String>,
    /// All symptoms, any role.
    pub symptoms: HashSet<SymptomId>,
    /// Primary symptoms only.
    pub primary: HashSet<SymptomId>,
}

/// Ranked match for a symptom query.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseMatch {
    pub disease_id: DiseaseId,
    pub disease_name: String,
    pub matched_symptoms: Vec<String>,
    pub match_count: usize,
    pub similarity_score: f64,
    pub total_disease_symptoms: usize,
    pub total_input_symptoms: usize,
}

/// In-memory knowledge graph snapshot.
#[derive(Debug, Clone, Default)]
pub struct DiseaseGraph {
    diseases: Vec<DiseaseNode>,
    /// symptom id -> display label
    symptom_labels: HashMap<SymptomId, String>,
    /// normalized symptom label -> id
    symptom_by_label: HashMap<String, SymptomId>,
}

impl DiseaseGraph {
    /// Build the snapshot from stored records. A graph without diseases is
    /// a configuration error, not an empty result.
    pub fn from_records(diseases: Vec<Disease>, facts: Vec<KgFact>) -> crate::Result<Self> {
        if diseases.is_empty() {
            return Err(crate::KgError::EmptyGraph);
        }

        let mut nodes: HashMap<DiseaseId, DiseaseNode> = diseases
            .into_iter()
            .map(|d| {
                (
                    d.id,
                    DiseaseNode {
                        id: d.id,
                        canonical_name: d.canonical_name.clone(),
                        name: d.name,
                        wikidata_id: d.wikidata_id,
                        symptoms: HashSet::new(),
                        primary: HashSet::new(),
                    },
                )
            })
            .collect();

        let mut symptom_labels = HashMap::new();
        let mut symptom_by_label = HashMap::new();

        for fact in facts {
            let Some(node) = nodes.get_mut(&fact.disease_id) else {
                continue;
            };
            node.symptoms.insert(fact.symptom_id);
            if fact.predicate.parse::<SymptomRole>() == Ok(SymptomRole::Primary) {
                node.primary.insert(fact.symptom_id);
            }
            symptom_by_label.insert(normalize_label(&fact.symptom_name), fact.symptom_id);
            symptom_labels.insert(fact.symptom_id, fact.symptom_name);
        }

        let mut diseases: Vec<DiseaseNode> = nodes.into_values().collect();
        diseases.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { diseases, symptom_labels, symptom_by_label })
    }

    pub fn disease_count(&self) -> usize {
        self.diseases.len()
    }

    pub fn symptom_count(&self) -> usize {
        self.symptom_labels.len()
    }

    pub fn symptom_label(&self, id: SymptomId) -> Option<&str> {
        self.symptom_labels.get(&id).map(|s| s.as_str())
    }

    /// Resolve free-text symptom labels to graph symptom IDs. Matching is
    /// normalized equality or containment either way ("stomach pain" hits
    /// "pain in stomach region" and vice versa).
    pub fn find_symptom_ids(&self, labels: &[String]) -> HashSet<SymptomId> {
        let normalized_inputs: HashSet<String> =
            labels.iter().map(|l| normalize_label(l)).collect();

        let mut matches = HashSet::new();
        for (label, &id) in &self.symptom_by_label {
            for input in &normalized_inputs {
                if input == label || input.contains(label.as_str()) || label.contains(input.as_str())
                {
                    matches.insert(id);
                }
            }
        }
        matches
    }

    /// Rank diseases by Jaccard similarity against the input symptom set.
    /// Diseases with no overlap are excluded.
    pub fn rank(&self, input_symptoms: &HashSet<SymptomId>, top_k: Option<usize>) -> Vec<DiseaseMatch> {
        if input_symptoms.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();

        for node in &self.diseases {
            let intersection: HashSet<_> =
                input_symptoms.intersection(&node.symptoms).copied().collect();
            if intersection.is_empty() {
                continue;
            }

            let union_len = input_symptoms.union(&node.symptoms).count();
            let score = intersection.len() as f64 / union_len as f64;

            let mut matched_symptoms: Vec<String> = intersection
                .iter()
                .filter_map(|id| self.symptom_label(*id).map(String::from))
                .collect();
            matched_symptoms.sort();

            results.push(DiseaseMatch {
                disease_id: node.id,
                disease_name: node.name.clone(),
                match_count: intersection.len(),
                matched_symptoms,
                similarity_score: score,
                total_disease_symptoms: node.symptoms.len(),
                total_input_symptoms: input_symptoms.len(),
            });
        }

        results.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.match_count.cmp(&a.match_count))
                .then_with(|| a.disease_name.cmp(&b.disease_name))
        });

        match top_k {
            Some(k) => {
                results.truncate(k);
                results
            }
            None => results,
        }
    }

    /// Rank from raw labels (resolve, then score).
    pub fn rank_labels(&self, labels: &[String], top_k: Option<usize>) -> Vec<DiseaseMatch> {
        let ids = self.find_symptom_ids(labels);
        self.rank(&ids, top_k)
    }

    // ── Introspection ─────────────────────────────────────────────────────

    fn find_disease(&self, disease_name: &str) -> Option<&DiseaseNode> {
        let target = normalize_label(disease_name);
        self.diseases.iter().find(|d| d.canonical_name == target)
    }

    /// All symptoms of a disease (any role), sorted.
    pub fn symptoms_of(&self, disease_name: &str) -> Vec<String> {
        self.find_disease(disease_name)
            .map(|node| {
                let mut out: Vec<String> = node
                    .symptoms
                    .iter()
                    .filter_map(|id| self.symptom_label(*id).map(String::from))
                    .collect();
                out.sort();
                out
            })
            .unwrap_or_default()
    }

    /// Primary symptoms only, for sanity checks.
    pub fn primary_symptoms_of(&self, disease_name: &str) -> Vec<String> {
        self.find_disease(disease_name)
            .map(|node| {
                let mut out: Vec<String> = node
                    .primary
                    .iter()
                    .filter_map(|id| self.symptom_label(*id).map(String::from))
                    .collect();
                out.sort();
                out
            })
            .unwrap_or_default()
    }

    /// Wikidata entity ID for a disease, when enrichment recorded one.
    pub fn wikidata_id_of(&self, disease_name: &str) -> Option<String> {
        self.find_disease(disease_name).and_then(|d| d.wikidata_id.clone())
    }

    /// Every symptom label in the graph, sorted and deduped.
    pub fn all_symptoms(&self) -> Vec<String> {
        let mut out: Vec<String> = self.symptom_labels.values().cloned().collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn diseases(&self) -> &[DiseaseNode] {
        &self.diseases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symdx_db::{Disease, KgFact, Symptom, SymptomRole};

    fn fixture() -> DiseaseGraph {
        let flu = Disease::new("Influenza".to_string());
        let mut dengue = Disease::new("Dengue".to_string());
        dengue.wikidata_id = Some("Q30953".to_string());

        let fever = Symptom::new("fever".to_string());
        let headache = Symptom::new("headache".to_string());
        let cough = Symptom::new("cough".to_string());
        let rash = Symptom::new("skin rash".to_string());

        let facts = vec![
            KgFact::new(&flu, &fever, SymptomRole::Primary, 12),
            KgFact::new(&flu, &cough, SymptomRole::Primary, 10),
            KgFact::new(&flu, &headache, SymptomRole::Secondary, 3),
            KgFact::new(&dengue, &fever, SymptomRole::Primary, 15),
            KgFact::new(&dengue, &headache, SymptomRole::Primary, 9),
            KgFact::new(&dengue, &rash, SymptomRole::Secondary, 4),
        ];

        DiseaseGraph::from_records(vec![flu, dengue], facts).unwrap()
    }

    #[test]
    fn test_empty_graph_fails_fast() {
        assert!(matches!(
            DiseaseGraph::from_records(vec![], vec![]),
            Err(crate::KgError::EmptyGraph)
        ));
    }

    #[test]
    fn test_jaccard_ranking() {
        let graph = fixture();
        let input = graph.find_symptom_ids(&["fever".to_string(), "headache".to_string()]);
        assert_eq!(input.len(), 2);

        let results = graph.rank(&input, None);
        assert_eq!(results.len(), 2);

        // Dengue: |{fever, headache}| / |{fever, headache, rash}| = 2/3
        // Influenza: 2 / |{fever, headache, cough}| = 2/3 — tie on score,
        // tie on match count, name breaks it: Dengue < Influenza
        assert_eq!(results[0].disease_name, "Dengue");
        assert_eq!(results[1].disease_name, "Influenza");
        assert!((results[0].similarity_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(results[0].matched_symptoms, vec!["fever", "headache"]);
    }

    #[test]
    fn test_no_overlap_excluded() {
        let graph = fixture();
        let input = graph.find_symptom_ids(&["skin rash".to_string()]);
        let results = graph.rank(&input, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].disease_name, "Dengue");
    }

    #[test]
    fn test_containment_matching() {
        let graph = fixture();
        // "rash" is contained in "skin rash"
        let input = graph.find_symptom_ids(&["rash".to_string()]);
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_top_k_cut() {
        let graph = fixture();
        let input = graph.find_symptom_ids(&["fever".to_string()]);
        let results = graph.rank(&input, Some(1));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_empty_input_empty_result() {
        let graph = fixture();
        assert!(graph.rank(&Default::default(), None).is_empty());
    }

    #[test]
    fn test_introspection() {
        let graph = fixture();
        assert_eq!(graph.symptoms_of("influenza"), vec!["cough", "fever", "headache"]);
        assert_eq!(graph.primary_symptoms_of("Influenza"), vec!["cough", "fever"]);
        assert_eq!(graph.wikidata_id_of("dengue").as_deref(), Some("Q30953"));
        assert!(graph.wikidata_id_of("influenza").is_none());
        assert_eq!(
            graph.all_symptoms(),
            vec!["cough", "fever", "headache", "skin rash"]
        );
    }
}
