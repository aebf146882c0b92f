//! Knowledge graph fact extraction from dataset rows.
//!
//! Each dataset row pairs a disease label with free text; the symptoms
//! extracted from that text become evidence for disease–symptom triples.
//! A symptom's role depends on how often the disease's rows mention it:
//! primary above `primary_ratio`, secondary above `secondary_ratio`,
//! complication otherwise.

use std::collections::HashMap;

use symdx_common::confidence::evidence_confidence;
use symdx_common::normalize::normalize_label;
use symdx_db::SymptomRole;

#[derive(Debug, Clone, Copy)]
pub struct RoleThresholds {
    pub primary_ratio: f64,
    pub secondary_ratio: f64,
}

impl Default for RoleThresholds {
    fn default() -> Self {
        Self { primary_ratio: 0.40, secondary_ratio: 0.10 }
    }
}

/// Accumulated symptom mentions for one disease.
#[derive(Debug, Clone, Default)]
pub struct DiseaseObservations {
    pub rows: usize,
    /// canonical symptom name -> number of rows mentioning it
    pub symptom_counts: HashMap<String, i64>,
}

impl DiseaseObservations {
    /// Record one dataset row's extracted symptoms. A symptom counts at
    /// most once per row.
    pub fn observe(&mut self, symptoms: &[String]) {
        self.rows += 1;
        let mut seen = std::collections::HashSet::new();
        for s in symptoms {
            let canonical = normalize_label(s);
            if canonical.is_empty() || !seen.insert(canonical.clone()) {
                continue;
            }
            *self.symptom_counts.entry(canonical).or_insert(0) += 1;
        }
    }
}

pub fn assign_role(count: i64, total_rows: usize, thresholds: RoleThresholds) -> SymptomRole {
    if total_rows == 0 {
        return SymptomRole::Complication;
    }
    let ratio = count as f64 / total_rows as f64;
    if ratio >= thresholds.primary_ratio {
        SymptomRole::Primary
    } else if ratio >= thresholds.secondary_ratio {
        SymptomRole::Secondary
    } else {
        SymptomRole::Complication
    }
}

/// A fact before it is bound to stored disease/symptom records.
#[derive(Debug, Clone, PartialEq)]
pub struct FactDraft {
    pub symptom: String,
    pub role: SymptomRole,
    pub evidence_count: i64,
    pub confidence: f32,
}

/// Turn one disease's observations into fact drafts, deterministic order
/// (by symptom name).
pub fn build_fact_drafts(obs: &DiseaseObservations, thresholds: RoleThresholds) -> Vec<FactDraft> {
    let mut drafts: Vec<FactDraft> = obs
        .symptom_counts
        .iter()
        .map(|(symptom, &count)| FactDraft {
            symptom: symptom.clone(),
            role: assign_role(count, obs.rows, thresholds),
            evidence_count: count,
            confidence: evidence_confidence(count as u32) as f32,
        })
        .collect();
    drafts.sort_by(|a, b| a.symptom.cmp(&b.symptom));
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations(rows: &[&[&str]]) -> DiseaseObservations {
        let mut obs = DiseaseObservations::default();
        for row in rows {
            let symptoms: Vec<String> = row.iter().map(|s| s.to_string()).collect();
            obs.observe(&symptoms);
        }
        obs
    }

    #[test]
    fn test_role_assignment_by_frequency() {
        let t = RoleThresholds::default();
        assert_eq!(assign_role(5, 10, t), SymptomRole::Primary);
        assert_eq!(assign_role(4, 10, t), SymptomRole::Primary);
        assert_eq!(assign_role(2, 10, t), SymptomRole::Secondary);
        assert_eq!(assign_role(1, 10, t), SymptomRole::Secondary);
        assert_eq!(assign_role(0, 10, t), SymptomRole::Complication);
        assert_eq!(assign_role(3, 0, t), SymptomRole::Complication);
    }

    #[test]
    fn test_symptom_counted_once_per_row() {
        let obs = observations(&[&["fever", "fever", "cough"]]);
        assert_eq!(obs.symptom_counts["fever"], 1);
        assert_eq!(obs.symptom_counts["cough"], 1);
        assert_eq!(obs.rows, 1);
    }

    #[test]
    fn test_fact_drafts_roles_and_order() {
        // 20 rows: fever in all (primary), cough in 4 (secondary),
        // rash in 1 (complication).
        let mut obs = DiseaseObservations::default();
        for i in 0..20 {
            let mut row = vec!["fever".to_string()];
            if i < 4 {
                row.push("cough".to_string());
            }
            if i == 0 {
                row.push("rash".to_string());
            }
            obs.observe(&row);
        }
        let drafts = build_fact_drafts(&obs, RoleThresholds::default());

        let symptoms: Vec<&str> = drafts.iter().map(|d| d.symptom.as_str()).collect();
        assert_eq!(symptoms, vec!["cough", "fever", "rash"]);

        let fever = drafts.iter().find(|d| d.symptom == "fever").unwrap();
        assert_eq!(fever.role, SymptomRole::Primary);
        assert_eq!(fever.evidence_count, 20);

        let cough = drafts.iter().find(|d| d.symptom == "cough").unwrap();
        assert_eq!(cough.role, SymptomRole::Secondary);

        let rash = drafts.iter().find(|d| d.symptom == "rash").unwrap();
        assert_eq!(rash.role, SymptomRole::Complication);
    }

    #[test]
    fn test_confidence_grows_with_evidence() {
        let obs = observations(&[&["fever"], &["fever"], &["cough"]]);
        let drafts = build_fact_drafts(&obs, RoleThresholds::default());
        let fever = drafts.iter().find(|d| d.symptom == "fever").unwrap();
        let cough = drafts.iter().find(|d| d.symptom == "cough").unwrap();
        assert!(fever.confidence > cough.confidence);
    }
}
