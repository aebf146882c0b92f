//! Knowledge graph persistence on top of symdx-db.

use std::sync::Arc;

use symdx_db::diseases::DiseaseRepository;
use symdx_db::kg_facts::KgFactRepository;
use symdx_db::symptoms::SymptomRepository;
use symdx_db::{Database, Disease, KgFact, Symptom};
use tracing::{debug, info};

use crate::extraction::FactDraft;
use crate::scoring::DiseaseGraph;

#[derive(Clone)]
pub struct KgRepository {
    diseases: DiseaseRepository,
    symptoms: SymptomRepository,
    facts: KgFactRepository,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct KgStats {
    pub diseases: u64,
    pub symptoms: u64,
    pub facts: u64,
}

impl KgRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            diseases: DiseaseRepository::new(db.clone()),
            symptoms: SymptomRepository::new(db.clone()),
            facts: KgFactRepository::new(db),
        }
    }

    /// Store one disease's subgraph: the disease record, any symptoms not
    /// yet known, and its facts (replacing previous ones for that disease).
    pub async fn upsert_disease_graph(
        &self,
        disease: &Disease,
        drafts: &[FactDraft],
    ) -> crate::Result<usize> {
        self.diseases.upsert(disease).await?;

        let known: std::collections::HashSet<String> = self
            .symptoms
            .all()
            .await?
            .into_iter()
            .map(|s| s.canonical_name)
            .collect();

        let mut new_symptoms = Vec::new();
        let mut by_name = std::collections::HashMap::new();
        for draft in drafts {
            let symptom = Symptom::new(draft.symptom.clone());
            if !known.contains(&symptom.canonical_name) && !by_name.contains_key(&symptom.canonical_name) {
                new_symptoms.push(symptom.clone());
            }
            by_name.insert(symptom.canonical_name.clone(), symptom);
        }
        self.symptoms.insert_batch(&new_symptoms).await?;

        let facts: Vec<KgFact> = drafts
            .iter()
            .map(|d| {
                let symptom = &by_name[&symdx_common::normalize::normalize_label(&d.symptom)];
                let mut fact = KgFact::new(disease, symptom, d.role, d.evidence_count);
                fact.confidence = Some(d.confidence);
                fact
            })
            .collect();

        self.facts.delete_by_disease(disease.id).await?;
        self.facts.insert_batch(&facts).await?;

        debug!(disease = %disease.name, facts = facts.len(), "disease subgraph stored");
        Ok(facts.len())
    }

    /// Load the full graph snapshot for scoring.
    pub async fn load_graph(&self) -> crate::Result<DiseaseGraph> {
        let diseases = self.diseases.all().await?;
        let facts = self.facts.all().await?;
        let graph = DiseaseGraph::from_records(diseases, facts)?;
        info!(
            diseases = graph.disease_count(),
            symptoms = graph.symptom_count(),
            "knowledge graph loaded"
        );
        Ok(graph)
    }

    pub async fn stats(&self) -> crate::Result<KgStats> {
        Ok(KgStats {
            diseases: self.diseases.count().await?,
            symptoms: self.symptoms.count().await?,
            facts: self.facts.count().await?,
        })
    }

    pub fn diseases(&self) -> &DiseaseRepository {
        &self.diseases
    }

    pub fn facts(&self) -> &KgFactRepository {
        &self.facts
    }

    pub fn symptoms(&self) -> &SymptomRepository {
        &self.symptoms
    }
}
