//! End-to-end diagnosis pipeline.
//!
//! extract → canonicalize → classify → KG rank → fuse → explain.
//! Components are optional where the system can degrade: without a trained
//! classifier only KB ranking runs; without an LLM backend explanations
//! are skipped. The KG graph snapshot is shared behind an RwLock so the
//! rescore queue can refresh it underneath us.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use symdx_embed::SymptomCanonicalizer;
use symdx_kg::DiseaseGraph;
use symdx_llm::RagExplainer;
use symdx_ner::SymptomMatcher;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::classifier::DiseaseClassifier;
use crate::scorer::{fuse, DiseaseCandidate, PredictionMode};
use crate::weights::WeightVector;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub text: String,
    /// 1, 3, or 5 in the UI; any positive value works.
    pub top_n: usize,
    pub mode: PredictionMode,
    pub explain: bool,
}

impl Default for DiagnosisRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            top_n: 3,
            mode: PredictionMode::Hybrid,
            explain: false,
        }
    }
}

/// Per-stage wall-clock timings, shown in the UI performance pane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineTimings {
    pub extract_ms: u64,
    pub canonicalize_ms: u64,
    pub classify_ms: u64,
    pub kg_ms: u64,
    pub explain_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub candidates: Vec<DiseaseCandidate>,
    /// Symptom phrases found in the input.
    pub extracted: Vec<String>,
    /// Phrases the canonicalizer refused to map (too ambiguous).
    pub ambiguous: Vec<String>,
    pub explanation: Option<String>,
    pub timings: PipelineTimings,
}

pub struct DiagnosisPipeline {
    matcher: SymptomMatcher,
    canonicalizer: Option<Arc<SymptomCanonicalizer>>,
    classifier: Option<DiseaseClassifier>,
    graph: Arc<RwLock<DiseaseGraph>>,
    explainer: Option<Arc<RagExplainer>>,
    weights: WeightVector,
}

impl DiagnosisPipeline {
    pub fn new(
        matcher: SymptomMatcher,
        canonicalizer: Option<Arc<SymptomCanonicalizer>>,
        classifier: Option<DiseaseClassifier>,
        graph: Arc<RwLock<DiseaseGraph>>,
        explainer: Option<Arc<RagExplainer>>,
        weights: WeightVector,
    ) -> Self {
        let mut weights = weights;
        if !weights.validate() {
            warn!("fusion weights do not sum to 1.0, renormalising");
            weights.normalise();
        }
        Self { matcher, canonicalizer, classifier, graph, explainer, weights }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn has_explainer(&self) -> bool {
        self.explainer.is_some()
    }

    pub fn graph(&self) -> Arc<RwLock<DiseaseGraph>> {
        self.graph.clone()
    }

    pub fn classifier(&self) -> Option<&DiseaseClassifier> {
        self.classifier.as_ref()
    }

    /// Run the full pipeline for one request.
    #[instrument(skip(self, request), fields(mode = %request.mode, top_n = request.top_n))]
    pub async fn diagnose(&self, request: &DiagnosisRequest) -> Result<Diagnosis> {
        let t0 = Instant::now();
        let mut timings = PipelineTimings::default();

        // 1. Extract symptom phrases
        let t = Instant::now();
        let extracted_hits = self.matcher.extract(&request.text);
        let extracted: Vec<String> = extracted_hits.iter().map(|e| e.text.clone()).collect();
        timings.extract_ms = t.elapsed().as_millis() as u64;
        debug!(?extracted, "symptoms extracted");

        // 2. Canonicalize onto the vocabulary
        let t = Instant::now();
        let mut symptom_labels = Vec::new();
        let mut ambiguous = Vec::new();
        match &self.canonicalizer {
            Some(canon) => {
                for result in canon.canonicalize_many(&extracted, 2).await? {
                    if let Some(matched) = result.matched {
                        symptom_labels.push(matched.text);
                    } else if result.ambiguous {
                        ambiguous.push(result.input);
                    }
                }
            }
            None => {
                // Vocabulary hits are already canonical enough for the
                // KG's containment matching.
                symptom_labels = extracted.clone();
            }
        }
        symptom_labels.sort();
        symptom_labels.dedup();
        timings.canonicalize_ms = t.elapsed().as_millis() as u64;

        // 3. Classifier probabilities
        let t = Instant::now();
        let mode = self.effective_mode(request.mode);
        let classifier_scores: Vec<(String, f32)> = match (&self.classifier, mode) {
            (Some(clf), m) if m != PredictionMode::KbOnly => {
                let probs = clf.predict_proba(&request.text);
                clf.labels().iter().cloned().zip(probs).collect()
            }
            _ => Vec::new(),
        };
        timings.classify_ms = t.elapsed().as_millis() as u64;

        // 4. Knowledge-graph ranking. Classifier-only mode still ranks so
        // the UI can show which symptoms the KG recognised.
        let t = Instant::now();
        let kg_matches = if symptom_labels.is_empty() {
            Vec::new()
        } else {
            self.graph.read().await.rank_labels(&symptom_labels, None)
        };
        timings.kg_ms = t.elapsed().as_millis() as u64;

        // 5. Fuse and cut
        let mut candidates = fuse(&classifier_scores, &kg_matches, self.weights, mode);
        candidates.truncate(request.top_n);

        // 6. Explanation for the top candidate
        let t = Instant::now();
        let explanation = match (&self.explainer, request.explain, candidates.first()) {
            (Some(explainer), true, Some(top)) => {
                match explainer.explain(&request.text, &top.disease_name, top.score).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        // Explanations are best-effort; the prediction
                        // itself must still come back.
                        warn!("explanation failed: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };
        timings.explain_ms = t.elapsed().as_millis() as u64;
        timings.total_ms = t0.elapsed().as_millis() as u64;

        Ok(Diagnosis { candidates, extracted, ambiguous, explanation, timings })
    }

    /// Evaluate every available mode on held-out rows. The graph snapshot
    /// is cloned once so the ranking closures stay synchronous.
    pub async fn evaluate(
        &self,
        test: &[crate::eval::LabelledRow],
        ks: &[usize],
    ) -> crate::eval::EvaluationReport {
        use crate::eval::{evaluate_ranking, macro_metrics, EvaluationReport};

        let graph = self.graph.read().await.clone();

        let kb_rank = |text: &str| -> Vec<String> {
            let labels: Vec<String> = self
                .matcher
                .extract(text)
                .into_iter()
                .filter(|h| !h.fallback)
                .map(|h| h.text)
                .collect();
            graph
                .rank_labels(&labels, None)
                .into_iter()
                .map(|m| m.disease_name)
                .collect()
        };

        let mut modes = vec![evaluate_ranking("kb_only", test, ks, &kb_rank)];
        let mut classifier_macro = None;

        if let Some(clf) = &self.classifier {
            let n_classes = clf.labels().len();
            let clf_rank = |text: &str| -> Vec<String> {
                clf.top_n(text, n_classes).into_iter().map(|(name, _)| name).collect()
            };
            modes.push(evaluate_ranking("classifier_only", test, ks, &clf_rank));
            classifier_macro = Some(macro_metrics(test, &clf_rank));

            let weights = self.weights;
            let hybrid_rank = |text: &str| -> Vec<String> {
                let probs = clf.predict_proba(text);
                let scores: Vec<(String, f32)> =
                    clf.labels().iter().cloned().zip(probs).collect();
                let labels: Vec<String> = self
                    .matcher
                    .extract(text)
                    .into_iter()
                    .filter(|h| !h.fallback)
                    .map(|h| h.text)
                    .collect();
                let kg_matches = graph.rank_labels(&labels, None);
                fuse(&scores, &kg_matches, weights, PredictionMode::Hybrid)
                    .into_iter()
                    .map(|c| c.disease_name)
                    .collect()
            };
            modes.push(evaluate_ranking("hybrid", test, ks, &hybrid_rank));
        }

        EvaluationReport { test_samples: test.len(), modes, classifier_macro }
    }

    /// Degrade the requested mode to what is actually available.
    fn effective_mode(&self, requested: PredictionMode) -> PredictionMode {
        if self.classifier.is_none() && requested != PredictionMode::KbOnly {
            warn!("no classifier loaded, degrading {} to kb_only", requested);
            return PredictionMode::KbOnly;
        }
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TrainConfig;
    use symdx_db::{Disease, KgFact, Symptom, SymptomRole};

    fn graph() -> DiseaseGraph {
        let malaria = Disease::new("Malaria".to_string());
        let psoriasis = Disease::new("Psoriasis".to_string());

        let fever = Symptom::new("fever".to_string());
        let chills = Symptom::new("chills".to_string());
        let rash = Symptom::new("skin rash".to_string());
        let itching = Symptom::new("itching".to_string());

        let facts = vec![
            KgFact::new(&malaria, &fever, SymptomRole::Primary, 10),
            KgFact::new(&malaria, &chills, SymptomRole::Primary, 8),
            KgFact::new(&psoriasis, &rash, SymptomRole::Primary, 12),
            KgFact::new(&psoriasis, &itching, SymptomRole::Primary, 9),
        ];

        DiseaseGraph::from_records(vec![malaria, psoriasis], facts).unwrap()
    }

    fn classifier() -> DiseaseClassifier {
        let texts = vec![
            "high fever with chills at night".to_string(),
            "fever and chills and shivering".to_string(),
            "itchy skin rash with red patches".to_string(),
            "red itchy rash on my skin".to_string(),
        ];
        let labels = vec![
            "Malaria".to_string(),
            "Malaria".to_string(),
            "Psoriasis".to_string(),
            "Psoriasis".to_string(),
        ];
        DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap()
    }

    fn pipeline(with_classifier: bool) -> DiagnosisPipeline {
        let vocab: Vec<String> = ["fever", "chills", "skin rash", "itching"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        DiagnosisPipeline::new(
            SymptomMatcher::new(&vocab).unwrap(),
            None,
            with_classifier.then(classifier),
            Arc::new(RwLock::new(graph())),
            None,
            WeightVector::default(),
        )
    }

    #[tokio::test]
    async fn test_kb_only_diagnosis() {
        let p = pipeline(false);
        let req = DiagnosisRequest {
            text: "I have a fever and chills".to_string(),
            top_n: 3,
            mode: PredictionMode::KbOnly,
            explain: false,
        };
        let d = p.diagnose(&req).await.unwrap();
        assert_eq!(d.candidates[0].disease_name, "Malaria");
        assert_eq!(d.extracted, vec!["fever", "chills"]);
        assert!(d.explanation.is_none());
    }

    #[tokio::test]
    async fn test_hybrid_degrades_without_classifier() {
        let p = pipeline(false);
        let req = DiagnosisRequest {
            text: "fever and chills".to_string(),
            top_n: 1,
            mode: PredictionMode::Hybrid,
            explain: false,
        };
        let d = p.diagnose(&req).await.unwrap();
        // Degraded to KB-only: still ranks Malaria first
        assert_eq!(d.candidates[0].disease_name, "Malaria");
        assert!(d.candidates[0].classifier_score.is_none());
    }

    #[tokio::test]
    async fn test_hybrid_has_both_scores() {
        let p = pipeline(true);
        let req = DiagnosisRequest {
            text: "itchy skin rash everywhere".to_string(),
            top_n: 1,
            mode: PredictionMode::Hybrid,
            explain: false,
        };
        let d = p.diagnose(&req).await.unwrap();
        let top = &d.candidates[0];
        assert_eq!(top.disease_name, "Psoriasis");
        assert!(top.classifier_score.is_some());
        assert!(top.kg_score.is_some());
    }

    #[tokio::test]
    async fn test_top_n_respected() {
        let p = pipeline(true);
        let req = DiagnosisRequest {
            text: "fever".to_string(),
            top_n: 1,
            mode: PredictionMode::ClassifierOnly,
            explain: false,
        };
        let d = p.diagnose(&req).await.unwrap();
        assert_eq!(d.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_reports_all_modes() {
        use crate::eval::LabelledRow;

        let p = pipeline(true);
        let test = vec![
            LabelledRow { label: "Malaria".to_string(), text: "fever and chills".to_string() },
            LabelledRow { label: "Psoriasis".to_string(), text: "itchy skin rash".to_string() },
        ];
        let report = p.evaluate(&test, &[1, 3]).await;

        assert_eq!(report.test_samples, 2);
        let names: Vec<&str> = report.modes.iter().map(|m| m.mode.as_str()).collect();
        assert_eq!(names, vec!["kb_only", "classifier_only", "hybrid"]);
        assert!(report.classifier_macro.is_some());

        // This toy data is separable; every mode should get both right
        for mode in &report.modes {
            assert!(
                mode.top_k_accuracy[&1] > 0.99,
                "{} top-1 was {}",
                mode.mode,
                mode.top_k_accuracy[&1]
            );
        }
    }

    #[tokio::test]
    async fn test_no_symptoms_no_kb_candidates() {
        let p = pipeline(false);
        let req = DiagnosisRequest {
            text: "completely unrelated words".to_string(),
            top_n: 3,
            mode: PredictionMode::KbOnly,
            explain: false,
        };
        let d = p.diagnose(&req).await.unwrap();
        assert!(d.candidates.is_empty());
    }
}
