//! End-to-end ingestion pipeline.
//!
//! Orchestrates the full flow for a single ingestion run:
//!   1. Read + validate dataset rows
//!   2. Mine candidate vocabulary, merge with the curated seed list
//!   3. Extract symptoms per row, aggregate per disease
//!   4. Upsert diseases, symptoms, and role-typed facts
//!   5. Generate one explanation doc per disease
//!   6. Embed docs (when an embedder is configured)
//!   7. Enrich diseases from MedlinePlus / Wikidata (best-effort)
//!   8. Emit progress events via broadcast channel
//!
//! Callable from both the web API and the agent binary. Non-destructive on
//! errors: it logs and continues.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use symdx_db::docs::DocRepository;
use symdx_db::{Disease, Doc, EMBEDDING_DIM};
use symdx_embed::SentenceEmbedder;
use symdx_kg::extraction::{build_fact_drafts, DiseaseObservations, RoleThresholds};
use symdx_kg::{KgEvent, KgRepository};
use symdx_ner::{mine_candidates, vocab::seed_vocabulary, SymptomMatcher};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dataset::DatasetReader;
use crate::docs_gen::explanation_doc;
use crate::sources::{MedlinePlusClient, WikidataClient};
use crate::summary::SummaryGenerator;

const ENRICHMENT_DELAY_MS: u64 = 200;

// ── Job config ────────────────────────────────────────────────────────────────

/// Parameters for a single ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionJob {
    pub dataset_path: String,
    /// Candidate mining threshold: keep terms seen in more rows than this.
    pub min_candidate_count: usize,
    pub primary_ratio: f64,
    pub secondary_ratio: f64,
    /// Embed the generated docs in this run (needs the embedder).
    pub embed_docs: bool,
    /// Fetch MedlinePlus summaries and Wikidata descriptions.
    pub enrich: bool,
}

impl Default for IngestionJob {
    fn default() -> Self {
        Self {
            dataset_path: "data/symptom2disease.csv".to_string(),
            min_candidate_count: 10,
            primary_ratio: 0.40,
            secondary_ratio: 0.10,
            embed_docs: true,
            enrich: false,
        }
    }
}

// ── Progress events ───────────────────────────────────────────────────────────

/// Progress event emitted during a pipeline run (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct IngestionProgress {
    pub job_id: Uuid,
    pub stage: String,
    pub message: String,
    pub rows_read: usize,
    pub diseases: usize,
    pub facts: usize,
    pub error: Option<String>,
}

impl IngestionProgress {
    fn new(job_id: Uuid, stage: &str, message: &str) -> Self {
        Self {
            job_id,
            stage: stage.to_string(),
            message: message.to_string(),
            rows_read: 0,
            diseases: 0,
            facts: 0,
            error: None,
        }
    }
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionResult {
    pub job_id: Option<Uuid>,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub vocabulary_size: usize,
    pub diseases: usize,
    pub symptoms: usize,
    pub facts: usize,
    pub docs_written: usize,
    pub docs_embedded: usize,
    pub enriched: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

// ── Shared dependencies ───────────────────────────────────────────────────────

/// Everything a run needs besides the job itself.
pub struct IngestionContext {
    pub kg: KgRepository,
    pub docs: DocRepository,
    pub embedder: Option<Arc<SentenceEmbedder>>,
    pub medline: Option<MedlinePlusClient>,
    pub wikidata: Option<WikidataClient>,
    /// LLM compressor for MedlinePlus summaries.
    pub summaries: Option<SummaryGenerator>,
    /// Rescore queue; notified after each disease's facts land.
    pub kg_events: Option<mpsc::UnboundedSender<KgEvent>>,
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

/// Run the ingestion pipeline for one job.
#[instrument(skip(ctx, progress_tx), fields(dataset = %job.dataset_path))]
pub async fn run_ingestion(
    job: IngestionJob,
    ctx: Arc<IngestionContext>,
    progress_tx: Option<broadcast::Sender<IngestionProgress>>,
) -> IngestionResult {
    let job_id = Uuid::new_v4();
    let t0 = std::time::Instant::now();
    let mut result = IngestionResult { job_id: Some(job_id), ..Default::default() };

    let emit = |stage: &str, message: &str, result: &IngestionResult| {
        if let Some(tx) = &progress_tx {
            let mut p = IngestionProgress::new(job_id, stage, message);
            p.rows_read = result.rows_read;
            p.diseases = result.diseases;
            p.facts = result.facts;
            let _ = tx.send(p);
        }
    };

    // 1. Dataset
    emit("dataset", "reading dataset", &result);
    let (rows, skipped) = match DatasetReader::read(&job.dataset_path) {
        Ok(r) => r,
        Err(e) => {
            warn!("dataset read failed: {}", e);
            result.errors.push(e.to_string());
            result.duration_ms = t0.elapsed().as_millis() as u64;
            return result;
        }
    };
    result.rows_read = rows.len();
    result.rows_skipped = skipped;
    info!(rows = rows.len(), skipped, "dataset loaded");

    // 2. Vocabulary
    emit("vocabulary", "mining candidate vocabulary", &result);
    let mut vocabulary = seed_vocabulary();
    let mined = mine_candidates(
        rows.iter().map(|r| r.text.as_str()),
        job.min_candidate_count,
        3,
    );
    debug!(mined = mined.len(), "candidate terms mined");
    vocabulary.extend(mined);

    let matcher = match SymptomMatcher::new(&vocabulary) {
        Ok(m) => m,
        Err(e) => {
            result.errors.push(e.to_string());
            result.duration_ms = t0.elapsed().as_millis() as u64;
            return result;
        }
    };
    result.vocabulary_size = matcher.vocabulary().len();

    // 3. Extract + aggregate
    emit("extract", "extracting symptoms from rows", &result);
    let mut observations: HashMap<String, DiseaseObservations> = HashMap::new();
    for row in &rows {
        let hits = matcher.extract(&row.text);
        // Fallback chunks are for the interactive path, not KG evidence
        let symptoms: Vec<String> = hits
            .into_iter()
            .filter(|h| !h.fallback)
            .map(|h| h.text)
            .collect();
        observations
            .entry(row.label.clone())
            .or_default()
            .observe(&symptoms);
    }

    // 4. Store graph, 5. docs, 6. embeddings — per disease, deterministic order
    let thresholds = RoleThresholds {
        primary_ratio: job.primary_ratio,
        secondary_ratio: job.secondary_ratio,
    };

    let mut disease_names: Vec<&String> = observations.keys().collect();
    disease_names.sort();

    for name in disease_names {
        let obs = &observations[name];
        let drafts = build_fact_drafts(obs, thresholds);
        if drafts.is_empty() {
            debug!(disease = %name, "no symptoms found, skipping");
            continue;
        }

        let disease = Disease::new(name.clone());

        emit("graph", &format!("storing facts for {}", name), &result);
        match ctx.kg.upsert_disease_graph(&disease, &drafts).await {
            Ok(n) => {
                result.diseases += 1;
                result.facts += n;
                if let Some(events) = &ctx.kg_events {
                    let _ = events.send(KgEvent::FactsInserted { disease_id: disease.id });
                }
            }
            Err(e) => {
                warn!(disease = %name, "failed to store subgraph: {}", e);
                result.errors.push(format!("{}: {}", name, e));
                continue;
            }
        }

        // Explanation doc
        let symptom_names: Vec<String> = drafts.iter().map(|d| d.symptom.clone()).collect();
        let content = explanation_doc(name, &symptom_names);
        let mut doc = Doc::new(disease.id, name.clone(), content);

        if job.embed_docs {
            if let Some(embedder) = &ctx.embedder {
                match embedder.embed_one(&doc.content).await {
                    Ok(emb) if emb.len() == EMBEDDING_DIM => {
                        doc.embedding = Some(emb);
                        result.docs_embedded += 1;
                    }
                    Ok(emb) => {
                        warn!(disease = %name, dim = emb.len(), "unexpected embedding dimension");
                    }
                    Err(e) => warn!(disease = %name, "doc embedding failed: {}", e),
                }
            }
        }

        match ctx.docs.replace_for_disease(disease.id, &[doc]).await {
            Ok(()) => result.docs_written += 1,
            Err(e) => {
                warn!(disease = %name, "failed to store doc: {}", e);
                result.errors.push(format!("{}: {}", name, e));
            }
        }
    }

    result.symptoms = ctx.kg.stats().await.map(|s| s.symptoms as usize).unwrap_or(0);

    // 7. Enrichment (best-effort)
    if job.enrich {
        emit("enrich", "fetching reference material", &result);
        result.enriched = enrich_diseases(&ctx).await;
    }

    result.duration_ms = t0.elapsed().as_millis() as u64;
    emit("done", "ingestion complete", &result);
    info!(
        diseases = result.diseases,
        facts = result.facts,
        docs = result.docs_written,
        errors = result.errors.len(),
        "ingestion finished in {}ms",
        result.duration_ms
    );

    result
}

/// Fill in MedlinePlus and Wikidata fields for every stored disease, then
/// compress the fetched reference summaries with the LLM. Each network
/// failure is logged and skipped.
async fn enrich_diseases(ctx: &IngestionContext) -> usize {
    let diseases = match ctx.kg.diseases().all().await {
        Ok(d) => d,
        Err(e) => {
            warn!("cannot list diseases for enrichment: {}", e);
            return 0;
        }
    };

    let mut enriched = 0;
    let mut full_summaries: Vec<(String, String)> = Vec::new();

    for mut disease in diseases {
        let mut changed = false;

        if let Some(medline) = &ctx.medline {
            match medline.fetch_topic(&disease.name).await {
                Ok(Some(topic)) => {
                    if disease.medline_url.is_none() {
                        disease.medline_url = topic.url;
                        changed = true;
                    }
                    if !topic.full_summary.is_empty() {
                        full_summaries.push((disease.name.clone(), topic.full_summary.clone()));
                        if disease.summary.is_none() {
                            // Raw summary; the LLM pass below shortens it
                            disease.summary = Some(topic.full_summary);
                            changed = true;
                        }
                    }
                }
                Ok(None) => debug!(disease = %disease.name, "no MedlinePlus topic"),
                Err(e) => warn!(disease = %disease.name, "MedlinePlus lookup failed: {}", e),
            }
            // Be polite to the shared endpoint
            tokio::time::sleep(std::time::Duration::from_millis(ENRICHMENT_DELAY_MS)).await;
        }

        if let (Some(wikidata), Some(qid)) = (&ctx.wikidata, disease.wikidata_id.clone()) {
            match wikidata.fetch_disease_info(&qid).await {
                Ok(Some(info)) => {
                    if disease.description.is_none() {
                        disease.description = info.description;
                        changed = true;
                    }
                }
                Ok(None) => debug!(disease = %disease.name, qid, "no Wikidata info"),
                Err(e) => warn!(disease = %disease.name, "Wikidata lookup failed: {}", e),
            }
        }

        if changed {
            disease.updated_at = chrono::Utc::now();
            match ctx.kg.diseases().upsert(&disease).await {
                Ok(()) => enriched += 1,
                Err(e) => warn!(disease = %disease.name, "failed to store enrichment: {}", e),
            }
        }
    }

    // LLM compression pass over everything MedlinePlus returned
    if let Some(generator) = &ctx.summaries {
        if !full_summaries.is_empty() {
            match generator.generate(&full_summaries).await {
                Ok(compressed) => {
                    for (name, summary) in compressed {
                        let canonical = symdx_common::normalize::normalize_label(&name);
                        match ctx.kg.diseases().find_by_canonical_name(&canonical).await {
                            Ok(Some(mut disease)) => {
                                disease.summary = Some(summary);
                                disease.updated_at = chrono::Utc::now();
                                if let Err(e) = ctx.kg.diseases().upsert(&disease).await {
                                    warn!(disease = %name, "failed to store summary: {}", e);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => warn!(disease = %name, "summary lookup failed: {}", e),
                        }
                    }
                }
                Err(e) => warn!("summary generation failed: {}", e),
            }
        }
    }

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_job_matches_role_thresholds() {
        let job = IngestionJob::default();
        assert!((job.primary_ratio - 0.40).abs() < 1e-9);
        assert!((job.secondary_ratio - 0.10).abs() < 1e-9);
        assert_eq!(job.min_candidate_count, 10);
    }

    #[test]
    fn test_progress_event_serializes() {
        let p = IngestionProgress::new(Uuid::nil(), "dataset", "reading");
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"stage\":\"dataset\""));
    }
}
