//! symdx — symptom-to-diagnosis engine.
//! Entry point: wires storage, models, the knowledge graph, the LLM
//! router, and the web UI. Missing pieces degrade with a warning instead
//! of refusing to start: no classifier means KB-only predictions, no LLM
//! backend means no explanations.

mod config;

use std::sync::Arc;

use symdx_db::docs::DocRepository;
use symdx_db::Database;
use symdx_embed::{CanonicalSymptom, SentenceEmbedder, SymptomCanonicalizer};
use symdx_ingestion::{DatasetReader, IngestionContext, IngestionJob};
use symdx_kg::{start_rescore_queue, DiseaseGraph, KgRepository};
use symdx_llm::{
    AuditLog, ExplainerDoc, LlmRouter, OllamaBackend, OpenAiCompatibleBackend, RagExplainer,
    RoutingPolicy,
};
use symdx_ner::{vocab::seed_vocabulary, SymptomMatcher};
use symdx_ranker::eval::{train_test_split, LabelledRow};
use symdx_ranker::{DiagnosisPipeline, DiseaseClassifier, TrainConfig, WeightVector};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn build_llm_router(config: &config::Config) -> LlmRouter {
    let policy = RoutingPolicy {
        local_only_mode: config.llm.mode == "local_only",
        allow_internal_remote: false,
        default_backend: config.llm.default_backend.clone(),
        local_backend: config.llm.local_backend.clone(),
    };

    let mut router = LlmRouter::new(policy);

    if let Some(ref ollama) = config.llm.ollama {
        router.register_backend(
            "ollama",
            Arc::new(OllamaBackend::new(&ollama.base_url, &ollama.model)),
        );
    }

    if let Some(ref compat) = config.llm.openai_compatible {
        let key = if compat.api_key.is_empty() {
            std::env::var("SYMDX_COMPAT_API_KEY").ok()
        } else {
            Some(compat.api_key.clone())
        };
        let mut backend = OpenAiCompatibleBackend::new(&compat.base_url, &compat.model, key);
        if let Some(ref emb) = compat.embedding_model {
            backend = backend.with_embedding_model(emb);
        }
        router.register_backend("openai_compatible", Arc::new(backend));
    }

    if router.registered_backends().is_empty() {
        warn!(
            "No LLM backends configured! Add at least one provider to symdx.toml. \
             Explanations and summary generation will be unavailable."
        );
    }

    router.with_audit_log(AuditLog::new(&config.llm.audit_log))
}

/// Load the saved classifier, or train one from the dataset's train split.
fn load_or_train_classifier(
    config: &config::Config,
    train_rows: &[LabelledRow],
) -> Option<DiseaseClassifier> {
    let path = std::path::Path::new(&config.ranker.model_path);

    if path.exists() {
        match DiseaseClassifier::load(path) {
            Ok(clf) => {
                info!(path = %path.display(), classes = clf.labels().len(), "classifier loaded");
                return Some(clf);
            }
            Err(e) => warn!("Failed to load classifier from {}: {}", path.display(), e),
        }
    }

    if !config.ranker.train_on_start {
        return None;
    }
    if train_rows.is_empty() {
        warn!("No training rows available; predictions degrade to KB-only");
        return None;
    }

    let texts: Vec<String> = train_rows.iter().map(|r| r.text.clone()).collect();
    let labels: Vec<String> = train_rows.iter().map(|r| r.label.clone()).collect();
    let train_config = TrainConfig { seed: config.ranker.seed, ..Default::default() };

    match DiseaseClassifier::train(&texts, &labels, &train_config) {
        Ok(clf) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = clf.save(path) {
                warn!("Could not save trained classifier: {}", e);
            } else {
                info!(path = %path.display(), "classifier trained and saved");
            }
            Some(clf)
        }
        Err(e) => {
            warn!("Classifier training failed: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("symdx=debug,info")),
        )
        .init();

    info!("symdx starting up");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match config::Config::load() {
        Ok(c) => {
            info!("Configuration loaded. LLM mode: {}", c.llm.mode);
            c
        }
        Err(e) => {
            warn!("Could not load symdx.toml: {e}");
            warn!("Copy symdx.example.toml to symdx.toml and edit it.");
            return Ok(());
        }
    };

    // Storage
    info!("Opening LanceDB at {}", config.database.path);
    let db = Database::open(&config.database.path).await?;
    db.initialize().await?;
    let db = Arc::new(db);
    info!("Database ready.");

    // LLM router
    let router = Arc::new(build_llm_router(&config));
    info!("LLM router ready: {} backends registered.", router.registered_backends().len());

    // Embedder (model download; degrade without it)
    let embedder = if config.embedding.disabled {
        info!("Embeddings disabled in config.");
        None
    } else {
        let embed_config = symdx_embed::EmbeddingConfig {
            model_id: config.embedding.model_id.clone(),
            dimension: config.embedding.dimension,
            batch_size: config.embedding.batch_size,
            cache_size: config.embedding.cache_size,
            use_gpu: config.embedding.use_gpu,
            ..Default::default()
        };
        match SentenceEmbedder::new(embed_config).await {
            Ok(e) => Some(Arc::new(e)),
            Err(e) => {
                warn!("Embedder unavailable ({}); canonicalization and explanations disabled", e);
                None
            }
        }
    };

    // Dataset split (train feeds the classifier, test feeds /metrics)
    let (train_rows, test_rows) = match DatasetReader::read(&config.ingestion.dataset_path) {
        Ok((rows, _skipped)) => {
            let labelled: Vec<LabelledRow> = rows
                .into_iter()
                .map(|r| LabelledRow { label: r.label, text: r.text })
                .collect();
            train_test_split(&labelled, config.ranker.test_ratio, config.ranker.seed)
        }
        Err(e) => {
            warn!("Dataset not readable ({}); run ingestion with a valid path later", e);
            (Vec::new(), Vec::new())
        }
    };

    // Classifier
    let classifier = load_or_train_classifier(&config, &train_rows);
    if classifier.is_none() {
        warn!("No classifier available; predictions degrade to KB-only");
    }

    // Knowledge graph cache
    let kg = KgRepository::new(db.clone());
    let graph = match kg.load_graph().await {
        Ok(g) => g,
        Err(e) => {
            warn!("Knowledge graph empty ({}); run ingestion to populate it", e);
            DiseaseGraph::default()
        }
    };
    let graph = Arc::new(RwLock::new(graph));
    let kg_events = start_rescore_queue(kg.clone(), graph.clone());
    info!("KG rescore queue started.");

    // Symptom matcher over the stored vocabulary (seed as fallback)
    let mut vocabulary: Vec<String> = graph.read().await.all_symptoms();
    if vocabulary.is_empty() {
        vocabulary = seed_vocabulary();
    }
    let matcher = SymptomMatcher::new(&vocabulary)?;
    info!("Symptom matcher ready: {} phrases.", matcher.vocabulary().len());

    // Canonicalizer (needs the embedder and a vocabulary)
    let canonicalizer = match &embedder {
        Some(embedder) => {
            let vocab: Vec<CanonicalSymptom> = graph
                .read()
                .await
                .all_symptoms()
                .into_iter()
                .map(|text| CanonicalSymptom {
                    id: symdx_common::SymptomId::from_label(&text),
                    text,
                })
                .collect();
            if vocab.is_empty() {
                None
            } else {
                match SymptomCanonicalizer::build(embedder.clone(), vocab).await {
                    Ok(c) => {
                        let c = c.with_thresholds(
                            config.canonicalizer.accept_threshold,
                            config.canonicalizer.ambiguity_delta,
                        );
                        info!("Canonicalizer ready: {} vocabulary entries.", c.vocabulary_len());
                        Some(Arc::new(c))
                    }
                    Err(e) => {
                        warn!("Canonicalizer build failed: {}", e);
                        None
                    }
                }
            }
        }
        None => None,
    };

    // RAG explainer over stored docs
    let doc_repo = DocRepository::new(db.clone());
    let explainer = match (&embedder, router.registered_backends().is_empty()) {
        (Some(embedder), false) => {
            let docs: Vec<ExplainerDoc> = doc_repo
                .all()
                .await
                .unwrap_or_default()
                .into_iter()
                .map(|d| ExplainerDoc {
                    title: d.title,
                    content: d.content,
                    embedding: d.embedding,
                })
                .collect();
            if docs.is_empty() {
                warn!("No explanation docs stored; explanations disabled until ingestion runs");
                None
            } else {
                match RagExplainer::build(router.clone(), embedder.clone(), docs).await {
                    Ok(e) => {
                        info!("Explainer ready: {} docs indexed.", e.doc_count());
                        Some(Arc::new(e))
                    }
                    Err(e) => {
                        warn!("Explainer build failed: {}", e);
                        None
                    }
                }
            }
        }
        _ => None,
    };

    // Diagnosis pipeline
    let weights = WeightVector {
        classifier: config.ranker.classifier_weight,
        knowledge_graph: config.ranker.kg_weight,
    };
    let pipeline = Arc::new(DiagnosisPipeline::new(
        matcher,
        canonicalizer,
        classifier,
        graph,
        explainer,
        weights,
    ));

    // Ingestion context for web-triggered runs
    let default_job = IngestionJob {
        dataset_path: config.ingestion.dataset_path.clone(),
        min_candidate_count: config.ingestion.min_candidate_count,
        primary_ratio: config.ingestion.primary_ratio,
        secondary_ratio: config.ingestion.secondary_ratio,
        embed_docs: config.ingestion.embed_docs,
        enrich: config.ingestion.enrich,
    };
    let ingestion = Arc::new(IngestionContext {
        kg,
        docs: doc_repo,
        embedder: embedder.clone(),
        medline: config
            .ingestion
            .enrich
            .then(symdx_ingestion::sources::MedlinePlusClient::new),
        wikidata: config
            .ingestion
            .enrich
            .then(symdx_ingestion::sources::WikidataClient::default),
        summaries: (config.ingestion.enrich && !router.registered_backends().is_empty()).then(
            || {
                symdx_ingestion::summary::SummaryGenerator::new(
                    router.clone(),
                    "./data/disease-summaries.json",
                )
            },
        ),
        kg_events: Some(kg_events),
    });

    // Web UI
    let state = symdx_web::AppState::new(db, pipeline, ingestion, default_job, test_rows);
    let app = symdx_web::build_router(state);

    let bind_addr = std::env::var("SYMDX_BIND").unwrap_or_else(|_| config.web.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Web UI listening on http://{}", bind_addr);
    info!("  Diagnose:        http://{}/diagnose", bind_addr);
    info!("  KG explorer:     http://{}/kg", bind_addr);
    info!("  Ingestion:       http://{}/ingestion", bind_addr);
    info!("  Evaluation:      http://{}/metrics", bind_addr);
    info!("symdx ready. Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;

    Ok(())
}
