//! End-to-end ingestion pipeline against a throwaway LanceDB store.
//!
//! Run with:
//! ```bash
//! cargo test --package symdx-ingestion --test ingestion_e2e -- --ignored --nocapture
//! ```

use std::io::Write;
use std::sync::Arc;

use symdx_db::docs::DocRepository;
use symdx_db::Database;
use symdx_ingestion::{run_ingestion, IngestionContext, IngestionJob};
use symdx_kg::KgRepository;

fn sample_csv() -> &'static str {
    "label,text\n\
     Malaria,I have a high fever with chills and sweating every night\n\
     Malaria,fever and chills again with a bad headache\n\
     Malaria,shivering with fever and muscle pain\n\
     Psoriasis,itchy skin rash with red spots and peeling skin\n\
     Psoriasis,my skin rash is itching and there are red spots\n\
     Psoriasis,dry skin with itching and a skin rash\n"
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Writes a local LanceDB dataset; run explicitly
async fn test_ingestion_builds_graph_and_docs() {
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("dataset.csv");
    let mut f = std::fs::File::create(&csv_path).unwrap();
    f.write_all(sample_csv().as_bytes()).unwrap();

    let db = Database::open(dir.path().join("db")).await.unwrap();
    db.initialize().await.unwrap();
    let db = Arc::new(db);

    let ctx = Arc::new(IngestionContext {
        kg: KgRepository::new(db.clone()),
        docs: DocRepository::new(db.clone()),
        embedder: None,
        medline: None,
        wikidata: None,
        summaries: None,
        kg_events: None,
    });

    let job = IngestionJob {
        dataset_path: csv_path.to_string_lossy().to_string(),
        min_candidate_count: 1,
        embed_docs: false,
        enrich: false,
        ..Default::default()
    };

    let result = run_ingestion(job, ctx.clone(), None).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.rows_read, 6);
    assert_eq!(result.diseases, 2);
    assert!(result.facts > 0);
    assert_eq!(result.docs_written, 2);

    // The graph must load and rank
    let graph = ctx.kg.load_graph().await.unwrap();
    assert_eq!(graph.disease_count(), 2);

    let ranked = graph.rank_labels(&["fever".to_string(), "chills".to_string()], None);
    assert!(!ranked.is_empty());
    assert_eq!(ranked[0].disease_name, "Malaria");

    // Docs contain the disclaimer
    let docs = ctx.docs.all().await.unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs
        .iter()
        .all(|d| d.content.contains("does not constitute a medical diagnosis")));

    // Re-running replaces rather than duplicates
    let job2 = IngestionJob {
        dataset_path: csv_path.to_string_lossy().to_string(),
        min_candidate_count: 1,
        embed_docs: false,
        enrich: false,
        ..Default::default()
    };
    let result2 = run_ingestion(job2, ctx.clone(), None).await;
    assert_eq!(result2.diseases, 2);
    assert_eq!(ctx.docs.all().await.unwrap().len(), 2);
}
