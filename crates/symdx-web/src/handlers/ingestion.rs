//! Ingestion page and trigger endpoint.

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;
use tokio::sync::broadcast;

use super::page;
use crate::error::ApiError;
use crate::state::{AppEvent, SharedState};
use symdx_ingestion::{run_ingestion, IngestionProgress};

pub async fn ingestion_page(State(state): State<SharedState>) -> Html<String> {
    let job = &state.default_job;
    let body = format!(
        r#"<h1>Ingestion</h1>
<p class="muted">Rebuild the knowledge base from the symptom–disease dataset. Progress streams on /api/events.</p>
<div class="card">
  <table>
    <tr><th>Dataset</th><td>{}</td></tr>
    <tr><th>Candidate threshold</th><td class="score">&gt; {} rows</td></tr>
    <tr><th>Primary / secondary ratio</th><td class="score">{:.2} / {:.2}</td></tr>
    <tr><th>Embed docs</th><td>{}</td></tr>
    <tr><th>Enrichment</th><td>{}</td></tr>
  </table>
  <p><button onclick="fetch('/ingestion/run', {{method: 'POST'}}).then(() => location.reload())">Run ingestion</button></p>
</div>"#,
        job.dataset_path,
        job.min_candidate_count,
        job.primary_ratio,
        job.secondary_ratio,
        if job.embed_docs { "yes" } else { "no" },
        if job.enrich { "MedlinePlus + Wikidata" } else { "off" },
    );
    Html(page("Ingestion", &body))
}

#[derive(Debug, Deserialize, Default)]
pub struct RunRequest {
    /// Override the configured dataset path.
    pub dataset_path: Option<String>,
    pub enrich: Option<bool>,
}

/// POST /ingestion/run — start a run in the background. Returns 202-style
/// JSON immediately; progress streams via SSE.
pub async fn ingestion_run(
    State(state): State<SharedState>,
    body: Option<Json<RunRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let overrides = body.map(|Json(b)| b).unwrap_or_default();

    let mut job = state.default_job.clone();
    if let Some(path) = overrides.dataset_path {
        job.dataset_path = path;
    }
    if let Some(enrich) = overrides.enrich {
        job.enrich = enrich;
    }

    let (progress_tx, mut progress_rx) = broadcast::channel::<IngestionProgress>(64);

    // Bridge pipeline progress into the app event stream
    let events = state.clone();
    tokio::spawn(async move {
        while let Ok(p) = progress_rx.recv().await {
            events.notify(AppEvent::IngestionProgress {
                stage: p.stage,
                message: p.message,
                diseases: p.diseases,
                facts: p.facts,
            });
        }
    });

    let ctx = state.ingestion.clone();
    let notifier = state.clone();
    tokio::spawn(async move {
        let result = run_ingestion(job, ctx, Some(progress_tx)).await;
        let level = if result.errors.is_empty() { "info" } else { "warn" };
        notifier.notify(AppEvent::Notification {
            level: level.to_string(),
            message: format!(
                "Ingestion finished: {} diseases, {} facts, {} docs in {}ms",
                result.diseases, result.facts, result.docs_written, result.duration_ms
            ),
        });
    });

    Ok(Json(serde_json::json!({ "status": "started" })))
}
