//! Evaluation page — per-mode accuracy on the held-out split.

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;

use super::page;
use crate::error::ApiError;
use crate::state::{AppEvent, SharedState};
use symdx_ranker::eval::EvaluationReport;

fn render_report(report: &EvaluationReport) -> String {
    let mut rows = String::new();
    for mode in &report.modes {
        let mut ks: Vec<&usize> = mode.top_k_accuracy.keys().collect();
        ks.sort();
        let cells: String = ks
            .iter()
            .map(|k| format!(r#"<td class="score">{:.1}%</td>"#, mode.top_k_accuracy[k] * 100.0))
            .collect();
        rows.push_str(&format!(
            r#"<tr><td>{}</td>{}</tr>"#,
            mode.mode, cells
        ));
    }

    let macro_html = match &report.classifier_macro {
        Some(m) => format!(
            r#"<p class="muted score">classifier macro: precision {:.3} · recall {:.3} · F1 {:.3}</p>"#,
            m.precision, m.recall, m.f1
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="card">
  <p class="muted">Held-out samples: {}</p>
  <table>
    <thead><tr><th>Mode</th><th>Top-1</th><th>Top-3</th><th>Top-5</th></tr></thead>
    <tbody>{}</tbody>
  </table>
  {}
</div>"#,
        report.test_samples, rows, macro_html
    )
}

pub async fn metrics_page(State(state): State<SharedState>) -> Html<String> {
    let report = state.eval_report.read().await;

    let content = match report.as_ref() {
        Some(r) => render_report(r),
        None => format!(
            r#"<div class="card">
  <p class="muted">No evaluation run yet ({} held-out rows prepared).</p>
  <button onclick="fetch('/metrics/run', {{method: 'POST'}}).then(() => setTimeout(() => location.reload(), 2000))">Run evaluation</button>
</div>"#,
            state.eval_rows.len()
        ),
    };

    let body = format!(
        r#"<h1>Evaluation</h1>
<p class="muted">Accuracy of each prediction mode against the same held-out dataset rows.</p>
{}"#,
        content
    );
    Html(page("Evaluation", &body))
}

/// POST /metrics/run — evaluate all modes in the background.
pub async fn metrics_run(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    if state.eval_rows.is_empty() {
        return Err(ApiError::BadRequest(
            "No held-out rows available; configure the dataset path first".to_string(),
        ));
    }

    let runner = state.clone();
    tokio::spawn(async move {
        let report = runner.pipeline.evaluate(&runner.eval_rows, &[1, 3, 5]).await;
        let samples = report.test_samples;
        *runner.eval_report.write().await = Some(report);
        runner.notify(AppEvent::EvaluationCompleted { test_samples: samples });
    });

    Ok(Json(serde_json::json!({ "status": "started" })))
}

/// GET /api/metrics — the latest evaluation report.
pub async fn api_metrics(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let report = state.eval_report.read().await;
    match report.as_ref() {
        Some(r) => Ok(Json(serde_json::to_value(r).map_err(|e| ApiError::Internal(e.to_string()))?)),
        None => Err(ApiError::NotFound("No evaluation has been run yet".to_string())),
    }
}
