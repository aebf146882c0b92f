//! Dashboard — system overview.

use axum::{extract::State, response::Html};

use super::page;
use crate::state::SharedState;

pub async fn dashboard(State(state): State<SharedState>) -> Html<String> {
    let stats = state.db.stats().await.unwrap_or_default();
    let has_classifier = state.pipeline.has_classifier();
    let has_explainer = state.pipeline.has_explainer();

    let body = format!(
        r#"<h1>Dashboard</h1>
<p class="muted">Symptom-to-diagnosis engine: knowledge graph, text classifier, and grounded explanations.</p>
<div class="card">
  <table>
    <tr><th>Diseases</th><td class="score">{}</td></tr>
    <tr><th>Symptoms</th><td class="score">{}</td></tr>
    <tr><th>KG facts</th><td class="score">{}</td></tr>
    <tr><th>Explanation docs</th><td class="score">{}</td></tr>
    <tr><th>Classifier</th><td>{}</td></tr>
    <tr><th>Explanations</th><td>{}</td></tr>
  </table>
</div>
<div class="card">
  <a href="/diagnose"><button>Enter symptoms</button></a>
</div>"#,
        stats.diseases,
        stats.symptoms,
        stats.kg_facts,
        stats.docs,
        if has_classifier { "loaded" } else { "not loaded (KB-only mode)" },
        if has_explainer { "available" } else { "no LLM backend configured" },
    );

    Html(page("Dashboard", &body))
}
