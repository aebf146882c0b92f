//! Knowledge graph explorer.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{escape_html, page};
use crate::error::ApiError;
use crate::state::SharedState;
use symdx_common::normalize::normalize_label;
use symdx_db::KgFact;

#[derive(Debug, Deserialize, Default)]
pub struct KgFilter {
    pub disease: Option<String>,
    pub predicate: Option<String>,
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
}

// === API Types ===

#[derive(Debug, Serialize)]
pub struct ApiKgFact {
    pub disease: String,
    pub predicate: String,
    pub symptom: String,
    pub confidence: f64,
    pub evidence_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ApiKgStats {
    pub disease_count: u64,
    pub symptom_count: u64,
    pub fact_count: u64,
}

async fn filtered_facts(state: &SharedState, filter: &KgFilter) -> Result<Vec<KgFact>, ApiError> {
    let limit = filter.limit.unwrap_or(100).min(500);
    let facts = state.ingestion.kg.facts().list(0, 2000).await?;

    let disease = filter.disease.as_deref().map(normalize_label);
    let min_conf = filter.min_confidence.unwrap_or(0.0);

    Ok(facts
        .into_iter()
        .filter(|f| {
            disease
                .as_deref()
                .map(|d| normalize_label(&f.disease_name) == d)
                .unwrap_or(true)
        })
        .filter(|f| {
            filter
                .predicate
                .as_deref()
                .map(|p| f.predicate == p)
                .unwrap_or(true)
        })
        .filter(|f| f.confidence.map(|c| c as f64 >= min_conf).unwrap_or(min_conf <= 0.0))
        .take(limit)
        .collect())
}

// === API Endpoints ===

/// GET /api/kg — list facts with filters
pub async fn api_kg_facts(
    State(state): State<SharedState>,
    Query(filter): Query<KgFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let facts = filtered_facts(&state, &filter).await?;

    let api_facts: Vec<ApiKgFact> = facts
        .iter()
        .map(|f| ApiKgFact {
            disease: f.disease_name.clone(),
            predicate: f.predicate.clone(),
            symptom: f.symptom_name.clone(),
            confidence: f.confidence.map(|c| c as f64).unwrap_or(0.0),
            evidence_count: f.evidence_count,
        })
        .collect();

    Ok(Json(api_facts))
}

/// GET /api/kg/stats
pub async fn api_kg_stats(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.ingestion.kg.stats().await?;
    Ok(Json(ApiKgStats {
        disease_count: stats.diseases,
        symptom_count: stats.symptoms,
        fact_count: stats.facts,
    }))
}

// === Page ===

pub async fn kg_page(
    State(state): State<SharedState>,
    Query(filter): Query<KgFilter>,
) -> Result<Html<String>, ApiError> {
    let disease = filter.disease.clone().unwrap_or_default();
    let facts = filtered_facts(&state, &filter).await?;

    let rows: String = if facts.is_empty() {
        r#"<tr><td colspan="4" class="muted">No facts found. Run ingestion first.</td></tr>"#
            .to_string()
    } else {
        facts
            .iter()
            .map(|f| {
                format!(
                    r#"<tr>
  <td>{}</td>
  <td class="muted">{}</td>
  <td>{}</td>
  <td class="score">{:.2} ({} rows)</td>
</tr>"#,
                    escape_html(&f.disease_name),
                    escape_html(&f.predicate),
                    escape_html(&f.symptom_name),
                    f.confidence.unwrap_or(0.0),
                    f.evidence_count,
                )
            })
            .collect()
    };

    let body = format!(
        r#"<h1>Knowledge Graph</h1>
<p class="muted">Disease–symptom facts with role predicates, confidence, and evidence counts.</p>
<form method="GET" action="/kg" class="card">
  <input type="text" name="disease" placeholder="Disease name..." value="{}">
  <button type="submit">Filter</button>
</form>
<div class="card">
  <table>
    <thead><tr><th>Disease</th><th>Predicate</th><th>Symptom</th><th>Confidence</th></tr></thead>
    <tbody>{}</tbody>
  </table>
</div>"#,
        escape_html(&disease),
        rows,
    );

    Ok(Html(page("Knowledge Graph", &body)))
}
