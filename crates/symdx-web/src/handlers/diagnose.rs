//! Symptom entry and diagnosis — the main user flow.

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::{Form, Json};
use serde::Deserialize;

use super::{escape_html, page};
use crate::error::ApiError;
use crate::state::{AppEvent, SharedState};
use symdx_ranker::{Diagnosis, DiagnosisRequest, PredictionMode};

const INTRO: &str = "Describe your symptoms in your own words. The system extracts \
symptom phrases, matches them against a medical knowledge graph, and (when a model \
is loaded) a text classifier. Predictions are not a medical diagnosis.";

fn diagnose_form(text: &str, top_n: usize, mode: &str, explain: bool) -> String {
    let selected = |value: &str| if value == mode { " selected" } else { "" };
    let top_selected = |value: usize| if value == top_n { " selected" } else { "" };
    format!(
        r#"<h1>Diagnose</h1>
<p class="muted">{}</p>
<form method="POST" action="/diagnose" class="card">
  <textarea name="text" rows="6" style="width:100%" placeholder="Enter your text">{}</textarea>
  <p>
    <label>Results:
      <select name="top_n">
        <option value="1"{}>Top 1</option>
        <option value="3"{}>Top 3</option>
        <option value="5"{}>Top 5</option>
      </select>
    </label>
    <label>Mode:
      <select name="mode">
        <option value="kb"{}>Only KB</option>
        <option value="classifier"{}>Only classifier</option>
        <option value="both"{}>Both</option>
      </select>
    </label>
    <label><input type="checkbox" name="explain" value="on"{}> Explanation</label>
  </p>
  <button type="submit">Predict</button>
</form>"#,
        INTRO,
        escape_html(text),
        top_selected(1),
        top_selected(3),
        top_selected(5),
        selected("kb"),
        selected("classifier"),
        selected("both"),
        if explain { " checked" } else { "" },
    )
}

pub async fn diagnose_page(State(_state): State<SharedState>) -> Html<String> {
    Html(page("Diagnose", &diagnose_form("", 3, "both", true)))
}

#[derive(Debug, Deserialize)]
pub struct DiagnoseForm {
    pub text: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub explain: Option<String>,
}

fn default_top_n() -> usize {
    3
}

fn default_mode() -> String {
    "both".to_string()
}

impl DiagnoseForm {
    fn into_request(self) -> Result<DiagnosisRequest, ApiError> {
        let mode: PredictionMode = self
            .mode
            .parse()
            .map_err(|e: String| ApiError::BadRequest(e))?;
        if self.text.trim().is_empty() {
            return Err(ApiError::BadRequest("Enter some symptom text first".to_string()));
        }
        Ok(DiagnosisRequest {
            text: self.text,
            top_n: self.top_n.clamp(1, 10),
            mode,
            explain: self.explain.as_deref() == Some("on"),
        })
    }
}

async fn run_diagnosis(
    state: &SharedState,
    request: &DiagnosisRequest,
) -> Result<Diagnosis, ApiError> {
    let diagnosis = state.pipeline.diagnose(request).await?;

    state.notify(AppEvent::DiagnosisCompleted {
        mode: request.mode.to_string(),
        top_disease: diagnosis.candidates.first().map(|c| c.disease_name.clone()),
        score: diagnosis.candidates.first().map(|c| c.score),
        total_ms: diagnosis.timings.total_ms,
    });

    Ok(diagnosis)
}

pub async fn diagnose_submit(
    State(state): State<SharedState>,
    Form(form): Form<DiagnoseForm>,
) -> Result<Html<String>, ApiError> {
    let text = form.text.clone();
    let top_n = form.top_n;
    let mode_raw = form.mode.clone();
    let explain = form.explain.as_deref() == Some("on");

    let request = form.into_request()?;
    let diagnosis = run_diagnosis(&state, &request).await?;

    let rows: String = if diagnosis.candidates.is_empty() {
        r#"<tr><td colspan="4" class="muted">No matching diseases. Try describing more symptoms.</td></tr>"#
            .to_string()
    } else {
        diagnosis
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    r#"<tr>
  <td>#{}</td>
  <td>{}</td>
  <td class="score">{:.1}%</td>
  <td class="muted">{}</td>
</tr>"#,
                    i + 1,
                    escape_html(&c.disease_name),
                    c.score * 100.0,
                    escape_html(&c.matched_symptoms.join(", ")),
                )
            })
            .collect()
    };

    let explanation_html = match &diagnosis.explanation {
        Some(text) => format!(
            r#"<div class="card"><h2>Explanation</h2><p>{}</p></div>"#,
            escape_html(text)
        ),
        None => String::new(),
    };

    let ambiguous_html = if diagnosis.ambiguous.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="muted">Could not confidently map: {}</p>"#,
            escape_html(&diagnosis.ambiguous.join(", "))
        )
    };

    let t = &diagnosis.timings;
    let body = format!(
        r#"{}
<div class="card">
  <h2>Top diseases</h2>
  <p class="muted">Recognised symptoms: {}</p>
  {}
  <table>
    <thead><tr><th></th><th>Disease</th><th>Score</th><th>Matched symptoms</th></tr></thead>
    <tbody>{}</tbody>
  </table>
</div>
{}
<div class="card">
  <h2>Performance</h2>
  <p class="muted score">extract {}ms · canonicalize {}ms · classify {}ms · knowledge graph {}ms · explain {}ms · total {}ms</p>
</div>"#,
        diagnose_form(&text, top_n, &mode_raw, explain),
        escape_html(&diagnosis.extracted.join(", ")),
        ambiguous_html,
        rows,
        explanation_html,
        t.extract_ms,
        t.canonicalize_ms,
        t.classify_ms,
        t.kg_ms,
        t.explain_ms,
        t.total_ms,
    );

    Ok(Html(page("Diagnose", &body)))
}

// ── JSON API ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApiDiagnoseRequest {
    pub text: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub explain: bool,
}

/// POST /api/diagnose
pub async fn api_diagnose(
    State(state): State<SharedState>,
    Json(req): Json<ApiDiagnoseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mode: PredictionMode = req.mode.parse().map_err(|e: String| ApiError::BadRequest(e))?;
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let request = DiagnosisRequest {
        text: req.text,
        top_n: req.top_n.clamp(1, 10),
        mode,
        explain: req.explain,
    };
    let diagnosis = run_diagnosis(&state, &request).await?;
    Ok(Json(diagnosis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_parses_modes() {
        let form = DiagnoseForm {
            text: "fever".to_string(),
            top_n: 3,
            mode: "kb".to_string(),
            explain: Some("on".to_string()),
        };
        let req = form.into_request().unwrap();
        assert_eq!(req.mode, PredictionMode::KbOnly);
        assert!(req.explain);
    }

    #[test]
    fn test_form_rejects_empty_text() {
        let form = DiagnoseForm {
            text: "   ".to_string(),
            top_n: 3,
            mode: "both".to_string(),
            explain: None,
        };
        assert!(form.into_request().is_err());
    }

    #[test]
    fn test_form_clamps_top_n() {
        let form = DiagnoseForm {
            text: "fever".to_string(),
            top_n: 99,
            mode: "both".to_string(),
            explain: None,
        };
        assert_eq!(form.into_request().unwrap().top_n, 10);
    }

    #[test]
    fn test_form_rejects_unknown_mode() {
        let form = DiagnoseForm {
            text: "fever".to_string(),
            top_n: 3,
            mode: "magic".to_string(),
            explain: None,
        };
        assert!(form.into_request().is_err());
    }
}
