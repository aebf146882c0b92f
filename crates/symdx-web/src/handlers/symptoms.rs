//! Symptom vocabulary endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ApiError;
use crate::state::SharedState;

/// GET /api/symptoms — every symptom label the knowledge graph knows,
/// sorted. The UI uses this for autocomplete.
pub async fn api_symptoms(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let graph = state.pipeline.graph();
    let symptoms = graph.read().await.all_symptoms();
    Ok(Json(symptoms))
}
