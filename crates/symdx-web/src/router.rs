//! Axum router — maps all URL paths to handlers.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    dashboard::dashboard,
    diagnose::{api_diagnose, diagnose_page, diagnose_submit},
    ingestion::{ingestion_page, ingestion_run},
    kg::{api_kg_facts, api_kg_stats, kg_page},
    metrics::{api_metrics, metrics_page, metrics_run},
    symptoms::api_symptoms,
};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Pages
        .route("/", get(dashboard))
        .route("/diagnose", get(diagnose_page).post(diagnose_submit))
        .route("/kg", get(kg_page))
        .route("/ingestion", get(ingestion_page))
        .route("/ingestion/run", post(ingestion_run))
        .route("/metrics", get(metrics_page))
        .route("/metrics/run", post(metrics_run))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // API endpoints
        .route("/api/diagnose", post(api_diagnose))
        .route("/api/symptoms", get(api_symptoms))
        .route("/api/kg", get(api_kg_facts))
        .route("/api/kg/stats", get(api_kg_stats))
        .route("/api/metrics", get(api_metrics))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
