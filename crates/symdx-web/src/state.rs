//! Shared application state for the web server.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use symdx_db::Database;
use symdx_ingestion::IngestionContext;
use symdx_ranker::eval::{EvaluationReport, LabelledRow};
use symdx_ranker::DiagnosisPipeline;
use tokio::sync::{broadcast, RwLock};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A diagnosis finished
    DiagnosisCompleted { mode: String, top_disease: Option<String>, score: Option<f64>, total_ms: u64 },
    /// Ingestion pipeline status update
    IngestionProgress { stage: String, message: String, diseases: usize, facts: usize },
    /// Facts were written for a disease
    FactsInserted { disease: String },
    /// An evaluation run finished
    EvaluationCompleted { test_samples: usize },
    /// General system notification
    Notification { level: String, message: String },
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub pipeline: Arc<DiagnosisPipeline>,
    pub ingestion: Arc<IngestionContext>,
    /// Default job parameters for runs triggered from the UI.
    pub default_job: symdx_ingestion::IngestionJob,
    /// Held-out rows prepared at startup, used by /metrics runs.
    pub eval_rows: Arc<Vec<LabelledRow>>,
    pub eval_report: Arc<RwLock<Option<EvaluationReport>>>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        pipeline: Arc<DiagnosisPipeline>,
        ingestion: Arc<IngestionContext>,
        default_job: symdx_ingestion::IngestionJob,
        eval_rows: Vec<LabelledRow>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            db,
            pipeline,
            ingestion,
            default_job,
            eval_rows: Arc::new(eval_rows),
            eval_report: Arc::new(RwLock::new(None)),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    pub fn notify(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
