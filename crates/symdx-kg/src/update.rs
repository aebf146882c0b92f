//! Event-driven graph cache refresh.
//!
//! Ingestion and the agent tools emit `KgEvent`s after writing facts; the
//! queue worker reloads the in-memory `DiseaseGraph` snapshot so scoring
//! never reads a stale cache for long.

use std::sync::Arc;

use symdx_common::DiseaseId;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::repository::KgRepository;
use crate::scoring::DiseaseGraph;

#[derive(Debug, Clone)]
pub enum KgEvent {
    /// Facts were inserted or replaced for a disease.
    FactsInserted { disease_id: DiseaseId },
    /// A fact's confidence changed.
    ConfidenceChanged {
        disease_id: DiseaseId,
        old_confidence: f64,
        new_confidence: f64,
    },
}

/// Re-scoring is only worth it for meaningful confidence moves.
pub fn should_reload(old_confidence: f64, new_confidence: f64) -> bool {
    (new_confidence - old_confidence).abs() > 0.05
}

/// Start the background rescore queue worker. Returns the event sender.
pub fn start_rescore_queue(
    repo: KgRepository,
    cache: Arc<RwLock<DiseaseGraph>>,
) -> mpsc::UnboundedSender<KgEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<KgEvent>();

    tokio::spawn(async move {
        info!("Started KG rescore queue worker");

        while let Some(event) = rx.recv().await {
            let reload = match event {
                KgEvent::FactsInserted { disease_id } => {
                    info!(%disease_id, "facts inserted, reloading graph cache");
                    true
                }
                KgEvent::ConfidenceChanged { disease_id, old_confidence, new_confidence } => {
                    if should_reload(old_confidence, new_confidence) {
                        info!(%disease_id, old_confidence, new_confidence, "confidence moved, reloading graph cache");
                        true
                    } else {
                        false
                    }
                }
            };

            if reload {
                match repo.load_graph().await {
                    Ok(graph) => {
                        *cache.write().await = graph;
                    }
                    Err(e) => warn!("Failed to reload knowledge graph: {}", e),
                }
            }
        }
    });

    tx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_on_large_delta() {
        assert!(should_reload(0.5, 0.56));
        assert!(!should_reload(0.5, 0.53));
        assert!(should_reload(0.9, 0.1));
    }
}
