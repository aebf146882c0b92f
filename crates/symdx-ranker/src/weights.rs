//! Weight vector for score fusion.

use serde::{Deserialize, Serialize};

/// Fusion weights for the hybrid prediction mode. Weights sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightVector {
    /// Text classifier probability
    pub classifier: f64,
    /// Knowledge-graph Jaccard similarity
    pub knowledge_graph: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self { classifier: 0.6, knowledge_graph: 0.4 }
    }
}

impl WeightVector {
    /// Validate that the weights sum to ~1.0
    pub fn validate(&self) -> bool {
        let sum = self.classifier + self.knowledge_graph;
        (sum - 1.0).abs() < 1e-6
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.classifier + self.knowledge_graph;
        if sum > 0.0 {
            self.classifier /= sum;
            self.knowledge_graph /= sum;
        }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.classifier, self.knowledge_graph]
    }
}
