//! Multinomial logistic regression over TF-IDF features.
//!
//! Trained by full-batch gradient descent with L2 regularization and a
//! seeded shuffle, so training is reproducible run to run. Feature vectors
//! are sparse; the weight matrix is dense (classes × features).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tfidf::{SparseVec, TfidfVectorizer, DEFAULT_MAX_FEATURES};
use crate::{RankerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    pub l2: f32,
    pub seed: u64,
    pub max_features: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            learning_rate: 1.0,
            l2: 1e-4,
            seed: 42,
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

/// Deterministic LCG, used for shuffling. Good enough for epoch ordering;
/// not a statistics-grade generator.
pub(crate) struct Lcg(u64);

impl Lcg {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0
    }

    pub(crate) fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            slice.swap(i, j);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseClassifier {
    vectorizer: TfidfVectorizer,
    labels: Vec<String>,
    /// classes × features
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&z| (z - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn sparse_dot(weights: &[f32], x: &SparseVec) -> f32 {
    x.iter().map(|&(idx, v)| weights[idx] * v).sum()
}

impl DiseaseClassifier {
    /// Fit the vectorizer and train the classifier on (text, label) pairs.
    pub fn train(texts: &[String], labels: &[String], config: &TrainConfig) -> Result<Self> {
        if texts.len() != labels.len() || texts.is_empty() {
            return Err(RankerError::Model(format!(
                "Training data mismatch: {} texts, {} labels",
                texts.len(),
                labels.len()
            )));
        }

        let vectorizer = TfidfVectorizer::fit(texts, config.max_features);
        let n_features = vectorizer.n_features();

        // Stable label order
        let mut class_names: Vec<String> = labels.to_vec();
        class_names.sort();
        class_names.dedup();
        let class_index: HashMap<&str, usize> = class_names
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let n_classes = class_names.len();

        if n_classes < 2 {
            return Err(RankerError::Model("Need at least two classes to train".to_string()));
        }

        let x: Vec<SparseVec> = vectorizer.transform_all(texts);
        let y: Vec<usize> = labels.iter().map(|l| class_index[l.as_str()]).collect();

        info!(
            samples = texts.len(),
            classes = n_classes,
            features = n_features,
            "training disease classifier"
        );

        let mut weights = vec![vec![0.0f32; n_features]; n_classes];
        let mut bias = vec![0.0f32; n_classes];

        let n = x.len() as f32;
        let mut order: Vec<usize> = (0..x.len()).collect();
        let mut rng = Lcg::new(config.seed);

        for epoch in 0..config.epochs {
            rng.shuffle(&mut order);

            // Gradient accumulators
            let mut grad_w = vec![vec![0.0f32; n_features]; n_classes];
            let mut grad_b = vec![0.0f32; n_classes];
            let mut loss = 0.0f32;

            for &i in &order {
                let xi = &x[i];
                let logits: Vec<f32> = (0..n_classes)
                    .map(|c| sparse_dot(&weights[c], xi) + bias[c])
                    .collect();
                let probs = softmax(&logits);
                loss -= probs[y[i]].max(1e-12).ln();

                for c in 0..n_classes {
                    let err = probs[c] - if c == y[i] { 1.0 } else { 0.0 };
                    grad_b[c] += err;
                    for &(idx, v) in xi {
                        grad_w[c][idx] += err * v;
                    }
                }
            }

            for c in 0..n_classes {
                for f in 0..n_features {
                    weights[c][f] -=
                        config.learning_rate * (grad_w[c][f] / n + config.l2 * weights[c][f]);
                }
                bias[c] -= config.learning_rate * grad_b[c] / n;
            }

            if epoch % 50 == 0 {
                debug!(epoch, loss = loss / n, "training progress");
            }
        }

        Ok(Self { vectorizer, labels: class_names, weights, bias })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Class probabilities for one text, aligned with `labels()`.
    pub fn predict_proba(&self, text: &str) -> Vec<f32> {
        let x = self.vectorizer.transform(text);
        let logits: Vec<f32> = (0..self.labels.len())
            .map(|c| sparse_dot(&self.weights[c], &x) + self.bias[c])
            .collect();
        softmax(&logits)
    }

    /// Top-n (label, probability) pairs, descending.
    pub fn top_n(&self, text: &str, n: usize) -> Vec<(String, f32)> {
        let probs = self.predict_proba(text);
        let mut pairs: Vec<(String, f32)> = self
            .labels
            .iter()
            .cloned()
            .zip(probs)
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs.truncate(n);
        pairs
    }

    /// Highest-weighted features per class — which terms drive each
    /// disease. Useful for sanity-checking a trained model.
    pub fn top_features_per_class(&self, n: usize) -> Vec<(String, Vec<(String, f32)>)> {
        let names = self.vectorizer.feature_names();
        self.labels
            .iter()
            .enumerate()
            .map(|(c, label)| {
                let mut indexed: Vec<(usize, f32)> = self.weights[c]
                    .iter()
                    .cloned()
                    .enumerate()
                    .collect();
                indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                let top = indexed
                    .into_iter()
                    .take(n)
                    .map(|(idx, w)| (names[idx].clone(), w))
                    .collect();
                (label.clone(), top)
            })
            .collect()
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)?;

        // A truncated or mixed-up file must not load silently.
        let n_features = model.vectorizer.n_features();
        if model.weights.len() != model.labels.len()
            || model.bias.len() != model.labels.len()
            || model.weights.iter().any(|row| row.len() != n_features)
        {
            return Err(RankerError::Model(
                "Model dimensions do not match vectorizer vocabulary".to_string(),
            ));
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<String>, Vec<String>) {
        let texts = vec![
            "high fever with chills and sweating at night".to_string(),
            "fever and chills, sweating, shivering all night".to_string(),
            "burning fever, chills, night sweats".to_string(),
            "itchy skin rash with red spots on my arms".to_string(),
            "red itchy rash spreading over the skin".to_string(),
            "skin covered in itchy red spots and rash".to_string(),
        ];
        let labels = vec![
            "Malaria".to_string(),
            "Malaria".to_string(),
            "Malaria".to_string(),
            "Psoriasis".to_string(),
            "Psoriasis".to_string(),
            "Psoriasis".to_string(),
        ];
        (texts, labels)
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (texts, labels) = toy_data();
        let clf = DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap();
        let probs = clf.predict_proba("fever and chills");
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_separates_toy_classes() {
        let (texts, labels) = toy_data();
        let clf = DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap();

        let top = clf.top_n("fever chills and night sweats", 1);
        assert_eq!(top[0].0, "Malaria");

        let top = clf.top_n("itchy red rash on skin", 1);
        assert_eq!(top[0].0, "Psoriasis");
    }

    #[test]
    fn test_training_is_deterministic() {
        let (texts, labels) = toy_data();
        let a = DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap();
        let b = DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap();
        assert_eq!(a.predict_proba("fever"), b.predict_proba("fever"));
    }

    #[test]
    fn test_top_features_introspection() {
        let (texts, labels) = toy_data();
        let clf = DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap();
        let features = clf.top_features_per_class(5);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].1.len(), 5);

        let malaria = features.iter().find(|(l, _)| l == "Malaria").unwrap();
        let terms: Vec<&str> = malaria.1.iter().map(|(t, _)| t.as_str()).collect();
        assert!(
            terms.iter().any(|t| t.contains("fever") || t.contains("chills")),
            "expected fever/chills among {:?}",
            terms
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let (texts, labels) = toy_data();
        let clf = DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        clf.save(&path).unwrap();

        let loaded = DiseaseClassifier::load(&path).unwrap();
        assert_eq!(
            clf.predict_proba("fever and chills"),
            loaded.predict_proba("fever and chills")
        );
    }

    #[test]
    fn test_single_class_rejected() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let labels = vec!["X".to_string(), "X".to_string()];
        assert!(DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let texts = vec!["a".to_string()];
        let labels: Vec<String> = vec![];
        assert!(DiseaseClassifier::train(&texts, &labels, &TrainConfig::default()).is_err());
    }
}
