//! Evaluation harness.
//!
//! Seeded train/test split and per-mode accuracy so the classifier, the
//! knowledge-base ranking, and the hybrid can be compared on the same
//! held-out rows.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::Lcg;

/// One labelled dataset row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelledRow {
    pub label: String,
    pub text: String,
}

/// Deterministic split: shuffle with `seed`, last `test_ratio` becomes the
/// test set.
pub fn train_test_split(
    rows: &[LabelledRow],
    test_ratio: f64,
    seed: u64,
) -> (Vec<LabelledRow>, Vec<LabelledRow>) {
    let mut shuffled: Vec<LabelledRow> = rows.to_vec();
    let mut rng = Lcg::new(seed);
    rng.shuffle(&mut shuffled);

    let n_test = ((rows.len() as f64) * test_ratio).round() as usize;
    let n_train = rows.len().saturating_sub(n_test);

    let test = shuffled.split_off(n_train);
    (shuffled, test)
}

/// Accuracy at the given cutoffs for one ranking function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeReport {
    pub mode: String,
    pub samples: usize,
    /// k -> fraction of rows whose true label is in the top k
    pub top_k_accuracy: HashMap<usize, f64>,
}

/// Macro-averaged precision/recall/F1 for top-1 predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub test_samples: usize,
    pub modes: Vec<ModeReport>,
    pub classifier_macro: Option<MacroMetrics>,
}

/// Evaluate a ranking function: it returns disease names best-first.
pub fn evaluate_ranking(
    mode: &str,
    test: &[LabelledRow],
    ks: &[usize],
    rank_fn: &dyn Fn(&str) -> Vec<String>,
) -> ModeReport {
    let mut hits: HashMap<usize, usize> = ks.iter().map(|&k| (k, 0)).collect();

    for row in test {
        let ranked = rank_fn(&row.text);
        let truth = symdx_common::normalize::normalize_label(&row.label);
        let position = ranked
            .iter()
            .position(|name| symdx_common::normalize::normalize_label(name) == truth);

        if let Some(pos) = position {
            for &k in ks {
                if pos < k {
                    *hits.get_mut(&k).unwrap() += 1;
                }
            }
        }
    }

    let n = test.len().max(1) as f64;
    let top_k_accuracy = hits.into_iter().map(|(k, h)| (k, h as f64 / n)).collect();

    let report = ModeReport { mode: mode.to_string(), samples: test.len(), top_k_accuracy };
    info!(mode, samples = test.len(), "mode evaluated");
    report
}

/// Macro precision/recall/F1 over top-1 predictions.
pub fn macro_metrics(
    test: &[LabelledRow],
    rank_fn: &dyn Fn(&str) -> Vec<String>,
) -> MacroMetrics {
    let norm = symdx_common::normalize::normalize_label;

    let classes: HashSet<String> = test.iter().map(|r| norm(&r.label)).collect();
    let mut tp: HashMap<String, f64> = HashMap::new();
    let mut fp: HashMap<String, f64> = HashMap::new();
    let mut fn_: HashMap<String, f64> = HashMap::new();

    for row in test {
        let truth = norm(&row.label);
        let predicted = rank_fn(&row.text).first().map(|p| norm(p));

        match predicted {
            Some(p) if p == truth => {
                *tp.entry(truth).or_insert(0.0) += 1.0;
            }
            Some(p) => {
                *fp.entry(p).or_insert(0.0) += 1.0;
                *fn_.entry(truth).or_insert(0.0) += 1.0;
            }
            None => {
                *fn_.entry(truth).or_insert(0.0) += 1.0;
            }
        }
    }

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;

    for class in &classes {
        let tp_c = tp.get(class).copied().unwrap_or(0.0);
        let fp_c = fp.get(class).copied().unwrap_or(0.0);
        let fn_c = fn_.get(class).copied().unwrap_or(0.0);

        let precision = if tp_c + fp_c > 0.0 { tp_c / (tp_c + fp_c) } else { 0.0 };
        let recall = if tp_c + fn_c > 0.0 { tp_c / (tp_c + fn_c) } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        precision_sum += precision;
        recall_sum += recall;
        f1_sum += f1;
    }

    let n = classes.len().max(1) as f64;
    MacroMetrics {
        precision: precision_sum / n,
        recall: recall_sum / n,
        f1: f1_sum / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<LabelledRow> {
        (0..10)
            .map(|i| LabelledRow {
                label: if i % 2 == 0 { "A".to_string() } else { "B".to_string() },
                text: format!("text {}", i),
            })
            .collect()
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let data = rows();
        let (train_a, test_a) = train_test_split(&data, 0.2, 42);
        let (train_b, test_b) = train_test_split(&data, 0.2, 42);

        assert_eq!(train_a.len(), 8);
        assert_eq!(test_a.len(), 2);
        assert_eq!(
            test_a.iter().map(|r| &r.text).collect::<Vec<_>>(),
            test_b.iter().map(|r| &r.text).collect::<Vec<_>>()
        );
        assert_eq!(train_a.len(), train_b.len());
    }

    #[test]
    fn test_split_disjoint_and_complete() {
        let data = rows();
        let (train, test) = train_test_split(&data, 0.2, 42);
        let mut all: Vec<String> = train.iter().chain(test.iter()).map(|r| r.text.clone()).collect();
        all.sort();
        let mut expected: Vec<String> = data.iter().map(|r| r.text.clone()).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_top_k_accuracy() {
        let test = vec![
            LabelledRow { label: "A".to_string(), text: "1".to_string() },
            LabelledRow { label: "B".to_string(), text: "2".to_string() },
        ];
        // Always ranks [A, B]: A right at top-1, B only within top-2
        let rank = |_: &str| vec!["A".to_string(), "B".to_string()];
        let report = evaluate_ranking("test", &test, &[1, 2], &rank);
        assert!((report.top_k_accuracy[&1] - 0.5).abs() < 1e-9);
        assert!((report.top_k_accuracy[&2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_metrics_perfect_predictor() {
        let test = vec![
            LabelledRow { label: "A".to_string(), text: "a".to_string() },
            LabelledRow { label: "B".to_string(), text: "b".to_string() },
        ];
        let rank = |text: &str| vec![text.to_uppercase()];
        let m = macro_metrics(&test, &rank);
        assert!((m.precision - 1.0).abs() < 1e-9);
        assert!((m.recall - 1.0).abs() < 1e-9);
        assert!((m.f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_metrics_always_wrong() {
        let test = vec![
            LabelledRow { label: "A".to_string(), text: "a".to_string() },
            LabelledRow { label: "B".to_string(), text: "b".to_string() },
        ];
        let rank = |_: &str| vec!["C".to_string()];
        let m = macro_metrics(&test, &rank);
        assert_eq!(m.f1, 0.0);
    }
}
