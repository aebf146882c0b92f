//! TF-IDF vectorization.
//!
//! Word unigrams and bigrams over normalized text, English stop words
//! removed, vocabulary capped by document frequency, smoothed idf
//! (ln((1+n)/(1+df)) + 1), L2-normalized rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use symdx_common::normalize::normalize_text;

use crate::stopwords::is_stop_word;

pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Sparse feature vector: (feature index, weight), indices strictly
/// increasing.
pub type SparseVec = Vec<(usize, f32)>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    max_features: usize,
}

fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize_text(text);
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|t| t.len() > 1 && !is_stop_word(t))
        .collect();

    let mut terms = Vec::with_capacity(tokens.len() * 2);
    for i in 0..tokens.len() {
        terms.push(tokens[i].to_string());
        if i + 1 < tokens.len() {
            terms.push(format!("{} {}", tokens[i], tokens[i + 1]));
        }
    }
    terms
}

impl TfidfVectorizer {
    /// Fit the vocabulary and idf weights on a corpus.
    pub fn fit(corpus: &[String], max_features: usize) -> Self {
        let n_docs = corpus.len();

        // Document frequency per term
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let mut seen = std::collections::HashSet::new();
            for term in tokenize(doc) {
                if seen.insert(term.clone()) {
                    *df.entry(term).or_insert(0) += 1;
                }
            }
        }

        // Cap the vocabulary: highest document frequency first,
        // alphabetical tie-break for determinism.
        let mut terms: Vec<(String, usize)> = df.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(max_features);
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (i, (term, term_df)) in terms.into_iter().enumerate() {
            vocabulary.insert(term, i);
            idf.push((((1 + n_docs) as f32 / (1 + term_df) as f32).ln()) + 1.0);
        }

        Self { vocabulary, idf, max_features }
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Feature names indexed by feature id.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.clone();
        }
        names
    }

    /// Transform one document into an L2-normalized sparse tf-idf vector.
    pub fn transform(&self, text: &str) -> SparseVec {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vec: SparseVec = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        vec.sort_by_key(|(idx, _)| *idx);

        let norm: f32 = vec.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in vec.iter_mut() {
                *w /= norm;
            }
        }
        vec
    }

    pub fn transform_all(&self, texts: &[String]) -> Vec<SparseVec> {
        texts.iter().map(|t| self.transform(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "I have a fever and a bad headache".to_string(),
            "fever with skin rash".to_string(),
            "headache and nausea all day".to_string(),
        ]
    }

    #[test]
    fn test_stop_words_removed() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        assert!(!v.vocabulary.contains_key("and"));
        assert!(!v.vocabulary.contains_key("a"));
        assert!(v.vocabulary.contains_key("fever"));
    }

    #[test]
    fn test_bigrams_present() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        assert!(v.vocabulary.contains_key("skin rash"));
        // bigram formed after stop-word removal
        assert!(v.vocabulary.contains_key("bad headache"));
    }

    #[test]
    fn test_rows_l2_normalized() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        let row = v.transform("fever and headache with nausea");
        let norm: f32 = row.iter().map(|(_, w)| w * w).sum();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_terms_ignored() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        assert!(v.transform("zzz qqq").is_empty());
    }

    #[test]
    fn test_max_features_cap() {
        let v = TfidfVectorizer::fit(&corpus(), 3);
        assert_eq!(v.n_features(), 3);
        assert_eq!(v.idf.len(), 3);
    }

    #[test]
    fn test_rarer_term_gets_higher_idf() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        let fever_idx = v.vocabulary["fever"]; // df = 2
        let nausea_idx = v.vocabulary["nausea"]; // df = 1
        assert!(v.idf[nausea_idx] > v.idf[fever_idx]);
    }

    #[test]
    fn test_sparse_indices_sorted() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        let row = v.transform("fever headache nausea rash");
        let indices: Vec<usize> = row.iter().map(|(i, _)| *i).collect();
        let mut sorted = indices.clone();
        sorted.sort();
        assert_eq!(indices, sorted);
    }
}
