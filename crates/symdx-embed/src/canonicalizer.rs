//! Symptom canonicalization.
//!
//! Maps a free-text phrase ("trouble breathing", "i feel woozy") onto the
//! knowledge-base symptom vocabulary by nearest-neighbour search over
//! phrase embeddings. A match is accepted only when it is both close
//! enough (accept threshold) and clearly separated from the runner-up
//! (ambiguity window); everything else is reported as rejected so the
//! caller can surface it instead of guessing.

use std::sync::Arc;

use serde::Serialize;
use symdx_common::normalize::normalize_text;
use symdx_common::SymptomId;
use tracing::debug;

use crate::{EmbedError, FlatIndex, Result, SentenceEmbedder};

pub const DEFAULT_ACCEPT_THRESHOLD: f32 = 0.62;
pub const DEFAULT_AMBIGUITY_DELTA: f32 = 0.08;

/// A vocabulary entry the canonicalizer can resolve to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSymptom {
    pub id: SymptomId,
    pub text: String,
}

/// One nearest-neighbour candidate.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: SymptomId,
    pub text: String,
    pub score: f32,
}

/// Outcome for a single phrase.
#[derive(Debug, Clone, Serialize)]
pub struct Canonicalization {
    pub input: String,
    pub normalized: String,
    pub accepted: bool,
    pub matched: Option<CanonicalSymptom>,
    pub score: Option<f32>,
    pub ambiguous: bool,
    pub candidates: Vec<Candidate>,
}

impl Canonicalization {
    fn rejected(input: String, normalized: String) -> Self {
        Self {
            input,
            normalized,
            accepted: false,
            matched: None,
            score: None,
            ambiguous: false,
            candidates: Vec::new(),
        }
    }
}

/// Embedded vocabulary: index rows and metadata must be built together.
#[derive(Debug)]
pub struct VocabIndex {
    index: FlatIndex,
    meta: Vec<CanonicalSymptom>,
}

impl VocabIndex {
    /// Fail fast when the index and metadata went out of sync (e.g. loaded
    /// from files built at different times).
    pub fn new(index: FlatIndex, meta: Vec<CanonicalSymptom>) -> Result<Self> {
        if index.len() != meta.len() {
            return Err(EmbedError::IndexMetaMismatch {
                index: index.len(),
                meta: meta.len(),
            });
        }
        Ok(Self { index, meta })
    }

    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }
}

pub struct SymptomCanonicalizer {
    embedder: Arc<SentenceEmbedder>,
    vocab: VocabIndex,
    accept_threshold: f32,
    ambiguity_delta: f32,
}

impl SymptomCanonicalizer {
    /// Embed the vocabulary and build the index.
    pub async fn build(
        embedder: Arc<SentenceEmbedder>,
        vocabulary: Vec<CanonicalSymptom>,
    ) -> Result<Self> {
        let texts: Vec<String> = vocabulary.iter().map(|s| normalize_text(&s.text)).collect();
        let embeddings = embedder.embed(&texts).await?;

        let mut index = FlatIndex::new(embedder.dimension());
        index.add_all(embeddings)?;

        debug!(entries = vocabulary.len(), "canonicalizer index built");

        let vocab = VocabIndex::new(index, vocabulary)?;
        Ok(Self::from_parts(embedder, vocab))
    }

    pub fn from_parts(embedder: Arc<SentenceEmbedder>, vocab: VocabIndex) -> Self {
        Self {
            embedder,
            vocab,
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
            ambiguity_delta: DEFAULT_AMBIGUITY_DELTA,
        }
    }

    pub fn with_thresholds(mut self, accept_threshold: f32, ambiguity_delta: f32) -> Self {
        self.accept_threshold = accept_threshold;
        self.ambiguity_delta = ambiguity_delta;
        self
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocab.len()
    }

    /// Canonicalize one phrase against the vocabulary.
    pub async fn canonicalize_one(&self, phrase: &str, k: usize) -> Result<Canonicalization> {
        let original = phrase.to_string();
        let normalized = normalize_text(phrase);
        if normalized.is_empty() {
            return Ok(Canonicalization::rejected(original, normalized));
        }

        let query = self.embedder.embed_one(&normalized).await?;
        let hits = self.vocab.index.search(&query, k)?;

        let candidates: Vec<Candidate> = hits
            .into_iter()
            .map(|(idx, score)| {
                let m = &self.vocab.meta[idx];
                Candidate { id: m.id, text: m.text.clone(), score }
            })
            .collect();

        Ok(resolve(
            original,
            normalized,
            candidates,
            self.accept_threshold,
            self.ambiguity_delta,
        ))
    }

    pub async fn canonicalize_many(
        &self,
        phrases: &[String],
        k: usize,
    ) -> Result<Vec<Canonicalization>> {
        let mut out = Vec::with_capacity(phrases.len());
        for p in phrases {
            out.push(self.canonicalize_one(p, k).await?);
        }
        Ok(out)
    }
}

/// Acceptance decision over scored candidates. Pure so it stays testable
/// without a model.
pub fn resolve(
    input: String,
    normalized: String,
    candidates: Vec<Candidate>,
    accept_threshold: f32,
    ambiguity_delta: f32,
) -> Canonicalization {
    let Some(top1) = candidates.first() else {
        return Canonicalization::rejected(input, normalized);
    };

    let top1_score = top1.score;

    let ambiguous = match candidates.get(1) {
        Some(top2) => (top1_score - top2.score) < ambiguity_delta,
        None => false,
    };

    let accepted = top1_score >= accept_threshold && !ambiguous;

    Canonicalization {
        input,
        normalized,
        accepted,
        matched: accepted.then(|| CanonicalSymptom { id: top1.id, text: top1.text.clone() }),
        score: accepted.then_some(top1_score),
        ambiguous,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(text: &str, score: f32) -> Candidate {
        Candidate { id: SymptomId::from_label(text), text: text.to_string(), score }
    }

    #[test]
    fn test_accept_above_threshold() {
        let out = resolve(
            "trouble breathing".into(),
            "trouble breathing".into(),
            vec![cand("shortness of breath", 0.81), cand("chest pain", 0.41)],
            0.62,
            0.08,
        );
        assert!(out.accepted);
        assert!(!out.ambiguous);
        assert_eq!(out.matched.unwrap().text, "shortness of breath");
        assert_eq!(out.score, Some(0.81));
    }

    #[test]
    fn test_reject_below_threshold() {
        let out = resolve(
            "weird feeling".into(),
            "weird feeling".into(),
            vec![cand("dizziness", 0.50), cand("nausea", 0.30)],
            0.62,
            0.08,
        );
        assert!(!out.accepted);
        assert!(out.matched.is_none());
        assert!(out.score.is_none());
        // Candidates are still reported for the caller
        assert_eq!(out.candidates.len(), 2);
    }

    #[test]
    fn test_ambiguous_within_delta() {
        let out = resolve(
            "aching".into(),
            "aching".into(),
            vec![cand("muscle pain", 0.70), cand("joint pain", 0.65)],
            0.62,
            0.08,
        );
        assert!(out.ambiguous);
        assert!(!out.accepted);
    }

    #[test]
    fn test_single_candidate_is_not_ambiguous() {
        let out = resolve(
            "fever".into(),
            "fever".into(),
            vec![cand("fever", 0.95)],
            0.62,
            0.08,
        );
        assert!(!out.ambiguous);
        assert!(out.accepted);
    }

    #[test]
    fn test_no_candidates_rejected() {
        let out = resolve("x".into(), "x".into(), vec![], 0.62, 0.08);
        assert!(!out.accepted);
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn test_vocab_index_length_mismatch() {
        let mut index = FlatIndex::new(2);
        index.add(vec![1.0, 0.0]).unwrap();
        let err = VocabIndex::new(index, vec![]).unwrap_err();
        assert!(matches!(err, EmbedError::IndexMetaMismatch { index: 1, meta: 0 }));
    }
}
