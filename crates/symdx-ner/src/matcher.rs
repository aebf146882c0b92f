//! Fast symptom extraction using an Aho-Corasick automaton over the
//! symptom vocabulary.
//!
//! Matching rules:
//! - input and vocabulary are normalized the same way (symdx-common);
//! - matches must sit on word boundaries ("dry cough" must not fire
//!   inside "dry coughing");
//! - overlapping matches are resolved longest-first;
//! - if nothing matches, the text is split into short candidate chunks so
//!   the canonicalizer can still try to map them.

use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;
use std::sync::OnceLock;
use symdx_common::normalize::normalize_text;
use tracing::debug;

const DEFAULT_MAX_MATCHES: usize = 20;

fn chunk_split_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.;,\n]| and | but | or ").unwrap())
}

/// A symptom phrase found in (normalized) input text.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExtractedSymptom {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
    /// True when this came from the fallback chunker rather than a
    /// vocabulary hit.
    pub fallback: bool,
}

pub struct SymptomMatcher {
    automaton: AhoCorasick,
    phrases: Vec<String>,
    max_matches: usize,
}

impl SymptomMatcher {
    /// Build a matcher over the given vocabulary phrases.
    pub fn new(vocabulary: &[String]) -> crate::Result<Self> {
        Self::with_max_matches(vocabulary, DEFAULT_MAX_MATCHES)
    }

    pub fn with_max_matches(vocabulary: &[String], max_matches: usize) -> crate::Result<Self> {
        let phrases: Vec<String> = {
            let mut v: Vec<String> = vocabulary
                .iter()
                .map(|p| normalize_text(p))
                .filter(|p| !p.is_empty())
                .collect();
            v.sort();
            v.dedup();
            v
        };

        if phrases.is_empty() {
            return Err(crate::NerError::EmptyVocabulary);
        }

        // Standard match kind so overlapping candidates are visible; the
        // boundary filter may reject a long match while a shorter one is
        // still valid.
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&phrases)
            .map_err(|e| crate::NerError::Build(e.to_string()))?;

        debug!(patterns = phrases.len(), "symptom matcher built");

        Ok(Self { automaton, phrases, max_matches })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.phrases
    }

    /// Extract symptom phrases from raw patient text.
    pub fn extract(&self, text: &str) -> Vec<ExtractedSymptom> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for mat in self.automaton.find_overlapping_iter(&normalized) {
            if !on_word_boundary(&normalized, mat.start(), mat.end()) {
                continue;
            }
            hits.push(ExtractedSymptom {
                text: normalized[mat.start()..mat.end()].to_string(),
                start: mat.start(),
                end: mat.end(),
                confidence: 0.95,
                fallback: false,
            });
        }

        let mut matches = Self::remove_overlapping(hits);
        matches.truncate(self.max_matches);

        if matches.is_empty() {
            return self.fallback_chunks(&normalized);
        }

        matches
    }

    /// Extract from multiple texts. Parallelized for larger batches.
    pub fn extract_batch(&self, texts: &[&str]) -> Vec<Vec<ExtractedSymptom>> {
        #[cfg(feature = "parallel")]
        {
            if texts.len() > 10 {
                use rayon::prelude::*;
                return texts.par_iter().map(|text| self.extract(text)).collect();
            }
        }
        texts.iter().map(|text| self.extract(text)).collect()
    }

    fn remove_overlapping(mut hits: Vec<ExtractedSymptom>) -> Vec<ExtractedSymptom> {
        if hits.is_empty() {
            return hits;
        }

        // Sort by start position, then by length (longest first)
        hits.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
        });

        let mut result = Vec::new();
        let mut last_end = 0;

        for hit in hits {
            if hit.start >= last_end {
                last_end = hit.end;
                result.push(hit);
            }
        }

        result
    }

    /// No vocabulary term matched: split into short candidate chunks so
    /// canonicalization can still try to map them.
    fn fallback_chunks(&self, normalized: &str) -> Vec<ExtractedSymptom> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        for part in chunk_split_regex().split(normalized) {
            let trimmed = part.trim();
            if (2..=60).contains(&trimmed.len()) {
                let start = normalized[offset..]
                    .find(trimmed)
                    .map(|i| offset + i)
                    .unwrap_or(offset);
                chunks.push(ExtractedSymptom {
                    text: trimmed.to_string(),
                    start,
                    end: start + trimmed.len(),
                    confidence: 0.30,
                    fallback: true,
                });
                offset = start + trimmed.len();
            }
            if chunks.len() >= self.max_matches {
                break;
            }
        }
        chunks
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || text[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
    let after_ok = end == text.len()
        || text[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
    before_ok && after_ok
}
