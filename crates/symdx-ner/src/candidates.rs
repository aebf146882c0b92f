//! Candidate symptom vocabulary mining from dataset text.
//!
//! Counts unigrams and bigrams over normalized row text and keeps terms
//! frequent enough to be worth adding to the vocabulary. Obvious junk is
//! filtered: function words, and bigrams containing one.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use symdx_common::normalize::normalize_text;

pub const DEFAULT_MIN_COUNT: usize = 10;
pub const DEFAULT_MIN_LEN: usize = 3;

const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "and", "are", "am", "been", "being", "but", "for", "from", "had", "has",
    "have", "i", "is", "it", "its", "my", "of", "on", "or", "so", "that", "the", "there",
    "this", "to", "very", "was", "with", "also", "all",
];

fn function_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| FUNCTION_WORDS.iter().copied().collect())
}

fn is_junk(term: &str) -> bool {
    term.split_whitespace().any(|t| function_words().contains(t))
}

/// Mine unigram/bigram candidates from an iterator of raw texts.
/// Keeps terms with count > min_count and length > min_len, sorted.
pub fn mine_candidates<'a, I>(texts: I, min_count: usize, min_len: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counter: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let normalized = normalize_text(text);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        for i in 0..tokens.len() {
            *counter.entry(tokens[i].to_string()).or_insert(0) += 1;
            if i + 1 < tokens.len() {
                *counter
                    .entry(format!("{} {}", tokens[i], tokens[i + 1]))
                    .or_insert(0) += 1;
            }
        }
    }

    let mut candidates: Vec<String> = counter
        .into_iter()
        .filter(|(term, count)| *count > min_count && term.len() > min_len && !is_junk(term))
        .map(|(term, _)| term)
        .collect();

    candidates.sort();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mining_thresholds() {
        let texts: Vec<String> = (0..12).map(|_| "itchy skin rash".to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

        let candidates = mine_candidates(refs, 10, 3);
        assert!(candidates.contains(&"itchy".to_string()));
        assert!(candidates.contains(&"itchy skin".to_string()));
        assert!(candidates.contains(&"skin rash".to_string()));
        assert!(candidates.contains(&"rash".to_string()));
    }

    #[test]
    fn test_rare_terms_dropped() {
        let texts = vec!["a very unusual presentation"];
        let candidates = mine_candidates(texts, 10, 3);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_function_words_filtered() {
        let texts: Vec<String> = (0..20).map(|_| "fever with chills".to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let candidates = mine_candidates(refs, 10, 3);
        assert!(candidates.contains(&"fever".to_string()));
        assert!(candidates.contains(&"chills".to_string()));
        assert!(!candidates.contains(&"with".to_string()));
        assert!(!candidates.contains(&"fever with".to_string()));
        assert!(!candidates.contains(&"with chills".to_string()));
    }

    #[test]
    fn test_short_terms_dropped() {
        let texts: Vec<String> = (0..20).map(|_| "leg hurts".to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let candidates = mine_candidates(refs, 10, 3);
        // "leg" has len 3, not > 3
        assert!(!candidates.contains(&"leg".to_string()));
        assert!(candidates.contains(&"hurts".to_string()));
    }

    #[test]
    fn test_output_sorted() {
        let texts: Vec<String> = (0..15).map(|_| "zebra apple".to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let candidates = mine_candidates(refs, 10, 3);
        let mut sorted = candidates.clone();
        sorted.sort();
        assert_eq!(candidates, sorted);
    }
}
