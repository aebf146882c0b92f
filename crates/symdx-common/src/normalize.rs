//! Text normalization shared by the extractor, canonicalizer, and KG label
//! matching. All three must agree on what "the same phrase" means.

use regex::Regex;
use std::sync::OnceLock;

fn ws_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn punct_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Strip punctuation but keep hyphens inside phrases like "light-headed".
    RE.get_or_init(|| Regex::new(r"[^\w\s\-]").unwrap())
}

fn sep_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-_]+").unwrap())
}

/// Normalize free text for phrase matching: lowercase, strip punctuation
/// (hyphens survive), collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let s = s.to_lowercase();
    let s = punct_regex().replace_all(&s, " ");
    ws_regex().replace_all(s.trim(), " ").to_string()
}

/// Normalize an entity label for identity comparison: lowercase and fold
/// hyphen/underscore runs to a single space ("sore-throat" == "sore throat").
pub fn normalize_label(s: &str) -> String {
    let s = sep_regex().replace_all(s, " ");
    ws_regex().replace_all(s.to_lowercase().trim(), " ").to_string()
}

/// Join labels into a readable sentence fragment: "a", "a and b",
/// "a, b and c".
pub fn sentence_join(items: &[String]) -> String {
    match items.len() {
        0 => String::new(),
        1 => items[0].clone(),
        n => format!("{} and {}", items[..n - 1].join(", "), items[n - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_strips_punctuation() {
        assert_eq!(normalize_text("I've had a  dry cough!"), "i ve had a dry cough");
    }

    #[test]
    fn test_normalize_text_keeps_hyphens() {
        assert_eq!(normalize_text("light-headed, dizzy"), "light-headed dizzy");
    }

    #[test]
    fn test_normalize_label_folds_separators() {
        assert_eq!(normalize_label("Sore-Throat"), "sore throat");
        assert_eq!(normalize_label("sore__throat"), "sore throat");
    }

    #[test]
    fn test_sentence_join() {
        let one = vec!["fever".to_string()];
        let two = vec!["fever".to_string(), "cough".to_string()];
        let three = vec!["fever".to_string(), "cough".to_string(), "rash".to_string()];
        assert_eq!(sentence_join(&one), "fever");
        assert_eq!(sentence_join(&two), "fever and cough");
        assert_eq!(sentence_join(&three), "fever, cough and rash");
    }
}
