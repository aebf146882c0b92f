#![cfg(test)]

use super::*;

#[test]
fn test_empty_toml_gives_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.database.path, "./data/symdx.lancedb");
    assert_eq!(config.llm.mode, "local_only");
    assert_eq!(config.embedding.dimension, 384);
    assert!((config.ranker.classifier_weight - 0.6).abs() < 1e-9);
    assert_eq!(config.web.bind, "127.0.0.1:3000");
}

#[test]
fn test_partial_override() {
    let toml_src = r#"
[web]
bind = "0.0.0.0:8080"

[llm]
mode = "local_only"

[llm.ollama]
model = "llama3.1:70b"
"#;
    let config: Config = toml::from_str(toml_src).unwrap();
    assert_eq!(config.web.bind, "0.0.0.0:8080");
    let ollama = config.llm.ollama.unwrap();
    assert_eq!(ollama.model, "llama3.1:70b");
    // Unspecified fields fall back to defaults
    assert_eq!(ollama.base_url, "http://localhost:11434");
    assert_eq!(config.database.path, "./data/symdx.lancedb");
}

#[test]
fn test_openai_compatible_section() {
    let toml_src = r#"
[llm.openai_compatible]
base_url = "http://localhost:1234"
model = "mistral"
"#;
    let config: Config = toml::from_str(toml_src).unwrap();
    let compat = config.llm.openai_compatible.unwrap();
    assert_eq!(compat.base_url, "http://localhost:1234");
    assert_eq!(compat.model, "mistral");
    assert!(compat.api_key.is_empty());
    assert!(compat.embedding_model.is_none());
}

#[test]
fn test_ranker_thresholds_parse() {
    let toml_src = r#"
[ranker]
classifier_weight = 0.7
kg_weight = 0.3
train_on_start = false
"#;
    let config: Config = toml::from_str(toml_src).unwrap();
    assert!((config.ranker.classifier_weight - 0.7).abs() < 1e-9);
    assert!(!config.ranker.train_on_start);
}
