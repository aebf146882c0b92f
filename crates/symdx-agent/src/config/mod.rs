//! Configuration loading for symdx.
//! Reads symdx.toml from the current directory or the path in the
//! SYMDX_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub canonicalizer: CanonicalizerConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

fn default_db_path() -> String {
    "./data/symdx.lancedb".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_mode")]
    pub mode: String,
    #[serde(default = "default_local_backend")]
    pub local_backend: String,
    #[serde(default = "default_default_backend")]
    pub default_backend: String,
    pub ollama: Option<OllamaConfig>,
    pub openai_compatible: Option<OpenAiCompatibleConfig>,
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: default_llm_mode(),
            local_backend: default_local_backend(),
            default_backend: default_default_backend(),
            ollama: Some(OllamaConfig::default()),
            openai_compatible: None,
            audit_log: default_audit_log(),
        }
    }
}

fn default_llm_mode() -> String {
    "local_only".to_string()
}
fn default_local_backend() -> String {
    "ollama".to_string()
}
fn default_default_backend() -> String {
    "ollama".to_string()
}
fn default_audit_log() -> String {
    "./data/llm-audit.jsonl".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { base_url: default_ollama_url(), model: default_ollama_model() }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatibleConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embed_model")]
    pub model_id: String,
    #[serde(default = "default_embed_dimension")]
    pub dimension: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    #[serde(default)]
    pub use_gpu: bool,
    /// Skip model loading entirely (extraction still works; the
    /// canonicalizer and explainer are disabled).
    #[serde(default)]
    pub disabled: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_embed_model(),
            dimension: default_embed_dimension(),
            batch_size: default_batch_size(),
            cache_size: default_cache_size(),
            use_gpu: false,
            disabled: false,
        }
    }
}

fn default_embed_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}
fn default_embed_dimension() -> usize {
    384
}
fn default_batch_size() -> usize {
    32
}
fn default_cache_size() -> usize {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    #[serde(default = "default_min_candidate_count")]
    pub min_candidate_count: usize,
    #[serde(default = "default_primary_ratio")]
    pub primary_ratio: f64,
    #[serde(default = "default_secondary_ratio")]
    pub secondary_ratio: f64,
    #[serde(default = "bool_true")]
    pub embed_docs: bool,
    #[serde(default)]
    pub enrich: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            min_candidate_count: default_min_candidate_count(),
            primary_ratio: default_primary_ratio(),
            secondary_ratio: default_secondary_ratio(),
            embed_docs: true,
            enrich: false,
        }
    }
}

fn default_dataset_path() -> String {
    "./data/symptom2disease.csv".to_string()
}
fn default_min_candidate_count() -> usize {
    10
}
fn default_primary_ratio() -> f64 {
    0.40
}
fn default_secondary_ratio() -> f64 {
    0.10
}
fn bool_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalizerConfig {
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f32,
    #[serde(default = "default_ambiguity_delta")]
    pub ambiguity_delta: f32,
}

impl Default for CanonicalizerConfig {
    fn default() -> Self {
        Self {
            accept_threshold: default_accept_threshold(),
            ambiguity_delta: default_ambiguity_delta(),
        }
    }
}

fn default_accept_threshold() -> f32 {
    0.62
}
fn default_ambiguity_delta() -> f32 {
    0.08
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_classifier_weight")]
    pub classifier_weight: f64,
    #[serde(default = "default_kg_weight")]
    pub kg_weight: f64,
    /// Train a classifier from the dataset when no saved model exists.
    #[serde(default = "bool_true")]
    pub train_on_start: bool,
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            classifier_weight: default_classifier_weight(),
            kg_weight: default_kg_weight(),
            train_on_start: true,
            test_ratio: default_test_ratio(),
            seed: default_seed(),
        }
    }
}

fn default_model_path() -> String {
    "./data/classifier.json".to_string()
}
fn default_classifier_weight() -> f64 {
    0.6
}
fn default_kg_weight() -> f64 {
    0.4
}
fn default_test_ratio() -> f64 {
    0.2
}
fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

mod tests;

impl Config {
    /// Load configuration from symdx.toml.
    /// Checks SYMDX_CONFIG env var first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("SYMDX_CONFIG").unwrap_or_else(|_| "symdx.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy symdx.example.toml to symdx.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
