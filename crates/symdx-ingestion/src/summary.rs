//! LLM-compressed disease summaries.
//!
//! MedlinePlus full summaries are long; the LLM reduces each to a short
//! patient-readable paragraph. Source text is public reference material,
//! so these calls are classified PUBLIC. A checkpoint file is written
//! after every disease so interrupted runs resume where they stopped.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use std::sync::OnceLock;
use symdx_llm::{DataClass, LlmRequest, LlmRouter, Message};
use tracing::{info, warn};

use crate::Result;

fn json_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// Pull the first JSON object out of a completion that may wrap it in
/// prose or code fences.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let t = text.trim();
    let candidate = if t.starts_with('{') && t.ends_with('}') {
        t.to_string()
    } else {
        json_block_regex().find(t)?.as_str().to_string()
    };
    serde_json::from_str(&candidate).ok()
}

pub struct SummaryGenerator {
    router: Arc<LlmRouter>,
    checkpoint_path: PathBuf,
}

impl SummaryGenerator {
    pub fn new(router: Arc<LlmRouter>, checkpoint_path: impl Into<PathBuf>) -> Self {
        Self { router, checkpoint_path: checkpoint_path.into() }
    }

    fn load_checkpoint(&self) -> HashMap<String, String> {
        std::fs::read_to_string(&self.checkpoint_path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save_checkpoint(&self, done: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(done)?;
        std::fs::write(&self.checkpoint_path, json)?;
        Ok(())
    }

    /// Summarise each (disease, full_summary) pair. Diseases already in
    /// the checkpoint are skipped; each new summary is checkpointed
    /// immediately.
    pub async fn generate(
        &self,
        inputs: &[(String, String)],
    ) -> Result<HashMap<String, String>> {
        let mut done = self.load_checkpoint();
        let already = done.len();
        if already > 0 {
            info!(already, "resuming summary generation from checkpoint");
        }

        for (disease, full_summary) in inputs {
            if done.contains_key(disease) {
                continue;
            }
            if full_summary.trim().is_empty() {
                continue;
            }

            let prompt = build_summary_prompt(disease, full_summary);
            let req = LlmRequest {
                messages: vec![
                    Message::system("You extract structured medical reference summaries."),
                    Message::user(prompt),
                ],
                model: None,
                max_tokens: Some(512),
                temperature: Some(0.2),
            };

            match self.router.route_as(req, DataClass::Public).await {
                Ok(resp) => match extract_json(&resp.content)
                    .and_then(|v| v["summary"].as_str().map(String::from))
                {
                    Some(summary) => {
                        done.insert(disease.clone(), summary);
                        self.save_checkpoint(&done)?;
                    }
                    None => warn!(disease, "summary response had no parseable JSON"),
                },
                Err(e) => warn!(disease, "summary generation failed: {}", e),
            }
        }

        Ok(done)
    }
}

fn build_summary_prompt(disease: &str, full_summary: &str) -> String {
    format!(
        "Compress the following reference text about {disease} into a short,\n\
         factual summary (3-4 sentences). Do not add information that is\n\
         not in the text. Do not give treatment advice.\n\
         \n\
         Text:\n\
         {full_summary}\n\
         \n\
         Respond with ONLY a JSON object: {{\"summary\": \"...\"}}",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let v = extract_json(r#"{"summary": "short text"}"#).unwrap();
        assert_eq!(v["summary"], "short text");
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let v = extract_json("Here you go:\n```json\n{\"summary\": \"x\"}\n```\nHope that helps!")
            .unwrap();
        assert_eq!(v["summary"], "x");
    }

    #[test]
    fn test_extract_json_none_when_absent() {
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("{broken").is_none());
    }

    #[test]
    fn test_summary_prompt_demands_json() {
        let p = build_summary_prompt("Dengue", "long text");
        assert!(p.contains(r#"{"summary": "..."}"#));
        assert!(p.contains("Do not give treatment advice."));
    }

    #[tokio::test]
    async fn test_checkpoint_resume_skips_done_diseases() {
        use symdx_llm::{LlmRouter, RoutingPolicy};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries.json");

        // Pre-existing checkpoint from an interrupted run
        std::fs::write(&path, r#"{"Dengue": "already summarised"}"#).unwrap();

        // A router with no backends: new summaries fail (and are skipped),
        // checkpointed ones survive untouched.
        let router = Arc::new(LlmRouter::new(RoutingPolicy::default()));
        let generator = SummaryGenerator::new(router, &path);

        let inputs = vec![
            ("Dengue".to_string(), "full text".to_string()),
            ("Malaria".to_string(), "full text".to_string()),
        ];
        let done = generator.generate(&inputs).await.unwrap();

        assert_eq!(done.get("Dengue").map(String::as_str), Some("already summarised"));
        assert!(!done.contains_key("Malaria"));
    }
}
