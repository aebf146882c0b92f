//! RAG explainer.
//!
//! Explains a prediction using retrieved explanation docs. It NEVER
//! predicts diseases; the constrained prompt forbids introducing new
//! diagnoses or treatment advice, and answers come from the retrieved
//! context only.

use std::sync::Arc;

use symdx_embed::{FlatIndex, SentenceEmbedder};
use tracing::debug;

use crate::backend::{LlmError, LlmRequest, Message};
use crate::classification::DataClass;
use crate::router::LlmRouter;

const DEFAULT_RETRIEVE_K: usize = 3;

/// A retrievable explanation document.
#[derive(Debug, Clone)]
pub struct ExplainerDoc {
    pub title: String,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
}

pub struct RagExplainer {
    router: Arc<LlmRouter>,
    embedder: Arc<SentenceEmbedder>,
    index: FlatIndex,
    docs: Vec<ExplainerDoc>,
    retrieve_k: usize,
}

impl RagExplainer {
    /// Build the retrieval index. Docs without stored embeddings are
    /// embedded here.
    pub async fn build(
        router: Arc<LlmRouter>,
        embedder: Arc<SentenceEmbedder>,
        mut docs: Vec<ExplainerDoc>,
    ) -> Result<Self, LlmError> {
        let missing: Vec<usize> = docs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.embedding.is_none())
            .map(|(i, _)| i)
            .collect();

        if !missing.is_empty() {
            let texts: Vec<String> = missing.iter().map(|&i| docs[i].content.clone()).collect();
            let embeddings = embedder
                .embed(&texts)
                .await
                .map_err(|e| LlmError::Unavailable(format!("doc embedding failed: {}", e)))?;
            for (&i, emb) in missing.iter().zip(embeddings) {
                docs[i].embedding = Some(emb);
            }
        }

        let mut index = FlatIndex::new(embedder.dimension());
        for doc in &docs {
            let embedding = doc
                .embedding
                .clone()
                .ok_or_else(|| LlmError::Unavailable("doc missing embedding".to_string()))?;
            index
                .add(embedding)
                .map_err(|e| LlmError::Unavailable(format!("index build failed: {}", e)))?;
        }

        debug!(docs = docs.len(), "explainer retrieval index built");

        Ok(Self { router, embedder, index, docs, retrieve_k: DEFAULT_RETRIEVE_K })
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<&ExplainerDoc>, LlmError> {
        if self.docs.is_empty() {
            return Ok(Vec::new());
        }
        let q = self
            .embedder
            .embed_one(query)
            .await
            .map_err(|e| LlmError::Unavailable(format!("query embedding failed: {}", e)))?;
        let hits = self
            .index
            .search(&q, self.retrieve_k)
            .map_err(|e| LlmError::Unavailable(format!("retrieval failed: {}", e)))?;
        Ok(hits.into_iter().map(|(i, _)| &self.docs[i]).collect())
    }

    /// Explain why `disease` matches `symptoms`. The symptoms text is
    /// patient input, so the request is classified CONFIDENTIAL.
    pub async fn explain(
        &self,
        symptoms: &str,
        disease: &str,
        confidence: f64,
    ) -> Result<String, LlmError> {
        let retrieval_query = format!("{} symptom explanation", disease);
        let context_docs = self.retrieve(&retrieval_query).await?;
        let context = context_docs
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = build_explanation_prompt(symptoms, disease, confidence, &context);

        let req = LlmRequest {
            messages: vec![
                Message::system("You are a medical explanation assistant."),
                Message::user(prompt),
            ],
            model: None,
            max_tokens: None,
            temperature: Some(0.2),
        };

        let resp = self.router.route_as(req, DataClass::Confidential).await?;
        Ok(resp.content)
    }
}

/// The constrained explanation prompt. Kept as a pure function so the
/// guardrail wording stays testable.
pub fn build_explanation_prompt(
    symptoms: &str,
    disease: &str,
    confidence: f64,
    context: &str,
) -> String {
    format!(
        "Rules:\n\
         - ONLY explain the disease provided.\n\
         - DO NOT introduce new diseases.\n\
         - DO NOT give treatment advice.\n\
         - DO NOT make a diagnosis.\n\
         - Base your answer ONLY on the context.\n\
         \n\
         User symptoms:\n\
         {}\n\
         \n\
         Predicted disease:\n\
         {} (confidence: {:.2})\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Explain clearly why this disease matches the symptoms.",
        symptoms, disease, confidence, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_guardrails() {
        let p = build_explanation_prompt("fever and chills", "Dengue", 0.8125, "DISEASE: Dengue ...");
        assert!(p.contains("DO NOT introduce new diseases."));
        assert!(p.contains("DO NOT give treatment advice."));
        assert!(p.contains("DO NOT make a diagnosis."));
        assert!(p.contains("Base your answer ONLY on the context."));
    }

    #[test]
    fn test_prompt_confidence_two_decimals() {
        let p = build_explanation_prompt("fever", "Dengue", 0.8125, "");
        assert!(p.contains("Dengue (confidence: 0.81)"));
    }

    #[test]
    fn test_prompt_marks_patient_text_for_classifier() {
        // The content classifier keys on this label to force local routing
        let p = build_explanation_prompt("fever", "Dengue", 0.5, "");
        assert!(p.contains("User symptoms:"));
        let clf = crate::classification::DataClassifier::default();
        assert_eq!(clf.classify(&p), crate::classification::DataClass::Confidential);
    }
}
