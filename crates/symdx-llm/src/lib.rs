//! symdx-llm — LLM backend abstraction, routing, and the RAG explainer.
//!
//! Patient-entered text is confidential and must never reach a non-local
//! backend; the router enforces that policy. The explainer turns a
//! prediction into a grounded explanation — it never predicts diseases.

pub mod backend;
pub mod classification;
pub mod router;
pub mod audit;
pub mod explainer;

pub use audit::{AuditLog, LlmAuditEntry};
pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OllamaBackend, OpenAiCompatibleBackend};
pub use classification::{DataClass, DataClassifier};
pub use explainer::{ExplainerDoc, RagExplainer};
pub use router::{LlmRouter, RoutingPolicy};
