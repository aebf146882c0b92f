//! LLM router — selects a backend based on data classification policy.
//!
//! CONFIDENTIAL prompts are hard-blocked from non-local backends; there is
//! no configuration that overrides that.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::audit::AuditLog;
use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};
use crate::classification::{DataClass, DataClassifier};

/// Routing policy controlling which backends serve each data class.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    /// If true, INTERNAL data may be sent to remote backends (audited).
    pub allow_internal_remote: bool,
    /// If true, all calls are forced to local backends regardless of class.
    pub local_only_mode: bool,
    /// Preferred backend name for PUBLIC data.
    pub default_backend: String,
    /// Local backend name (used whenever remote is blocked).
    pub local_backend: String,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            allow_internal_remote: false,
            local_only_mode: true,
            default_backend: "ollama".to_string(),
            local_backend: "ollama".to_string(),
        }
    }
}

/// Routes LLM requests to appropriate backends based on data classification.
pub struct LlmRouter {
    backends: HashMap<String, Arc<dyn LlmBackend>>,
    policy: RoutingPolicy,
    classifier: DataClassifier,
    audit: Option<AuditLog>,
}

impl LlmRouter {
    pub fn new(policy: RoutingPolicy) -> Self {
        Self {
            backends: HashMap::new(),
            policy,
            classifier: DataClassifier::default(),
            audit: None,
        }
    }

    pub fn register_backend(&mut self, name: impl Into<String>, backend: Arc<dyn LlmBackend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn registered_backends(&self) -> Vec<&str> {
        self.backends.keys().map(|k| k.as_str()).collect()
    }

    /// Route a request after scanning its content for classification.
    pub async fn route(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let prompt_text = req
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let data_class = self.classifier.classify(&prompt_text);
        self.route_as(req, data_class).await
    }

    /// Route a request whose data class the caller already knows.
    pub async fn route_as(
        &self,
        req: LlmRequest,
        data_class: DataClass,
    ) -> Result<LlmResponse, LlmError> {
        let (name, backend) = self.select_backend(&data_class)?;

        tracing::info!(
            model = backend.model_id(),
            backend = name,
            data_class = data_class.as_str(),
            is_local = backend.is_local(),
            "LLM request routed"
        );

        let start = Instant::now();
        let resp = backend.complete(req).await?;

        if let Some(audit) = &self.audit {
            audit.record(
                backend.model_id(),
                name,
                resp.prompt_tokens,
                resp.completion_tokens,
                data_class.as_str(),
                &resp.content,
                start.elapsed().as_millis() as u64,
            );
        }

        Ok(resp)
    }

    fn select_backend(&self, class: &DataClass) -> Result<(&str, &Arc<dyn LlmBackend>), LlmError> {
        let get = |name: &str| -> Option<(&str, &Arc<dyn LlmBackend>)> {
            self.backends.get_key_value(name).map(|(k, v)| (k.as_str(), v))
        };

        match class {
            DataClass::Confidential => {
                // HARD BLOCK: confidential data never leaves local
                let (name, b) = get(&self.policy.local_backend).ok_or_else(|| {
                    LlmError::Unavailable(
                        "Local backend not available for CONFIDENTIAL data".to_string(),
                    )
                })?;
                if !b.is_local() {
                    return Err(LlmError::PolicyBlocked(
                        "CONFIDENTIAL data cannot be sent to a remote LLM".to_string(),
                    ));
                }
                Ok((name, b))
            }

            DataClass::Internal => {
                if self.policy.local_only_mode || !self.policy.allow_internal_remote {
                    get(&self.policy.local_backend).ok_or_else(|| {
                        LlmError::Unavailable("Local backend not configured".to_string())
                    })
                } else {
                    tracing::warn!(
                        "Routing INTERNAL data to remote backend — audit log should be active"
                    );
                    get(&self.policy.default_backend).ok_or_else(|| {
                        LlmError::Unavailable("Default backend not configured".to_string())
                    })
                }
            }

            DataClass::Public => {
                if self.policy.local_only_mode {
                    get(&self.policy.local_backend).ok_or_else(|| {
                        LlmError::Unavailable("Local backend not configured".to_string())
                    })
                } else {
                    get(&self.policy.default_backend).ok_or_else(|| {
                        LlmError::Unavailable("Default backend not configured".to_string())
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Message, OllamaBackend, OpenAiCompatibleBackend};

    fn router_with(policy: RoutingPolicy) -> LlmRouter {
        let mut router = LlmRouter::new(policy);
        router.register_backend(
            "ollama",
            Arc::new(OllamaBackend::new("http://localhost:11434", "llama3.1")),
        );
        router.register_backend(
            "remote",
            Arc::new(OpenAiCompatibleBackend::new(
                "https://api.example.com",
                "remote-model",
                None,
            )),
        );
        router
    }

    #[test]
    fn test_confidential_selects_local_even_with_remote_default() {
        let router = router_with(RoutingPolicy {
            local_only_mode: false,
            allow_internal_remote: true,
            default_backend: "remote".to_string(),
            local_backend: "ollama".to_string(),
        });
        let (name, b) = router.select_backend(&DataClass::Confidential).unwrap();
        assert_eq!(name, "ollama");
        assert!(b.is_local());
    }

    #[test]
    fn test_confidential_blocked_when_local_backend_is_remote() {
        let mut router = LlmRouter::new(RoutingPolicy {
            local_only_mode: false,
            allow_internal_remote: true,
            default_backend: "remote".to_string(),
            local_backend: "remote".to_string(),
        });
        router.register_backend(
            "remote",
            Arc::new(OpenAiCompatibleBackend::new("https://api.example.com", "m", None)),
        );
        let err = router.select_backend(&DataClass::Confidential).unwrap_err();
        assert!(matches!(err, LlmError::PolicyBlocked(_)));
    }

    #[test]
    fn test_local_only_forces_local_for_public() {
        let router = router_with(RoutingPolicy {
            local_only_mode: true,
            allow_internal_remote: false,
            default_backend: "remote".to_string(),
            local_backend: "ollama".to_string(),
        });
        let (name, _) = router.select_backend(&DataClass::Public).unwrap();
        assert_eq!(name, "ollama");
    }

    #[test]
    fn test_public_uses_default_when_remote_allowed() {
        let router = router_with(RoutingPolicy {
            local_only_mode: false,
            allow_internal_remote: false,
            default_backend: "remote".to_string(),
            local_backend: "ollama".to_string(),
        });
        let (name, _) = router.select_backend(&DataClass::Public).unwrap();
        assert_eq!(name, "remote");
    }

    #[test]
    fn test_internal_stays_local_unless_allowed() {
        let router = router_with(RoutingPolicy {
            local_only_mode: false,
            allow_internal_remote: false,
            default_backend: "remote".to_string(),
            local_backend: "ollama".to_string(),
        });
        let (name, _) = router.select_backend(&DataClass::Internal).unwrap();
        assert_eq!(name, "ollama");
    }

    #[test]
    fn test_missing_backend_is_unavailable() {
        let router = LlmRouter::new(RoutingPolicy::default());
        let err = router.select_backend(&DataClass::Public).unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_route_classifies_patient_text_confidential() {
        // Only a remote backend registered as local: routing patient text
        // must fail with PolicyBlocked before any network call.
        let mut router = LlmRouter::new(RoutingPolicy {
            local_only_mode: false,
            allow_internal_remote: true,
            default_backend: "remote".to_string(),
            local_backend: "remote".to_string(),
        });
        router.register_backend(
            "remote",
            Arc::new(OpenAiCompatibleBackend::new("https://api.example.com", "m", None)),
        );

        let req = LlmRequest {
            messages: vec![Message::user("User symptoms:\nfever and chills")],
            model: None,
            max_tokens: None,
            temperature: None,
        };
        let err = router.route(req).await.unwrap_err();
        assert!(matches!(err, LlmError::PolicyBlocked(_)));
    }
}
