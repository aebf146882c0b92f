//! Audit logging for LLM calls.
//!
//! One JSON line per call. Output text is stored only as a hash.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub model: String,
    pub backend: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub data_class: String,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(
        model: String,
        backend: String,
        prompt_tokens: u32,
        completion_tokens: u32,
        data_class: String,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model,
            backend,
            prompt_tokens,
            completion_tokens,
            data_class,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }
}

/// Append-only jsonl audit log.
pub struct AuditLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), writer: Mutex::new(()) }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        model: &str,
        backend: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
        data_class: &str,
        output: &str,
        latency_ms: u64,
    ) {
        let entry = LlmAuditEntry::new(
            model.to_string(),
            backend.to_string(),
            prompt_tokens,
            completion_tokens,
            data_class.to_string(),
            output,
            latency_ms,
        );

        // Audit failures must not break the call path; log and continue.
        let _guard = self.writer.lock().unwrap();
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| {
                let line = serde_json::to_string(&entry).unwrap_or_default();
                writeln!(f, "{}", line)
            });
        if let Err(e) = result {
            warn!("Failed to write LLM audit entry: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stored_as_hash_only() {
        let entry = LlmAuditEntry::new(
            "llama3.1".into(),
            "ollama".into(),
            100,
            20,
            "CONFIDENTIAL".into(),
            "the patient has dengue",
            42,
        );
        assert_eq!(entry.output_hash.len(), 64);
        assert!(!entry.output_hash.contains("patient"));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("the patient has dengue"));
    }

    #[test]
    fn test_audit_log_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&path);
        log.record("m", "b", 1, 2, "PUBLIC", "out", 5);
        log.record("m", "b", 3, 4, "PUBLIC", "out2", 6);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: LlmAuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.prompt_tokens, 1);
    }
}
