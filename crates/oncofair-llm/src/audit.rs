//! Audit records for insight-generation calls.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightAuditEntry {
    pub id: Uuid,
    pub task: String,
    pub model: String,
    pub backend: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub is_biased: bool,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl InsightAuditEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task: &str,
        model: String,
        backend: String,
        prompt_tokens: u32,
        completion_tokens: u32,
        is_biased: bool,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task: task.to_string(),
            model,
            backend,
            prompt_tokens,
            completion_tokens,
            is_biased,
            output_hash: sha256_hex(output),
            latency_ms,
            called_at: Utc::now(),
        }
    }
}

fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_hashed_not_stored() {
        let entry = InsightAuditEntry::new(
            "her2", "grok-2-1212".into(), "openai_compatible".into(), 10, 20, true, "abc", 5,
        );
        assert_eq!(
            entry.output_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(entry.task, "her2");
        assert!(entry.is_biased);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = InsightAuditEntry::new("lung", "m".into(), "b".into(), 0, 0, false, "x", 0);
        let b = InsightAuditEntry::new("lung", "m".into(), "b".into(), 0, 0, false, "x", 0);
        assert_ne!(a.id, b.id);
        assert_eq!(a.output_hash, b.output_hash);
    }
}
