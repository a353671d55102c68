//! Deterministic request fingerprinting (§3 "Fingerprint (SharedLLM)").
//!
//! Two logically equivalent requests must yield byte-identical fingerprints, so the canonical
//! form is built by hand rather than through `serde_json::to_string` — a hand-rolled serializer
//! lets every step (key sort, volatile-key drop) stay infallible and auditable in one place.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Keys dropped from every object level before hashing — values expected to differ between
/// otherwise-identical requests (§3: "drop volatile keys").
fn is_volatile(key: &str) -> bool {
    matches!(key, "stream" | "request_id")
}

fn canonical_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical_string).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let parts: Vec<String> = entries
                .into_iter()
                .filter(|(k, _)| !is_volatile(k))
                .map(|(k, v)| format!("{k:?}:{}", canonical_string(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

/// SHA-256 fingerprint over canonical `(operation, normalized_params)`.
pub fn fingerprint(operation: &str, params: &Value) -> String {
    let canonical = format!("{operation}:{}", canonical_string(params));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equivalent_requests_hash_identically() {
        let a = json!({"model": "m", "messages": [{"role": "user", "content": "hi"}], "stream": true});
        let b = json!({"stream": false, "messages": [{"role": "user", "content": "hi"}], "model": "m"});
        assert_eq!(fingerprint("chat", &a), fingerprint("chat", &b));
    }

    #[test]
    fn different_operation_hashes_differently() {
        let p = json!({"model": "m"});
        assert_ne!(fingerprint("chat", &p), fingerprint("embed", &p));
    }

    #[test]
    fn request_id_does_not_affect_fingerprint() {
        let a = json!({"model": "m", "request_id": "abc"});
        let b = json!({"model": "m", "request_id": "xyz"});
        assert_eq!(fingerprint("chat", &a), fingerprint("chat", &b));
    }

    #[test]
    fn differing_content_hashes_differently() {
        let a = json!({"model": "m"});
        let b = json!({"model": "n"});
        assert_ne!(fingerprint("chat", &a), fingerprint("chat", &b));
    }
}
