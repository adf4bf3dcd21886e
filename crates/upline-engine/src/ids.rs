// ─────────────────────────────────────────────────────────────────
// Prefixed record identifiers
//
// COM… ids: SHA3-256 over (prefix, sequence, payload), truncated to
// 16 hex chars. Deterministic given the store's monotonic sequence,
// so replays of the same state produce the same ids.
// ─────────────────────────────────────────────────────────────────

use sha3::{Digest, Sha3_256};

pub fn prefixed_id(prefix: &str, seq: u64, payload: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(payload.as_bytes());
    format!(
        "{}{}",
        prefix,
        &hex::encode(hasher.finalize())[..16].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deterministic_and_prefixed() {
        let a = prefixed_id("COM", 7, "M1@1700000000");
        let b = prefixed_id("COM", 7, "M1@1700000000");
        assert_eq!(a, b);
        assert!(a.starts_with("COM"));
        assert_eq!(a.len(), 3 + 16);
    }

    #[test]
    fn sequence_and_payload_both_matter() {
        let base = prefixed_id("COM", 1, "M1");
        assert_ne!(base, prefixed_id("COM", 2, "M1"));
        assert_ne!(base, prefixed_id("COM", 1, "M2"));
        assert_ne!(base, prefixed_id("TXN", 1, "M1"));
    }
}
