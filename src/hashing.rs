//! Content hashing: the sole change-detection signal (spec §4.4).
//!
//! Timestamps are never used for freshness — only equality of this hash.

use sha2::{Digest, Sha256};

/// First 16 hex characters of the SHA-256 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let full = hex_encode(&digest);
    full[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = content_hash(b"hello world");
        let b = content_hash(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn sensitive_to_content() {
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
    }

    #[test]
    fn empty_input() {
        let h = content_hash(b"");
        assert_eq!(h.len(), 16);
    }
}
