//! Content-addressed finding identity.
//!
//! The fingerprint is the dedup key within a pass and the delete/upsert key
//! against the persistent store, so it must be a pure function of its
//! inputs: identical `(category, line_number, content)` always hashes to
//! the identical value, which makes replaying persistence operations safe.

use crate::core::severity::ThreatCategory;
use sha2::{Digest, Sha256};

/// Number of leading hex characters kept from the SHA-256 digest.
const FINGERPRINT_HEX_LEN: usize = 16;

/// Compute the 16-hex-char fingerprint of a finding identity.
///
/// Absent line number or content hash as the empty string, so
/// `fingerprint(c, None, None)` is still well defined (post-pass findings
/// carry no line number).
pub fn fingerprint(
    category: ThreatCategory,
    line_number: Option<u64>,
    content: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(b":");
    if let Some(n) = line_number {
        hasher.update(n.to_string().as_bytes());
    }
    hasher.update(b":");
    if let Some(c) = content {
        hasher.update(c.as_bytes());
    }
    hex::encode(&hasher.finalize()[..FINGERPRINT_HEX_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint(ThreatCategory::SqlInjection, Some(42), Some("payload"));
        let b = fingerprint(ThreatCategory::SqlInjection, Some(42), Some("payload"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_distinguishes_each_input() {
        let base = fingerprint(ThreatCategory::Xss, Some(1), Some("x"));
        assert_ne!(base, fingerprint(ThreatCategory::SqlInjection, Some(1), Some("x")));
        assert_ne!(base, fingerprint(ThreatCategory::Xss, Some(2), Some("x")));
        assert_ne!(base, fingerprint(ThreatCategory::Xss, Some(1), Some("y")));
    }

    #[test]
    fn absent_fields_hash_as_empty() {
        let a = fingerprint(ThreatCategory::RateAnomaly, None, None);
        let b = fingerprint(ThreatCategory::RateAnomaly, None, None);
        assert_eq!(a, b);
        assert_ne!(a, fingerprint(ThreatCategory::RateAnomaly, Some(0), None));
    }
}
