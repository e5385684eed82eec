//! One-way hashing of plaintext credentials.
//!
//! Credentials carry 256 bits of entropy, so an unsalted SHA-256 digest is a
//! sufficient lookup key; no slow password hash is involved.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of leading plaintext characters kept for display.
pub const DISPLAY_PREFIX_LEN: usize = 12;

/// Hash a plaintext credential to 64 lowercase hex characters.
pub fn hash(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// First [`DISPLAY_PREFIX_LEN`] characters of the plaintext, or all of it if
/// shorter.
pub fn display_prefix(plaintext: &str) -> String {
    plaintext.chars().take(DISPLAY_PREFIX_LEN).collect()
}

/// Compare two digests without short-circuiting on the first difference.
pub fn hashes_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_hex() {
        let first = hash("kg_live_example");
        assert_eq!(first, hash("kg_live_example"));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_known_vector() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn distinct_inputs_hash_differently() {
        assert_ne!(hash("kg_live_a"), hash("kg_live_b"));
    }

    #[test]
    fn prefix_truncates_long_input() {
        let plaintext = "kg_live_0123456789abcdef";
        let prefix = display_prefix(plaintext);
        assert_eq!(prefix, "kg_live_0123");
        assert_ne!(prefix, plaintext);
    }

    #[test]
    fn prefix_returns_short_input_whole() {
        assert_eq!(display_prefix("short"), "short");
        assert_eq!(display_prefix(""), "");
    }

    #[test]
    fn hashes_match_compares_full_value() {
        let h = hash("x");
        assert!(hashes_match(&h, &hash("x")));
        assert!(!hashes_match(&h, &hash("y")));
        assert!(!hashes_match(&h, &h[..32]));
    }
}
