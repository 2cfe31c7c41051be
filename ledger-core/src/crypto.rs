//! Hashing for the ledger event chain
//!
//! This module provides:
//! - SHA-256 hashing over canonical (bincode) bytes
//! - Hash-chain linking of consecutive events

use sha2::{Digest, Sha256};

/// Hash of the (virtual) event preceding the first one
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash an event body linked to its predecessor
///
/// `H(previous_hash || body)`; any edit to an earlier event changes every
/// later hash.
pub fn chain_hash(previous_hash: &[u8; 32], body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash);
    hasher.update(body);
    hasher.finalize().into()
}

/// Lowercase hex rendering of a digest
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"carbon";
        assert_eq!(hash_bytes(data), hash_bytes(data));
        assert_ne!(hash_bytes(data), hash_bytes(b"credit"));
    }

    #[test]
    fn test_chain_depends_on_previous() {
        let a = chain_hash(&GENESIS_HASH, b"event");
        let b = chain_hash(&hash_bytes(b"other"), b"event");
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
    }
}
