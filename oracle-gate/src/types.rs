//! Proof values

use ledger_core::crypto::{hash_bytes, to_hex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 32-byte proof produced by the off-chain oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofHash([u8; 32]);

impl ProofHash {
    /// Wrap raw proof bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// SHA-256 of arbitrary attestation data
    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        Self(hash_bytes(data.as_ref()))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ProofHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex(&self.0))
    }
}
