//! Error types for the oracle gate

use ledger_core::Principal;
use thiserror::Error;

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Oracle gate errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller is not the trusted oracle (or admin, for rotation)
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// No expected proof registered for the submitter's next nonce
    #[error("Unknown nonce {nonce} for {submitter}")]
    UnknownNonce {
        /// Submitter being validated
        submitter: Principal,
        /// Nonce looked up
        nonce: u64,
    },

    /// Proof differs from the expected value
    #[error("Proof mismatch at nonce {nonce} for {submitter}")]
    ProofMismatch {
        /// Submitter being validated
        submitter: Principal,
        /// Nonce compared against
        nonce: u64,
    },

    /// Expected proof already registered at this nonce
    #[error("Nonce {0} already registered")]
    DuplicateNonce(u64),
}

impl Error {
    /// Stable numeric error code
    pub fn code(&self) -> u32 {
        match self {
            Error::NotAuthorized(_) => 100,
            Error::UnknownNonce { .. } => 200,
            Error::ProofMismatch { .. } => 201,
            Error::DuplicateNonce(_) => 202,
        }
    }
}
