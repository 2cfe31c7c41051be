//! Error types for resource logging and reward distribution

use crate::resource_log::EntryKey;
use thiserror::Error;

/// Result type for reward operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reward errors
///
/// Ledger and oracle failures are wrapped unchanged and keep their codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller is not governance
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// No entry under this key
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryKey),

    /// Entry already rewarded
    #[error("Entry already claimed: {0}")]
    AlreadyClaimed(EntryKey),

    /// Efficiency score under the configured threshold
    #[error("Score {score} below threshold {threshold}")]
    BelowThreshold {
        /// Computed score
        score: u32,
        /// Required score
        threshold: u32,
    },

    /// Score passes but the credits round down to zero
    #[error("Entry {0} earns no credits")]
    NoCredits(EntryKey),

    /// Entry key already present
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(EntryKey),

    /// Zero or otherwise unusable amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Resource kind label empty or too long
    #[error("Invalid resource kind: {0:?}")]
    InvalidResourceKind(String),

    /// No benchmark configured for the resource kind
    #[error("No benchmark for resource kind {0:?}")]
    MissingBenchmark(String),

    /// Recipient and amount sequences differ in length
    #[error("Batch length mismatch: {recipients} recipients, {amounts} amounts")]
    BatchLengthMismatch {
        /// Recipients supplied
        recipients: usize,
        /// Amounts supplied
        amounts: usize,
    },

    /// Credit computation out of range
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Oracle gate rejected the proof
    #[error(transparent)]
    Oracle(#[from] oracle_gate::Error),

    /// Ledger rejected the mint
    #[error(transparent)]
    Ledger(#[from] ledger_core::Error),
}

impl Error {
    /// Stable numeric error code
    pub fn code(&self) -> u32 {
        match self {
            Error::NotAuthorized(_) => 100,
            Error::EntryNotFound(_) => 300,
            Error::AlreadyClaimed(_) => 301,
            Error::BelowThreshold { .. } => 302,
            Error::DuplicateEntry(_) => 303,
            Error::InvalidAmount(_) => 304,
            Error::InvalidResourceKind(_) => 305,
            Error::MissingBenchmark(_) => 306,
            Error::BatchLengthMismatch { .. } => 307,
            Error::ArithmeticOverflow(_) => 308,
            Error::NoCredits(_) => 309,
            Error::Config(_) => 390,
            Error::Oracle(e) => e.code(),
            Error::Ledger(e) => e.code(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_codes_propagate() {
        let err: Error = ledger_core::Error::MintCapExceeded {
            requested: 1,
            supply: 1,
            cap: 1,
        }
        .into();
        assert_eq!(err.code(), 113);

        let err: Error = oracle_gate::Error::DuplicateNonce(3).into();
        assert_eq!(err.code(), 202);
    }
}
