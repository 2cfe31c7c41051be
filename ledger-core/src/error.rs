//! Error types for the ledger

use crate::types::{Amount, Principal};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every variant rejects the whole operation; no partial state survives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller lacks the required role or identity
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Operation issued before `initialize`
    #[error("Ledger not initialized")]
    NotInitialized,

    /// `initialize` issued twice
    #[error("Ledger already initialized")]
    AlreadyInitialized,

    /// Zero, overflowing, or otherwise unusable amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Recipient equal to sender / caller, or otherwise unusable
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(Principal),

    /// Memo longer than the allowed size
    #[error("Invalid memo: {0} bytes")]
    InvalidMemo(usize),

    /// Malformed token name
    #[error("Invalid token name: {0:?}")]
    InvalidName(String),

    /// Malformed token symbol
    #[error("Invalid token symbol: {0:?}")]
    InvalidSymbol(String),

    /// Too many decimals
    #[error("Invalid decimals: {0}")]
    InvalidDecimals(u8),

    /// Malformed token URI
    #[error("Invalid token URI: {0:?}")]
    InvalidUri(String),

    /// Account balance below the requested amount
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount requested
        required: Amount,
        /// Amount held
        available: Amount,
    },

    /// Ledger is globally paused
    #[error("Ledger is paused")]
    Paused,

    /// Account is blacklisted
    #[error("Account blacklisted: {0}")]
    Blacklisted(Principal),

    /// Mint would push supply above the cap
    #[error("Mint cap exceeded: supply {supply} + {requested} > cap {cap}")]
    MintCapExceeded {
        /// Amount requested
        requested: Amount,
        /// Supply before the mint
        supply: Amount,
        /// Current mint cap
        cap: Amount,
    },

    /// Minter set is full
    #[error("Maximum number of minters ({0}) reached")]
    MaxMintersExceeded(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable numeric error code
    pub fn code(&self) -> u32 {
        match self {
            Error::NotAuthorized(_) => 100,
            Error::NotInitialized => 101,
            Error::AlreadyInitialized => 102,
            Error::InvalidAmount(_) => 103,
            Error::InvalidRecipient(_) => 104,
            Error::InvalidMemo(_) => 105,
            Error::InvalidName(_) => 106,
            Error::InvalidSymbol(_) => 107,
            Error::InvalidDecimals(_) => 108,
            Error::InvalidUri(_) => 109,
            Error::InsufficientBalance { .. } => 110,
            Error::Paused => 111,
            Error::Blacklisted(_) => 112,
            Error::MintCapExceeded { .. } => 113,
            Error::MaxMintersExceeded(_) => 114,
            Error::Config(_) => 190,
        }
    }

    /// Short machine-readable kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotAuthorized(_) => "not_authorized",
            Error::NotInitialized => "not_initialized",
            Error::AlreadyInitialized => "already_initialized",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::InvalidRecipient(_) => "invalid_recipient",
            Error::InvalidMemo(_) => "invalid_memo",
            Error::InvalidName(_) => "invalid_name",
            Error::InvalidSymbol(_) => "invalid_symbol",
            Error::InvalidDecimals(_) => "invalid_decimals",
            Error::InvalidUri(_) => "invalid_uri",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::Paused => "paused",
            Error::Blacklisted(_) => "blacklisted",
            Error::MintCapExceeded { .. } => "mint_cap_exceeded",
            Error::MaxMintersExceeded(_) => "max_minters_exceeded",
            Error::Config(_) => "config",
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
    fn test_codes_are_unique() {
        let errors = vec![
            Error::NotAuthorized("x".into()),
            Error::NotInitialized,
            Error::AlreadyInitialized,
            Error::InvalidAmount("x".into()),
            Error::InvalidRecipient(Principal::new("x")),
            Error::InvalidMemo(35),
            Error::InvalidName("x".into()),
            Error::InvalidSymbol("x".into()),
            Error::InvalidDecimals(19),
            Error::InvalidUri("x".into()),
            Error::InsufficientBalance { required: 2, available: 1 },
            Error::Paused,
            Error::Blacklisted(Principal::new("x")),
            Error::MintCapExceeded { requested: 1, supply: 1, cap: 1 },
            Error::MaxMintersExceeded(10),
            Error::Config("x".into()),
        ];

        let mut codes: Vec<u32> = errors.iter().map(Error::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
