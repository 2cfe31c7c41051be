//! Error types for the marketplace

use ledger_core::{Amount, Principal};
use thiserror::Error;

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marketplace errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No open listing under (seller, id)
    #[error("Listing not found: {seller}#{id}")]
    ListingNotFound {
        /// Seller
        seller: Principal,
        /// Per-seller listing ID
        id: u64,
    },

    /// Buyer's payment balance below the price
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Price
        required: Amount,
        /// Payment balance held
        available: Amount,
    },

    /// Zero or overflowing amount or price
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Seller attempted to fill their own listing
    #[error("Seller cannot buy own listing")]
    SelfPurchase,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ledger rejected a credit transfer
    #[error(transparent)]
    Ledger(#[from] ledger_core::Error),
}

impl Error {
    /// Stable numeric error code
    pub fn code(&self) -> u32 {
        match self {
            Error::ListingNotFound { .. } => 400,
            Error::InsufficientFunds { .. } => 401,
            Error::InvalidAmount(_) => 402,
            Error::SelfPurchase => 403,
            Error::Config(_) => 490,
            Error::Ledger(e) => e.code(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}
