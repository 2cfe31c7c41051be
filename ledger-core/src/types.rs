//! Core types for the credit ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (integer base units, checked)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in base units (fixed-point, see [`TokenMetadata::decimals`])
pub type Amount = u128;

/// Maximum token name length (bytes)
pub const MAX_NAME_LEN: usize = 32;

/// Maximum token symbol length (bytes)
pub const MAX_SYMBOL_LEN: usize = 10;

/// Maximum declared decimals
pub const MAX_DECIMALS: u8 = 18;

/// Maximum token URI length (bytes)
pub const MAX_URI_LEN: usize = 256;

/// Maximum transfer memo length (bytes)
pub const MAX_MEMO_LEN: usize = 34;

/// Opaque account identifier (wallet or contract principal)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Administrative role held by a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// May mint new credits
    Minter = 1,
    /// May burn own credits
    Burner = 2,
    /// May pause and unpause the ledger
    Pauser = 3,
    /// May add and remove blacklist entries
    Blacklister = 4,
}

impl Role {
    /// All roles, in declaration order
    pub const ALL: [Role; 4] = [Role::Minter, Role::Burner, Role::Pauser, Role::Blacklister];

    /// Lowercase role name
    pub fn name(&self) -> &'static str {
        match self {
            Role::Minter => "minter",
            Role::Burner => "burner",
            Role::Pauser => "pauser",
            Role::Blacklister => "blacklister",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Token metadata fixed at initialization (URI is owner-updatable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human readable name
    pub name: String,

    /// Ticker symbol
    pub symbol: String,

    /// Number of decimals in the fixed-point representation
    pub decimals: u8,

    /// Optional metadata URI
    pub uri: Option<String>,
}

impl TokenMetadata {
    /// Validate and build metadata
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        uri: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        let symbol = symbol.into();

        if name.is_empty() || name.len() > MAX_NAME_LEN || !name.is_ascii() {
            return Err(Error::InvalidName(name));
        }
        if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN || !symbol.is_ascii() {
            return Err(Error::InvalidSymbol(symbol));
        }
        if decimals > MAX_DECIMALS {
            return Err(Error::InvalidDecimals(decimals));
        }
        validate_uri(uri.as_deref())?;

        Ok(Self {
            name,
            symbol,
            decimals,
            uri,
        })
    }
}

/// Validate an optional token URI
pub fn validate_uri(uri: Option<&str>) -> Result<()> {
    match uri {
        Some(uri) if uri.is_empty() || uri.len() > MAX_URI_LEN || !uri.is_ascii() => {
            Err(Error::InvalidUri(uri.to_string()))
        }
        _ => Ok(()),
    }
}

/// Validate an optional transfer memo
pub fn validate_memo(memo: Option<&[u8]>) -> Result<()> {
    match memo {
        Some(memo) if memo.len() > MAX_MEMO_LEN => Err(Error::InvalidMemo(memo.len())),
        _ => Ok(()),
    }
}
