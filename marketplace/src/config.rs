//! Configuration for the marketplace

use crate::{Error, Result};
use ledger_core::Principal;
use serde::{Deserialize, Serialize};

/// Marketplace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account holding listed credits
    pub escrow: Principal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escrow: Principal::new("marketplace-escrow"),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(escrow) = std::env::var("MARKETPLACE_ESCROW") {
            config.escrow = Principal::new(escrow);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.escrow.as_str().is_empty() {
            return Err(Error::Config("escrow principal must not be empty".to_string()));
        }
        Ok(())
    }
}
