//! Configuration for the ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Upper bound on the minter role set
    pub max_minters: usize,

    /// Record Prometheus metrics
    pub metrics_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "ledger-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            max_minters: 10,
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::Error::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(max) = std::env::var("LEDGER_MAX_MINTERS") {
            config.max_minters = max
                .parse()
                .map_err(|e| crate::Error::Config(format!("LEDGER_MAX_MINTERS: {}", e)))?;
        }

        if let Ok(enabled) = std::env::var("LEDGER_METRICS_ENABLED") {
            config.metrics_enabled = enabled
                .parse()
                .map_err(|e| crate::Error::Config(format!("LEDGER_METRICS_ENABLED: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.max_minters == 0 {
            return Err(crate::Error::Config(
                "max_minters must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
