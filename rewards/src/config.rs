//! Reward configuration

use crate::resource_log::ResourceKind;
use crate::{Error, Result};
use ledger_core::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reward distributor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Minimum efficiency score (0..=100) a claim must reach
    pub threshold: u32,

    /// Benchmark usage per resource kind
    pub benchmarks: BTreeMap<String, u64>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            benchmarks: BTreeMap::new(),
        }
    }
}

impl RewardConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        let config: RewardConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    ///
    /// Only the threshold is read from the environment; benchmarks come from
    /// a config file or governance.
    pub fn from_env() -> Result<Self> {
        let mut config = RewardConfig::default();

        if let Ok(threshold) = std::env::var("REWARD_THRESHOLD") {
            config.threshold = threshold
                .parse()
                .map_err(|e| Error::Config(format!("REWARD_THRESHOLD: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Builder-style benchmark setter
    pub fn with_benchmark(mut self, kind: impl Into<String>, benchmark: u64) -> Self {
        self.benchmarks.insert(kind.into(), benchmark);
        self
    }

    /// Benchmark for a resource kind
    pub fn benchmark_for(&self, kind: &str) -> Option<Amount> {
        self.benchmarks.get(kind).map(|b| Amount::from(*b))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(Error::Config(format!(
                "threshold {} exceeds 100",
                self.threshold
            )));
        }
        for (kind, benchmark) in &self.benchmarks {
            ResourceKind::new(kind.as_str())?;
            if *benchmark == 0 {
                return Err(Error::Config(format!("benchmark for {} must be positive", kind)));
            }
        }
        Ok(())
    }
}
