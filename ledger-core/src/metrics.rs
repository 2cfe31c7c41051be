//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_transfers_total` - Committed transfers
//! - `ledger_mints_total` - Committed mints
//! - `ledger_burns_total` - Committed burns
//! - `ledger_rejections_total{operation, kind}` - Rejected operations
//! - `ledger_total_supply` - Outstanding supply (base units)

use prometheus::{Gauge, IntCounter, IntCounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so several ledgers can live in one
/// process without colliding in the global default registry.
#[derive(Clone)]
pub struct Metrics {
    /// Committed transfers
    pub transfers_total: IntCounter,

    /// Committed mints
    pub mints_total: IntCounter,

    /// Committed burns
    pub burns_total: IntCounter,

    /// Rejected operations by operation and error kind
    pub rejections_total: IntCounterVec,

    /// Outstanding supply
    pub total_supply: Gauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transfers_total =
            IntCounter::new("ledger_transfers_total", "Total number of committed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let mints_total = IntCounter::new("ledger_mints_total", "Total number of committed mints")?;
        registry.register(Box::new(mints_total.clone()))?;

        let burns_total = IntCounter::new("ledger_burns_total", "Total number of committed burns")?;
        registry.register(Box::new(burns_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("ledger_rejections_total", "Rejected ledger operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let total_supply = Gauge::new("ledger_total_supply", "Outstanding supply in base units")?;
        registry.register(Box::new(total_supply.clone()))?;

        Ok(Self {
            transfers_total,
            mints_total,
            burns_total,
            rejections_total,
            total_supply,
            registry,
        })
    }

    /// Record committed transfer
    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    /// Record committed mint
    pub fn record_mint(&self) {
        self.mints_total.inc();
    }

    /// Record committed burn
    pub fn record_burn(&self) {
        self.burns_total.inc();
    }

    /// Record rejected operation
    pub fn record_rejection(&self, operation: &str, kind: &str) {
        self.rejections_total.with_label_values(&[operation, kind]).inc();
    }

    /// Update supply gauge (lossy above 2^53)
    pub fn update_total_supply(&self, supply: u128) {
        self.total_supply.set(supply as f64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("transfers_total", &self.transfers_total.get())
            .field("mints_total", &self.mints_total.get())
            .field("burns_total", &self.burns_total.get())
            .finish_non_exhaustive()
    }
}
