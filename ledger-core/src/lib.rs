//! CarbonRail Ledger Core
//!
//! Fungible carbon-credit ledger with role-gated mint, burn, pause and
//! blacklist controls under a hard supply cap.
//!
//! # Architecture
//!
//! - **Single owned state**: balances, supply, roles and flags live in one
//!   [`LedgerState`] value mutated only through [`Ledger`] operations
//! - **Atomic operations**: every precondition is checked before mutation;
//!   composite work runs inside [`Ledger::atomically`]
//! - **Event log**: each committed mutation appends one hash-chained event
//!
//! # Invariants
//!
//! - Supply conservation: Σ(balances) == total supply ≤ mint cap
//! - Rejected operations leave state and event log untouched
//! - Blacklisted accounts are excluded from every balance mutation

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod state;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventKind, EventLog, LedgerEvent};
pub use ledger::{Ledger, SharedLedger};
pub use metrics::Metrics;
pub use state::LedgerState;
pub use types::{Amount, Principal, Role, TokenMetadata};
