//! CarbonRail Rewards
//!
//! Resource usage admission and credit distribution:
//!
//! - [`ResourceLog`]: records oracle-attested usage entries
//! - [`efficiency`]: pure score and credit formula
//! - [`RewardDistributor`]: claims entries and mints credits through the ledger
//!
//! A claim flips the entry's claimed flag only after the mint commits, so an
//! entry is never marked claimed without its credits (or vice versa).

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod distributor;
pub mod efficiency;
pub mod error;
pub mod resource_log;

pub use config::RewardConfig;
pub use distributor::{FixedRate, RateProvider, RewardDistributor};
pub use efficiency::{evaluate, Efficiency};
pub use error::{Error, Result};
pub use resource_log::{EntryKey, ResourceKind, ResourceLog, ResourceLogEntry, SharedResourceLog};
