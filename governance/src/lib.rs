//! CarbonRail Governance
//!
//! Member-voted proposals that set the credit rate consumed by reward
//! distribution and exercise owner authority over the ledger.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod governance;

pub use error::{Error, Result};
pub use governance::{Governance, Proposal, ProposalAction, ProposalStatus, SharedGovernance};
