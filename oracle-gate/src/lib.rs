//! CarbonRail Oracle Gate
//!
//! Nonce-sequenced proof validation. A trusted oracle registers the proof
//! expected at each nonce; submitters consume them strictly in order, one
//! nonce per successful validation, so a proof can never be replayed.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod gate;
pub mod types;

pub use error::{Error, Result};
pub use gate::{OracleGate, SharedOracleGate};
pub use types::ProofHash;
