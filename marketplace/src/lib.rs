//! CarbonRail Marketplace
//!
//! Peer-to-peer credit sales through escrow. Listing moves the seller's
//! credits into a fixed escrow account; buying exchanges the payment asset
//! for the escrowed credits as one atomic unit across both ledgers.
//!
//! # Listing lifecycle
//!
//! ```text
//! Open ──buy──▶ Filled
//!   │
//!   └──cancel──▶ Cancelled
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod market;
pub mod payment;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use market::Marketplace;
pub use payment::{PaymentCheckpoint, PaymentLedger, SharedPaymentLedger};
pub use types::{Listing, ListingState};
