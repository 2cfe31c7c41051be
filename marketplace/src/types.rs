//! Listing types

use chrono::{DateTime, Utc};
use ledger_core::{Amount, Principal};
use serde::{Deserialize, Serialize};

/// Listing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingState {
    /// Credits in escrow, available to buy
    Open,
    /// Sold; credits delivered to the buyer
    Filled,
    /// Withdrawn; credits returned to the seller
    Cancelled,
}

/// Sell listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Seller
    pub seller: Principal,

    /// Per-seller listing ID
    pub id: u64,

    /// Credits held in escrow
    pub amount: Amount,

    /// Payment units per credit
    pub price_per_unit: Amount,

    /// Total price (price_per_unit × amount)
    pub price: Amount,

    /// Current state
    pub state: ListingState,

    /// Buyer, once filled
    pub buyer: Option<Principal>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Check if listing can still be bought or cancelled
    pub fn is_open(&self) -> bool {
        self.state == ListingState::Open
    }
}
