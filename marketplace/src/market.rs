//! Escrow marketplace

use crate::payment::SharedPaymentLedger;
use crate::{Config, Error, Listing, ListingState, Result};
use chrono::Utc;
use ledger_core::{Amount, Principal, SharedLedger};
use std::collections::{BTreeMap, HashMap};

/// Escrow marketplace
///
/// Listings are keyed by (seller, id) with ids counting up per seller.
/// Lock order is ledger before payments.
#[derive(Debug)]
pub struct Marketplace {
    escrow: Principal,
    ledger: SharedLedger,
    payments: SharedPaymentLedger,
    listings: BTreeMap<(Principal, u64), Listing>,
    next_ids: HashMap<Principal, u64>,
}

impl Marketplace {
    /// Create marketplace over the credit and payment ledgers
    pub fn new(config: Config, ledger: SharedLedger, payments: SharedPaymentLedger) -> Self {
        Self {
            escrow: config.escrow,
            ledger,
            payments,
            listings: BTreeMap::new(),
            next_ids: HashMap::new(),
        }
    }

    /// Escrow `amount` credits and open a listing; returns the listing id
    pub fn list(
        &mut self,
        caller: &Principal,
        amount: Amount,
        price_per_unit: Amount,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(Error::InvalidAmount("listing amount must be positive".to_string()));
        }
        if price_per_unit == 0 {
            return Err(Error::InvalidAmount("price per unit must be positive".to_string()));
        }
        let price = price_per_unit.checked_mul(amount).ok_or_else(|| {
            Error::InvalidAmount(format!("price overflow: {} × {}", price_per_unit, amount))
        })?;

        self.ledger
            .lock()
            .transfer(caller, amount, caller, &self.escrow, None)?;

        let next = self.next_ids.entry(caller.clone()).or_insert(0);
        let id = *next;
        *next += 1;

        self.listings.insert(
            (caller.clone(), id),
            Listing {
                seller: caller.clone(),
                id,
                amount,
                price_per_unit,
                price,
                state: ListingState::Open,
                buyer: None,
                created_at: Utc::now(),
            },
        );

        tracing::info!(
            "Listing {}#{} opened: {} credits for {}",
            caller,
            id,
            amount,
            price
        );
        Ok(id)
    }

    /// Fill an open listing
    ///
    /// Pays the seller and delivers the escrowed credits to the caller. If
    /// either leg fails, both ledgers are restored and the listing stays open.
    pub fn buy(&mut self, caller: &Principal, seller: &Principal, id: u64) -> Result<()> {
        let key = (seller.clone(), id);
        let listing = self
            .listings
            .get_mut(&key)
            .filter(|listing| listing.is_open())
            .ok_or_else(|| Error::ListingNotFound {
                seller: seller.clone(),
                id,
            })?;
        if caller == seller {
            return Err(Error::SelfPurchase);
        }

        let mut ledger = self.ledger.lock();
        let mut payments = self.payments.lock();

        let available = payments.balance_of(caller);
        if available < listing.price {
            return Err(Error::InsufficientFunds {
                required: listing.price,
                available,
            });
        }

        let checkpoint = payments.checkpoint();
        let escrow = &self.escrow;
        let (price, amount) = (listing.price, listing.amount);

        let outcome = ledger.atomically(|ledger| -> Result<()> {
            payments.transfer(caller, seller, price)?;
            ledger.transfer(escrow, amount, escrow, caller, None)?;
            Ok(())
        });
        if let Err(e) = outcome {
            payments.rollback(checkpoint);
            tracing::warn!("Buy of {}#{} by {} rolled back: {}", seller, id, caller, e);
            return Err(e);
        }

        listing.state = ListingState::Filled;
        listing.buyer = Some(caller.clone());

        tracing::info!(
            "Listing {}#{} filled by {}: {} credits for {}",
            seller,
            id,
            caller,
            amount,
            price
        );
        Ok(())
    }

    /// Withdraw an open listing and return its credits to the seller
    pub fn cancel(&mut self, caller: &Principal, id: u64) -> Result<()> {
        let key = (caller.clone(), id);
        let listing = self
            .listings
            .get_mut(&key)
            .filter(|listing| listing.is_open())
            .ok_or_else(|| Error::ListingNotFound {
                seller: caller.clone(),
                id,
            })?;

        self.ledger
            .lock()
            .transfer(&self.escrow, listing.amount, &self.escrow, caller, None)?;
        listing.state = ListingState::Cancelled;

        tracing::info!("Listing {}#{} cancelled", caller, id);
        Ok(())
    }

    /// Look up a listing in any state
    pub fn listing(&self, seller: &Principal, id: u64) -> Option<&Listing> {
        self.listings.get(&(seller.clone(), id))
    }

    /// Open listings, ordered by seller then id
    pub fn open_listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values().filter(|listing| listing.is_open())
    }

    /// Escrow account
    pub fn escrow(&self) -> &Principal {
        &self.escrow
    }

    /// Escrow balance covers every open listing
    pub fn escrow_invariant_holds(&self) -> bool {
        let committed = self
            .open_listings()
            .try_fold(0u128, |acc, listing| acc.checked_add(listing.amount));
        match committed {
            Some(committed) => self.ledger.lock().balance_of(&self.escrow) >= committed,
            None => false,
        }
    }
}
