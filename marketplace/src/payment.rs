//! Payment-asset ledger
//!
//! Native payment balances exchanged against credits. Funding comes from
//! the host through [`PaymentLedger::credit`].

use crate::{Error, Result};
use ledger_core::{Amount, Principal};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Payment ledger shared with the marketplace
pub type SharedPaymentLedger = Arc<Mutex<PaymentLedger>>;

/// Saved balances for rollback
#[derive(Debug, Clone)]
pub struct PaymentCheckpoint(BTreeMap<Principal, Amount>);

/// Payment-asset balances
#[derive(Debug, Clone, Default)]
pub struct PaymentLedger {
    balances: BTreeMap<Principal, Amount>,
}

impl PaymentLedger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedPaymentLedger {
        Arc::new(Mutex::new(self))
    }

    /// Fund an account
    pub fn credit(&mut self, account: &Principal, amount: Amount) -> Result<()> {
        let balance = self.balance_of(account);
        let updated = balance.checked_add(amount).ok_or_else(|| {
            Error::InvalidAmount(format!("payment balance overflow for {}", account))
        })?;
        self.balances.insert(account.clone(), updated);
        Ok(())
    }

    /// Balance of an account
    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Move payment units between accounts
    pub fn transfer(&mut self, from: &Principal, to: &Principal, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount("payment must be positive".to_string()));
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(Error::InsufficientFunds {
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let received = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| Error::InvalidAmount(format!("payment balance overflow for {}", to)))?;

        self.balances.insert(from.clone(), available - amount);
        self.balances.insert(to.clone(), received);
        Ok(())
    }

    /// Save current balances
    pub fn checkpoint(&self) -> PaymentCheckpoint {
        PaymentCheckpoint(self.balances.clone())
    }

    /// Restore balances saved by [`checkpoint`](Self::checkpoint)
    pub fn rollback(&mut self, checkpoint: PaymentCheckpoint) {
        self.balances = checkpoint.0;
    }

    /// Sum of all balances, `None` if it does not fit in an [`Amount`]
    pub fn total(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0u128, |acc, balance| acc.checked_add(*balance))
    }
}
