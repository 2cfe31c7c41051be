//! Ledger state
//!
//! A single owned value holding every balance, the supply counters, role
//! sets and flags. Snapshots of this value back [`crate::Ledger::atomically`].

use crate::types::{Amount, Principal, Role, TokenMetadata};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Role membership sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    minters: BTreeSet<Principal>,
    burners: BTreeSet<Principal>,
    pausers: BTreeSet<Principal>,
    blacklisters: BTreeSet<Principal>,
}

impl Roles {
    /// Members of a role
    pub fn members(&self, role: Role) -> &BTreeSet<Principal> {
        match role {
            Role::Minter => &self.minters,
            Role::Burner => &self.burners,
            Role::Pauser => &self.pausers,
            Role::Blacklister => &self.blacklisters,
        }
    }

    pub(crate) fn members_mut(&mut self, role: Role) -> &mut BTreeSet<Principal> {
        match role {
            Role::Minter => &mut self.minters,
            Role::Burner => &mut self.burners,
            Role::Pauser => &mut self.pausers,
            Role::Blacklister => &mut self.blacklisters,
        }
    }

    /// Check role membership
    pub fn contains(&self, role: Role, account: &Principal) -> bool {
        self.members(role).contains(account)
    }
}

/// Complete ledger state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Set once by `initialize`
    pub initialized: bool,

    /// Token metadata (present once initialized)
    pub metadata: Option<TokenMetadata>,

    /// Contract owner (present once initialized)
    pub owner: Option<Principal>,

    /// Balances keyed by account; zero balances are not stored
    pub balances: BTreeMap<Principal, Amount>,

    /// Sum of all balances
    pub total_supply: Amount,

    /// Ceiling on total supply
    pub mint_cap: Amount,

    /// Role sets
    pub roles: Roles,

    /// Blacklisted accounts
    pub blacklist: BTreeSet<Principal>,

    /// Global halt flag
    pub paused: bool,
}

impl LedgerState {
    /// Balance of an account (zero if unknown)
    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Add to an account balance
    pub(crate) fn credit(&mut self, account: &Principal, amount: Amount) -> Result<()> {
        let balance = self.balance_of(account);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| Error::InvalidAmount(format!("balance overflow for {}", account)))?;
        self.balances.insert(account.clone(), updated);
        Ok(())
    }

    /// Subtract from an account balance
    pub(crate) fn debit(&mut self, account: &Principal, amount: Amount) -> Result<()> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        let remaining = balance - amount;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), remaining);
        }
        Ok(())
    }

    /// Move `amount` from one account to another
    ///
    /// Both sides are checked before either balance changes.
    pub(crate) fn move_balance(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if self.balance_of(to).checked_add(amount).is_none() {
            return Err(Error::InvalidAmount(format!("balance overflow for {}", to)));
        }

        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Sum of balances equals supply and supply stays within the cap
    pub fn supply_invariant_holds(&self) -> bool {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, balance| acc.checked_add(*balance));

        sum == Some(self.total_supply) && self.total_supply <= self.mint_cap
    }
}
