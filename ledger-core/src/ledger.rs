//! Main ledger interface
//!
//! Every public operation is a single atomic unit: preconditions are checked
//! before any balance, supply or flag changes, and the event is appended only
//! after the mutation succeeds. Composite operations spanning several calls
//! go through [`Ledger::atomically`].
//!
//! # Example
//!
//! ```
//! use ledger_core::{Config, Ledger, Principal};
//!
//! let deployer = Principal::new("deployer");
//! let mut ledger = Ledger::new(deployer.clone(), Config::default());
//! ledger
//!     .initialize(&deployer, "CarbonToken", "CT", 8, None, 1_000, 1_000_000)
//!     .unwrap();
//!
//! let recipient = Principal::new("recipient");
//! ledger.transfer(&deployer, 200, &deployer, &recipient, None).unwrap();
//! assert_eq!(ledger.balance_of(&recipient), 200);
//! ```

use crate::{
    events::{EventKind, EventLog},
    metrics::Metrics,
    state::LedgerState,
    types::{validate_memo, validate_uri, Amount, Principal, Role, TokenMetadata},
    Config, Error, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Ledger shared between components that hold it by injection
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Snapshot restored when an atomic scope fails
#[derive(Debug)]
struct Checkpoint {
    state: LedgerState,
    events_len: usize,
}

/// Credit ledger: balances, supply, roles, pause flag and blacklist
#[derive(Debug)]
pub struct Ledger {
    /// Only principal allowed to initialize
    deployer: Principal,

    /// All mutable state
    state: LedgerState,

    /// Committed events
    events: EventLog,

    /// Configuration
    config: Config,

    /// Metrics (absent when disabled)
    metrics: Option<Metrics>,

    /// Nesting depth of `atomically` scopes
    depth: usize,
}

impl Ledger {
    /// Create an uninitialized ledger owned by `deployer`
    pub fn new(deployer: Principal, config: Config) -> Self {
        let metrics = if config.metrics_enabled {
            match Metrics::new() {
                Ok(metrics) => Some(metrics),
                Err(e) => {
                    tracing::warn!("Metrics disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            deployer,
            state: LedgerState::default(),
            events: EventLog::new(),
            config,
            metrics,
            depth: 0,
        }
    }

    /// Wrap into a shared handle for injection into other components
    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    /// One-time setup: metadata, cap, and initial supply credited to the caller
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        caller: &Principal,
        name: &str,
        symbol: &str,
        decimals: u8,
        uri: Option<String>,
        initial_supply: Amount,
        mint_cap: Amount,
    ) -> Result<()> {
        let outcome = self.apply_initialize(
            caller,
            name,
            symbol,
            decimals,
            uri,
            initial_supply,
            mint_cap,
        );
        self.observe("initialize", outcome)
    }

    /// Move credits from `sender` to `recipient`; caller must be the sender
    pub fn transfer(
        &mut self,
        caller: &Principal,
        amount: Amount,
        sender: &Principal,
        recipient: &Principal,
        memo: Option<&[u8]>,
    ) -> Result<()> {
        let outcome = self.apply_transfer(caller, amount, sender, recipient, memo);
        self.observe("transfer", outcome)
    }

    /// Create credits for `recipient`; caller must hold the minter role
    pub fn mint(
        &mut self,
        caller: &Principal,
        amount: Amount,
        recipient: &Principal,
    ) -> Result<()> {
        let outcome = self.apply_mint(caller, amount, recipient);
        self.observe("mint", outcome)
    }

    /// Destroy the caller's own credits; caller must hold the burner role
    pub fn burn(&mut self, caller: &Principal, amount: Amount, sender: &Principal) -> Result<()> {
        let outcome = self.apply_burn(caller, amount, sender);
        self.observe("burn", outcome)
    }

    /// Halt transfer, mint and burn
    pub fn pause(&mut self, caller: &Principal) -> Result<()> {
        let outcome = self.apply_pause(caller, true);
        self.observe("pause", outcome)
    }

    /// Lift the global halt
    pub fn unpause(&mut self, caller: &Principal) -> Result<()> {
        let outcome = self.apply_pause(caller, false);
        self.observe("unpause", outcome)
    }

    /// Grant a role (owner only)
    pub fn grant_role(
        &mut self,
        caller: &Principal,
        role: Role,
        account: &Principal,
    ) -> Result<()> {
        let outcome = self.apply_grant_role(caller, role, account);
        self.observe("grant_role", outcome)
    }

    /// Revoke a role (owner only, idempotent)
    pub fn revoke_role(
        &mut self,
        caller: &Principal,
        role: Role,
        account: &Principal,
    ) -> Result<()> {
        let outcome = self.apply_revoke_role(caller, role, account);
        self.observe("revoke_role", outcome)
    }

    /// Grant the minter role
    pub fn add_minter(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.grant_role(caller, Role::Minter, account)
    }

    /// Revoke the minter role
    pub fn remove_minter(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.revoke_role(caller, Role::Minter, account)
    }

    /// Grant the burner role
    pub fn add_burner(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.grant_role(caller, Role::Burner, account)
    }

    /// Revoke the burner role
    pub fn remove_burner(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.revoke_role(caller, Role::Burner, account)
    }

    /// Grant the pauser role
    pub fn add_pauser(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.grant_role(caller, Role::Pauser, account)
    }

    /// Revoke the pauser role
    pub fn remove_pauser(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.revoke_role(caller, Role::Pauser, account)
    }

    /// Grant the blacklister role
    pub fn add_blacklister(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.grant_role(caller, Role::Blacklister, account)
    }

    /// Revoke the blacklister role
    pub fn remove_blacklister(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        self.revoke_role(caller, Role::Blacklister, account)
    }

    /// Block an account from every balance mutation
    pub fn blacklist_account(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        let outcome = self.apply_blacklist(caller, account, true);
        self.observe("blacklist_account", outcome)
    }

    /// Lift a blacklist entry (idempotent)
    pub fn unblacklist_account(&mut self, caller: &Principal, account: &Principal) -> Result<()> {
        let outcome = self.apply_blacklist(caller, account, false);
        self.observe("unblacklist_account", outcome)
    }

    /// Change the supply ceiling (owner only, must stay above supply)
    pub fn update_mint_cap(&mut self, caller: &Principal, new_cap: Amount) -> Result<()> {
        let outcome = self.apply_update_mint_cap(caller, new_cap);
        self.observe("update_mint_cap", outcome)
    }

    /// Change the metadata URI (owner only)
    pub fn update_token_uri(&mut self, caller: &Principal, uri: Option<String>) -> Result<()> {
        let outcome = self.apply_update_token_uri(caller, uri);
        self.observe("update_token_uri", outcome)
    }

    /// Hand ownership to another principal (owner only)
    pub fn transfer_ownership(&mut self, caller: &Principal, new_owner: &Principal) -> Result<()> {
        let outcome = self.apply_transfer_ownership(caller, new_owner);
        self.observe("transfer_ownership", outcome)
    }

    /// Run `f` as one atomic unit
    ///
    /// State and event log are snapshotted first; if `f` fails, both are
    /// restored and the error is returned unchanged. Scopes may nest.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let checkpoint = self.checkpoint();

        self.depth += 1;
        let outcome = f(self);
        self.depth -= 1;

        match outcome {
            Ok(value) => {
                if self.depth == 0 {
                    self.record_committed(checkpoint.events_len);
                }
                Ok(value)
            }
            Err(e) => {
                let discarded = self.events.len() - checkpoint.events_len;
                self.rollback(checkpoint);
                tracing::warn!("Atomic scope rolled back ({} events discarded)", discarded);
                Err(e)
            }
        }
    }

    // Reads

    /// Principal allowed to initialize
    pub fn deployer(&self) -> &Principal {
        &self.deployer
    }

    /// Whether `initialize` has run
    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Token metadata
    pub fn metadata(&self) -> Option<&TokenMetadata> {
        self.state.metadata.as_ref()
    }

    /// Current owner
    pub fn owner(&self) -> Option<&Principal> {
        self.state.owner.as_ref()
    }

    /// Balance of an account
    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.state.balance_of(account)
    }

    /// Outstanding supply
    pub fn total_supply(&self) -> Amount {
        self.state.total_supply
    }

    /// Supply ceiling
    pub fn mint_cap(&self) -> Amount {
        self.state.mint_cap
    }

    /// Global pause flag
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Blacklist membership
    pub fn is_blacklisted(&self, account: &Principal) -> bool {
        self.state.blacklist.contains(account)
    }

    /// Role membership
    pub fn has_role(&self, role: Role, account: &Principal) -> bool {
        self.state.roles.contains(role, account)
    }

    /// Members of a role, ordered
    pub fn role_members(&self, role: Role) -> Vec<Principal> {
        self.state.roles.members(role).iter().cloned().collect()
    }

    /// Full state (read-only)
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Committed events
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Σ balances == supply ≤ cap
    pub fn check_supply_invariant(&self) -> bool {
        self.state.supply_invariant_holds()
    }

    /// Metrics collector, if enabled
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // Operation bodies

    #[allow(clippy::too_many_arguments)]
    fn apply_initialize(
        &mut self,
        caller: &Principal,
        name: &str,
        symbol: &str,
        decimals: u8,
        uri: Option<String>,
        initial_supply: Amount,
        mint_cap: Amount,
    ) -> Result<()> {
        if self.state.initialized {
            return Err(Error::AlreadyInitialized);
        }
        if caller != &self.deployer {
            return Err(Error::NotAuthorized(format!(
                "{} is not the deployer",
                caller
            )));
        }

        let metadata = TokenMetadata::new(name, symbol, decimals, uri)?;

        if initial_supply == 0 {
            return Err(Error::InvalidAmount("initial supply must be positive".to_string()));
        }
        if mint_cap == 0 {
            return Err(Error::InvalidAmount("mint cap must be positive".to_string()));
        }
        if initial_supply > mint_cap {
            return Err(Error::InvalidAmount(format!(
                "initial supply {} exceeds mint cap {}",
                initial_supply, mint_cap
            )));
        }

        self.state.credit(caller, initial_supply)?;
        self.state.total_supply = initial_supply;
        self.state.mint_cap = mint_cap;
        self.state.owner = Some(caller.clone());
        self.state.initialized = true;

        self.emit(EventKind::Initialized {
            owner: caller.clone(),
            name: metadata.name.clone(),
            symbol: metadata.symbol.clone(),
            decimals: metadata.decimals,
            uri: metadata.uri.clone(),
            initial_supply,
            mint_cap,
        });

        tracing::info!(
            "Initialized {} ({}) with supply {} / cap {}, owner {}",
            metadata.name,
            metadata.symbol,
            initial_supply,
            mint_cap,
            caller
        );
        self.state.metadata = Some(metadata);

        Ok(())
    }

    fn apply_transfer(
        &mut self,
        caller: &Principal,
        amount: Amount,
        sender: &Principal,
        recipient: &Principal,
        memo: Option<&[u8]>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_not_paused()?;
        if caller != sender {
            return Err(Error::NotAuthorized(format!(
                "{} cannot transfer on behalf of {}",
                caller, sender
            )));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("transfer amount must be positive".to_string()));
        }
        if recipient == sender {
            return Err(Error::InvalidRecipient(recipient.clone()));
        }
        validate_memo(memo)?;
        self.ensure_not_blacklisted(sender)?;
        self.ensure_not_blacklisted(recipient)?;

        self.state.move_balance(sender, recipient, amount)?;

        self.emit(EventKind::Transfer {
            sender: sender.clone(),
            recipient: recipient.clone(),
            amount,
            memo: memo.map(<[u8]>::to_vec),
        });

        tracing::info!("Transferred {} from {} to {}", amount, sender, recipient);
        Ok(())
    }

    fn apply_mint(
        &mut self,
        caller: &Principal,
        amount: Amount,
        recipient: &Principal,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_not_paused()?;
        self.ensure_role(Role::Minter, caller)?;
        if amount == 0 {
            return Err(Error::InvalidAmount("mint amount must be positive".to_string()));
        }
        if recipient == caller {
            return Err(Error::InvalidRecipient(recipient.clone()));
        }
        self.ensure_not_blacklisted(recipient)?;

        let supply = self.state.total_supply;
        let cap = self.state.mint_cap;
        let new_supply = supply
            .checked_add(amount)
            .filter(|s| *s <= cap)
            .ok_or(Error::MintCapExceeded {
                requested: amount,
                supply,
                cap,
            })?;

        self.state.credit(recipient, amount)?;
        self.state.total_supply = new_supply;

        self.emit(EventKind::Mint {
            minter: caller.clone(),
            recipient: recipient.clone(),
            amount,
        });

        tracing::info!("Minted {} to {} (supply {})", amount, recipient, new_supply);
        Ok(())
    }

    fn apply_burn(&mut self, caller: &Principal, amount: Amount, sender: &Principal) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_not_paused()?;
        self.ensure_role(Role::Burner, caller)?;
        if caller != sender {
            return Err(Error::NotAuthorized(format!(
                "{} cannot burn on behalf of {}",
                caller, sender
            )));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount("burn amount must be positive".to_string()));
        }
        self.ensure_not_blacklisted(sender)?;

        self.state.debit(sender, amount)?;
        self.state.total_supply -= amount;

        self.emit(EventKind::Burn {
            sender: sender.clone(),
            amount,
        });

        tracing::info!(
            "Burned {} from {} (supply {})",
            amount,
            sender,
            self.state.total_supply
        );
        Ok(())
    }

    fn apply_pause(&mut self, caller: &Principal, paused: bool) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_role(Role::Pauser, caller)?;

        if self.state.paused == paused {
            return Ok(());
        }
        self.state.paused = paused;

        let by = caller.clone();
        self.emit(if paused {
            EventKind::Paused { by }
        } else {
            EventKind::Unpaused { by }
        });

        tracing::info!("Ledger {} by {}", if paused { "paused" } else { "unpaused" }, caller);
        Ok(())
    }

    fn apply_grant_role(
        &mut self,
        caller: &Principal,
        role: Role,
        account: &Principal,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_owner(caller)?;

        let members = self.state.roles.members(role);
        if members.contains(account) {
            return Ok(());
        }
        if role == Role::Minter && members.len() >= self.config.max_minters {
            return Err(Error::MaxMintersExceeded(self.config.max_minters));
        }

        self.state.roles.members_mut(role).insert(account.clone());
        self.emit(EventKind::RoleGranted {
            role,
            account: account.clone(),
        });

        tracing::info!("Granted {} role to {}", role, account);
        Ok(())
    }

    fn apply_revoke_role(
        &mut self,
        caller: &Principal,
        role: Role,
        account: &Principal,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_owner(caller)?;

        if self.state.roles.members_mut(role).remove(account) {
            self.emit(EventKind::RoleRevoked {
                role,
                account: account.clone(),
            });
            tracing::info!("Revoked {} role from {}", role, account);
        }
        Ok(())
    }

    fn apply_blacklist(
        &mut self,
        caller: &Principal,
        account: &Principal,
        listed: bool,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_role(Role::Blacklister, caller)?;

        let changed = if listed {
            self.state.blacklist.insert(account.clone())
        } else {
            self.state.blacklist.remove(account)
        };
        if !changed {
            return Ok(());
        }

        let by = caller.clone();
        let account = account.clone();
        tracing::info!(
            "{} {} by {}",
            if listed { "Blacklisted" } else { "Unblacklisted" },
            account,
            by
        );
        self.emit(if listed {
            EventKind::Blacklisted { account, by }
        } else {
            EventKind::Unblacklisted { account, by }
        });
        Ok(())
    }

    fn apply_update_mint_cap(&mut self, caller: &Principal, new_cap: Amount) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_owner(caller)?;
        if new_cap == 0 || new_cap <= self.state.total_supply {
            return Err(Error::InvalidAmount(format!(
                "mint cap {} must exceed outstanding supply {}",
                new_cap, self.state.total_supply
            )));
        }

        let old_cap = self.state.mint_cap;
        self.state.mint_cap = new_cap;
        self.emit(EventKind::MintCapUpdated { old_cap, new_cap });

        tracing::info!("Mint cap updated {} -> {}", old_cap, new_cap);
        Ok(())
    }

    fn apply_update_token_uri(&mut self, caller: &Principal, uri: Option<String>) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_owner(caller)?;
        validate_uri(uri.as_deref())?;

        if let Some(metadata) = self.state.metadata.as_mut() {
            metadata.uri = uri.clone();
        }
        tracing::info!("Token URI updated to {:?}", uri);
        self.emit(EventKind::TokenUriUpdated { uri });
        Ok(())
    }

    fn apply_transfer_ownership(
        &mut self,
        caller: &Principal,
        new_owner: &Principal,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.ensure_owner(caller)?;
        if new_owner == caller {
            return Err(Error::InvalidRecipient(new_owner.clone()));
        }

        self.state.owner = Some(new_owner.clone());
        self.emit(EventKind::OwnershipTransferred {
            previous_owner: caller.clone(),
            new_owner: new_owner.clone(),
        });

        tracing::info!("Ownership transferred from {} to {}", caller, new_owner);
        Ok(())
    }

    // Guards

    fn ensure_initialized(&self) -> Result<()> {
        if self.state.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn ensure_not_paused(&self) -> Result<()> {
        if self.state.paused {
            Err(Error::Paused)
        } else {
            Ok(())
        }
    }

    fn ensure_owner(&self, caller: &Principal) -> Result<()> {
        match &self.state.owner {
            Some(owner) if owner == caller => Ok(()),
            _ => Err(Error::NotAuthorized(format!("{} is not the owner", caller))),
        }
    }

    fn ensure_role(&self, role: Role, caller: &Principal) -> Result<()> {
        if self.state.roles.contains(role, caller) {
            Ok(())
        } else {
            Err(Error::NotAuthorized(format!("{} lacks the {} role", caller, role)))
        }
    }

    fn ensure_not_blacklisted(&self, account: &Principal) -> Result<()> {
        if self.state.blacklist.contains(account) {
            Err(Error::Blacklisted(account.clone()))
        } else {
            Ok(())
        }
    }

    // Bookkeeping

    fn emit(&mut self, kind: EventKind) {
        let event = self.events.append(kind);
        tracing::debug!(
            sequence = event.sequence,
            "Emitted {} event",
            event.kind.name()
        );

        if self.depth == 0 {
            self.record_committed(self.events.len() - 1);
        }
    }

    fn record_committed(&self, from: usize) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        for event in self.events.since(from) {
            match event.kind {
                EventKind::Transfer { .. } => metrics.record_transfer(),
                EventKind::Mint { .. } => metrics.record_mint(),
                EventKind::Burn { .. } => metrics.record_burn(),
                _ => {}
            }
        }
        metrics.update_total_supply(self.state.total_supply);
    }

    fn observe<T>(&self, operation: &'static str, outcome: Result<T>) -> Result<T> {
        if let Err(e) = &outcome {
            tracing::debug!(code = e.code(), "{} rejected: {}", operation, e);
            if let Some(metrics) = &self.metrics {
                metrics.record_rejection(operation, e.kind());
            }
        }
        outcome
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            events_len: self.events.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.state = checkpoint.state;
        self.events.truncate(checkpoint.events_len);
    }
}
