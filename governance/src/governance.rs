//! Proposal tally and execution

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ledger_core::{Amount, Principal, SharedLedger};
use parking_lot::Mutex;
use rewards::RateProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Governance shared with the reward distributor
pub type SharedGovernance = Arc<Mutex<Governance>>;

/// Action carried out when a proposal passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalAction {
    /// Change the credit rate used by reward distribution
    SetCreditRate(Decimal),

    /// Change the ledger mint cap (governance must own the ledger)
    SetMintCap(Amount),
}

/// Proposal lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Accepting votes
    Open,
    /// Action applied
    Executed,
}

/// Proposal and its running tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal ID
    pub id: u64,

    /// Proposing member
    pub proposer: Principal,

    /// Action to apply
    pub action: ProposalAction,

    /// Yes votes
    pub yes: u32,

    /// No votes
    pub no: u32,

    /// Members who have voted
    pub voters: BTreeSet<Principal>,

    /// Status
    pub status: ProposalStatus,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Member-voted governance
pub struct Governance {
    principal: Principal,
    members: BTreeSet<Principal>,
    quorum: u32,
    credit_rate: Decimal,
    ledger: SharedLedger,
    proposals: BTreeMap<u64, Proposal>,
    next_id: u64,
}

impl Governance {
    /// Create governance acting as `principal` on the ledger
    pub fn new(
        principal: Principal,
        members: impl IntoIterator<Item = Principal>,
        quorum: u32,
        credit_rate: Decimal,
        ledger: SharedLedger,
    ) -> Result<Self> {
        let members: BTreeSet<Principal> = members.into_iter().collect();
        if quorum == 0 || quorum as usize > members.len() {
            return Err(Error::InvalidQuorum {
                quorum,
                members: members.len(),
            });
        }
        validate_rate(credit_rate)?;

        Ok(Self {
            principal,
            members,
            quorum,
            credit_rate,
            ledger,
            proposals: BTreeMap::new(),
            next_id: 0,
        })
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedGovernance {
        Arc::new(Mutex::new(self))
    }

    /// Open a proposal (members only)
    pub fn propose(&mut self, caller: &Principal, action: ProposalAction) -> Result<u64> {
        self.ensure_member(caller)?;
        if let ProposalAction::SetCreditRate(rate) = &action {
            validate_rate(*rate)?;
        }

        let id = self.next_id;
        self.next_id += 1;
        tracing::info!("Proposal {} opened by {}: {:?}", id, caller, action);

        self.proposals.insert(
            id,
            Proposal {
                id,
                proposer: caller.clone(),
                action,
                yes: 0,
                no: 0,
                voters: BTreeSet::new(),
                status: ProposalStatus::Open,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Cast a vote (members only, once per proposal)
    pub fn vote(&mut self, caller: &Principal, id: u64, support: bool) -> Result<()> {
        self.ensure_member(caller)?;
        let proposal = self.open_proposal_mut(id)?;
        if !proposal.voters.insert(caller.clone()) {
            return Err(Error::AlreadyVoted(id));
        }

        if support {
            proposal.yes += 1;
        } else {
            proposal.no += 1;
        }
        tracing::debug!("Vote on {} by {}: {}", id, caller, support);
        Ok(())
    }

    /// Apply a passed proposal
    ///
    /// Passes when yes ≥ quorum and yes > no. Anyone may trigger execution.
    pub fn execute(&mut self, id: u64) -> Result<()> {
        let quorum = self.quorum;
        let proposal = self.open_proposal_mut(id)?;
        if proposal.yes < quorum || proposal.yes <= proposal.no {
            return Err(Error::NotPassed {
                yes: proposal.yes,
                no: proposal.no,
                quorum,
            });
        }
        let action = proposal.action.clone();

        match action {
            ProposalAction::SetCreditRate(rate) => {
                tracing::info!("Credit rate {} -> {}", self.credit_rate, rate);
                self.credit_rate = rate;
            }
            ProposalAction::SetMintCap(cap) => {
                self.ledger.lock().update_mint_cap(&self.principal, cap)?;
            }
        }

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.status = ProposalStatus::Executed;
        }
        tracing::info!("Proposal {} executed", id);
        Ok(())
    }

    /// Look up a proposal
    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Ledger identity
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Current credit rate
    pub fn credit_rate(&self) -> Decimal {
        self.credit_rate
    }

    /// Required yes votes
    pub fn quorum(&self) -> u32 {
        self.quorum
    }

    /// Member check
    pub fn is_member(&self, account: &Principal) -> bool {
        self.members.contains(account)
    }

    fn ensure_member(&self, caller: &Principal) -> Result<()> {
        if self.is_member(caller) {
            Ok(())
        } else {
            Err(Error::NotAuthorized(format!("{} is not a member", caller)))
        }
    }

    fn open_proposal_mut(&mut self, id: u64) -> Result<&mut Proposal> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(Error::ProposalNotFound(id))?;
        if proposal.status != ProposalStatus::Open {
            return Err(Error::ProposalClosed(id));
        }
        Ok(proposal)
    }
}

impl RateProvider for Governance {
    fn credit_rate(&self) -> Decimal {
        self.credit_rate
    }
}

impl fmt::Debug for Governance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Governance")
            .field("principal", &self.principal)
            .field("members", &self.members)
            .field("quorum", &self.quorum)
            .field("credit_rate", &self.credit_rate)
            .field("proposals", &self.proposals.len())
            .finish_non_exhaustive()
    }
}

fn validate_rate(rate: Decimal) -> Result<()> {
    if rate > Decimal::ZERO {
        Ok(())
    } else {
        Err(Error::InvalidRate(rate.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Config, Ledger};
    use rust_decimal_macros::dec;

    fn member(i: u32) -> Principal {
        Principal::new(format!("member-{}", i))
    }

    fn dao() -> Principal {
        Principal::new("dao")
    }

    fn create_test_governance() -> (Governance, SharedLedger) {
        let deployer = Principal::new("deployer");
        let mut ledger = Ledger::new(deployer.clone(), Config::default());
        ledger
            .initialize(&deployer, "CarbonToken", "CT", 8, None, 1000, 10_000)
            .unwrap();
        ledger.transfer_ownership(&deployer, &dao()).unwrap();
        let ledger = ledger.into_shared();

        let governance =
            Governance::new(dao(), (0..3).map(member), 2, dec!(1), ledger.clone()).unwrap();
        (governance, ledger)
    }

    #[test]
    fn test_invalid_construction() {
        let (_, ledger) = create_test_governance();
        assert!(matches!(
            Governance::new(dao(), (0..2).map(member), 3, dec!(1), ledger.clone()),
            Err(Error::InvalidQuorum { .. })
        ));
        assert!(matches!(
            Governance::new(dao(), (0..2).map(member), 1, dec!(0), ledger),
            Err(Error::InvalidRate(_))
        ));
    }

    #[test]
    fn test_rate_proposal_flow() {
        let (mut gov, _) = create_test_governance();

        let id = gov
            .propose(&member(0), ProposalAction::SetCreditRate(dec!(1.5)))
            .unwrap();
        gov.vote(&member(0), id, true).unwrap();
        assert!(matches!(gov.execute(id), Err(Error::NotPassed { yes: 1, .. })));

        gov.vote(&member(1), id, true).unwrap();
        gov.execute(id).unwrap();
        assert_eq!(RateProvider::credit_rate(&gov), dec!(1.5));
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Executed);

        assert_eq!(gov.execute(id), Err(Error::ProposalClosed(id)));
        assert_eq!(gov.vote(&member(2), id, true), Err(Error::ProposalClosed(id)));
    }

    #[test]
    fn test_vote_rules() {
        let (mut gov, _) = create_test_governance();
        let id = gov
            .propose(&member(0), ProposalAction::SetCreditRate(dec!(2)))
            .unwrap();

        assert!(matches!(
            gov.vote(&Principal::new("outsider"), id, true),
            Err(Error::NotAuthorized(_))
        ));
        gov.vote(&member(0), id, true).unwrap();
        assert_eq!(gov.vote(&member(0), id, false), Err(Error::AlreadyVoted(id)));
        assert_eq!(gov.vote(&member(0), 99, true), Err(Error::ProposalNotFound(99)));
    }

    #[test]
    fn test_tie_does_not_pass() {
        let members: Vec<Principal> = (0..4).map(member).collect();
        let (_, ledger) = create_test_governance();
        let mut gov = Governance::new(dao(), members, 2, dec!(1), ledger).unwrap();

        let id = gov
            .propose(&member(0), ProposalAction::SetCreditRate(dec!(3)))
            .unwrap();
        gov.vote(&member(0), id, true).unwrap();
        gov.vote(&member(1), id, true).unwrap();
        gov.vote(&member(2), id, false).unwrap();
        gov.vote(&member(3), id, false).unwrap();

        assert!(matches!(gov.execute(id), Err(Error::NotPassed { .. })));
        assert_eq!(gov.credit_rate(), dec!(1));
    }

    #[test]
    fn test_invalid_rate_rejected_at_proposal() {
        let (mut gov, _) = create_test_governance();
        assert!(matches!(
            gov.propose(&member(0), ProposalAction::SetCreditRate(dec!(-1))),
            Err(Error::InvalidRate(_))
        ));
    }

    #[test]
    fn test_mint_cap_through_ledger() {
        let (mut gov, ledger) = create_test_governance();

        let id = gov.propose(&member(1), ProposalAction::SetMintCap(500)).unwrap();
        gov.vote(&member(0), id, true).unwrap();
        gov.vote(&member(1), id, true).unwrap();

        let err = gov.execute(id).unwrap_err();
        assert_eq!(err.code(), 103);
        assert_eq!(gov.proposal(id).unwrap().status, ProposalStatus::Open);

        let id = gov.propose(&member(1), ProposalAction::SetMintCap(50_000)).unwrap();
        gov.vote(&member(0), id, true).unwrap();
        gov.vote(&member(2), id, true).unwrap();
        gov.execute(id).unwrap();
        assert_eq!(ledger.lock().mint_cap(), 50_000);
    }
}
