//! Oracle gate state machine

use crate::{Error, ProofHash, Result};
use ledger_core::Principal;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Oracle gate shared with the resource log
pub type SharedOracleGate = Arc<Mutex<OracleGate>>;

/// Per-submitter nonce counters and the expected-proof registry
///
/// A submitter at nonce `n` can only advance by presenting exactly the proof
/// registered at `n`. Counters never decrease, so each nonce is consumed at
/// most once per submitter.
#[derive(Debug)]
pub struct OracleGate {
    /// May rotate the trusted oracle
    admin: Principal,

    /// Only principal allowed to register proofs
    oracle: Principal,

    /// Expected proof by nonce
    expected: BTreeMap<u64, ProofHash>,

    /// Next nonce per submitter (absent means 0)
    nonces: HashMap<Principal, u64>,
}

impl OracleGate {
    /// Create gate with an admin and initial trusted oracle
    pub fn new(admin: Principal, oracle: Principal) -> Self {
        Self {
            admin,
            oracle,
            expected: BTreeMap::new(),
            nonces: HashMap::new(),
        }
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedOracleGate {
        Arc::new(Mutex::new(self))
    }

    /// Register the proof expected at `nonce`
    pub fn register_expected_proof(
        &mut self,
        caller: &Principal,
        nonce: u64,
        proof: ProofHash,
    ) -> Result<()> {
        if caller != &self.oracle {
            return Err(Error::NotAuthorized(format!(
                "{} is not the trusted oracle",
                caller
            )));
        }
        if self.expected.contains_key(&nonce) {
            return Err(Error::DuplicateNonce(nonce));
        }

        self.expected.insert(nonce, proof);
        tracing::info!("Registered expected proof {} at nonce {}", proof, nonce);
        Ok(())
    }

    /// Validate `proof` against the submitter's next nonce
    ///
    /// On success the counter advances and the consumed nonce is returned.
    pub fn validate(&mut self, submitter: &Principal, proof: &ProofHash) -> Result<u64> {
        let nonce = self.current_nonce(submitter);

        let expected = self.expected.get(&nonce).ok_or_else(|| Error::UnknownNonce {
            submitter: submitter.clone(),
            nonce,
        })?;
        if expected != proof {
            tracing::warn!("Proof mismatch for {} at nonce {}", submitter, nonce);
            return Err(Error::ProofMismatch {
                submitter: submitter.clone(),
                nonce,
            });
        }

        self.nonces.insert(submitter.clone(), nonce + 1);
        tracing::info!("Validated proof for {} at nonce {}", submitter, nonce);
        Ok(nonce)
    }

    /// Rotate the trusted oracle (admin only)
    pub fn set_oracle(&mut self, caller: &Principal, new_oracle: Principal) -> Result<()> {
        if caller != &self.admin {
            return Err(Error::NotAuthorized(format!("{} is not the admin", caller)));
        }

        tracing::info!("Trusted oracle rotated from {} to {}", self.oracle, new_oracle);
        self.oracle = new_oracle;
        Ok(())
    }

    /// Next nonce the submitter must present a proof for
    pub fn current_nonce(&self, submitter: &Principal) -> u64 {
        self.nonces.get(submitter).copied().unwrap_or(0)
    }

    /// Proof registered at `nonce`
    pub fn expected_proof(&self, nonce: u64) -> Option<&ProofHash> {
        self.expected.get(&nonce)
    }

    /// Current trusted oracle
    pub fn oracle(&self) -> &Principal {
        &self.oracle
    }

    /// Admin principal
    pub fn admin(&self) -> &Principal {
        &self.admin
    }
}
