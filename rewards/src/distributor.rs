//! Reward distributor
//!
//! Turns logged usage into minted credits. The distributor mints as its own
//! principal, which must hold the ledger's minter role.

use crate::efficiency::{evaluate, Efficiency};
use crate::resource_log::{EntryKey, ResourceKind, SharedResourceLog};
use crate::{Error, Result, RewardConfig};
use ledger_core::{Amount, Principal, SharedLedger};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Source of the current credit rate
pub trait RateProvider: Send + Sync {
    /// Credits per unit of usage saved
    fn credit_rate(&self) -> Decimal;
}

/// Constant rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRate(pub Decimal);

impl RateProvider for FixedRate {
    fn credit_rate(&self) -> Decimal {
        self.0
    }
}

impl<T: RateProvider + ?Sized> RateProvider for Mutex<T> {
    fn credit_rate(&self) -> Decimal {
        self.lock().credit_rate()
    }
}

/// Reward distributor
pub struct RewardDistributor {
    /// Minting identity
    principal: Principal,

    /// Only principal allowed to batch-distribute and reconfigure
    governance: Principal,

    ledger: SharedLedger,
    log: SharedResourceLog,
    rates: Arc<dyn RateProvider>,
    config: RewardConfig,
}

impl RewardDistributor {
    /// Create distributor wired to its collaborators
    pub fn new(
        principal: Principal,
        governance: Principal,
        ledger: SharedLedger,
        log: SharedResourceLog,
        rates: Arc<dyn RateProvider>,
        config: RewardConfig,
    ) -> Self {
        Self {
            principal,
            governance,
            ledger,
            log,
            rates,
            config,
        }
    }

    /// Reward a logged entry
    ///
    /// Mints the computed credits to the entry's submitter and marks the
    /// entry claimed. Any failure leaves the entry unclaimed and the ledger
    /// unchanged. Returns the credits minted.
    pub fn claim(&self, key: &EntryKey) -> Result<Amount> {
        let mut log = self.log.lock();
        let entry = log
            .get_mut(key)
            .ok_or_else(|| Error::EntryNotFound(key.clone()))?;
        if entry.claimed {
            return Err(Error::AlreadyClaimed(key.clone()));
        }

        let efficiency = self.assess(entry.usage, &entry.resource_kind)?;
        if efficiency.score < self.config.threshold {
            tracing::info!(
                "Claim {} scored {} (threshold {})",
                key,
                efficiency.score,
                self.config.threshold
            );
            return Err(Error::BelowThreshold {
                score: efficiency.score,
                threshold: self.config.threshold,
            });
        }
        if efficiency.credits == 0 {
            tracing::info!("Claim {} scored {} but earns no credits", key, efficiency.score);
            return Err(Error::NoCredits(key.clone()));
        }

        if let Err(e) = self
            .ledger
            .lock()
            .mint(&self.principal, efficiency.credits, &key.submitter)
        {
            tracing::warn!("Mint for claim {} rejected: {}", key, e);
            return Err(e.into());
        }
        entry.claimed = true;

        tracing::info!(
            "Claim {} rewarded {} credits (score {})",
            key,
            efficiency.credits,
            efficiency.score
        );
        Ok(efficiency.credits)
    }

    /// Score an entry without claiming it
    pub fn preview(&self, key: &EntryKey) -> Result<Efficiency> {
        let log = self.log.lock();
        let entry = log
            .get(key)
            .ok_or_else(|| Error::EntryNotFound(key.clone()))?;
        self.assess(entry.usage, &entry.resource_kind)
    }

    /// Mint a batch of rewards, all or nothing (governance only)
    pub fn batch_distribute(
        &self,
        caller: &Principal,
        recipients: &[Principal],
        amounts: &[Amount],
    ) -> Result<()> {
        self.ensure_governance(caller)?;
        if recipients.len() != amounts.len() {
            return Err(Error::BatchLengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            });
        }

        let minter = &self.principal;
        self.ledger.lock().atomically(|ledger| {
            recipients
                .iter()
                .zip(amounts)
                .try_for_each(|(recipient, amount)| ledger.mint(minter, *amount, recipient))
        })?;

        tracing::info!(
            "Batch distributed {} credits to {} recipients",
            amounts.iter().sum::<Amount>(),
            recipients.len()
        );
        Ok(())
    }

    /// Change the score threshold (governance only)
    pub fn set_threshold(&mut self, caller: &Principal, threshold: u32) -> Result<()> {
        self.ensure_governance(caller)?;
        if threshold > 100 {
            return Err(Error::InvalidAmount(format!(
                "threshold {} exceeds 100",
                threshold
            )));
        }

        tracing::info!("Threshold {} -> {}", self.config.threshold, threshold);
        self.config.threshold = threshold;
        Ok(())
    }

    /// Set the benchmark for a resource kind (governance only)
    pub fn set_benchmark(&mut self, caller: &Principal, kind: &str, benchmark: u64) -> Result<()> {
        self.ensure_governance(caller)?;
        let kind = ResourceKind::new(kind)?;
        if benchmark == 0 {
            return Err(Error::InvalidAmount("benchmark must be positive".to_string()));
        }

        tracing::info!("Benchmark for {} set to {}", kind, benchmark);
        self.config.benchmarks.insert(kind.as_str().to_string(), benchmark);
        Ok(())
    }

    /// Minting identity
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Current configuration
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    fn assess(&self, usage: Amount, kind: &ResourceKind) -> Result<Efficiency> {
        let benchmark = self
            .config
            .benchmark_for(kind.as_str())
            .ok_or_else(|| Error::MissingBenchmark(kind.as_str().to_string()))?;
        evaluate(usage, benchmark, self.rates.credit_rate())
    }

    fn ensure_governance(&self, caller: &Principal) -> Result<()> {
        if caller == &self.governance {
            Ok(())
        } else {
            Err(Error::NotAuthorized(format!("{} is not governance", caller)))
        }
    }
}

impl fmt::Debug for RewardDistributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewardDistributor")
            .field("principal", &self.principal)
            .field("governance", &self.governance)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceLog;
    use ledger_core::{Config, Ledger};
    use oracle_gate::{OracleGate, ProofHash, SharedOracleGate};
    use rust_decimal_macros::dec;

    struct Fixture {
        ledger: SharedLedger,
        gate: SharedOracleGate,
        log: SharedResourceLog,
        distributor: RewardDistributor,
    }

    fn owner() -> Principal {
        Principal::new("owner")
    }

    fn oracle() -> Principal {
        Principal::new("oracle")
    }

    fn dao() -> Principal {
        Principal::new("dao")
    }

    fn plant() -> Principal {
        Principal::new("plant-7")
    }

    fn fixture(cap: Amount) -> Fixture {
        let mut ledger = Ledger::new(owner(), Config::default());
        ledger
            .initialize(&owner(), "CarbonToken", "CT", 8, None, 1000, cap)
            .unwrap();
        ledger.add_minter(&owner(), &Principal::new("distributor")).unwrap();
        let ledger = ledger.into_shared();

        let gate = OracleGate::new(owner(), oracle()).into_shared();
        let log = ResourceLog::new(gate.clone()).into_shared();
        let config = RewardConfig::default().with_benchmark("energy", 1000);
        let distributor = RewardDistributor::new(
            Principal::new("distributor"),
            dao(),
            ledger.clone(),
            log.clone(),
            Arc::new(FixedRate(dec!(1))),
            config,
        );

        Fixture {
            ledger,
            gate,
            log,
            distributor,
        }
    }

    fn submit(f: &Fixture, usage: Amount, kind: &str) -> EntryKey {
        let nonce = f.gate.lock().current_nonce(&plant());
        let proof = ProofHash::digest(format!("reading-{}", nonce));
        f.gate
            .lock()
            .register_expected_proof(&oracle(), nonce, proof)
            .unwrap();
        f.log.lock().submit(&plant(), usage, kind, proof).unwrap()
    }

    #[test]
    fn test_claim_mints_and_marks() {
        let f = fixture(1_000_000);
        let key = submit(&f, 500, "energy");

        assert_eq!(f.distributor.claim(&key), Ok(500));
        assert_eq!(f.ledger.lock().balance_of(&plant()), 500);
        assert!(f.log.lock().get(&key).unwrap().claimed);

        assert_eq!(f.distributor.claim(&key), Err(Error::AlreadyClaimed(key)));
    }

    #[test]
    fn test_claim_unknown_entry() {
        let f = fixture(1_000_000);
        let key = EntryKey::new(plant(), 9);
        assert_eq!(f.distributor.claim(&key), Err(Error::EntryNotFound(key)));
    }

    #[test]
    fn test_below_threshold_stays_unclaimed() {
        let f = fixture(1_000_000);
        let key = submit(&f, 950, "energy");

        let err = f.distributor.claim(&key).unwrap_err();
        assert_eq!(err, Error::BelowThreshold { score: 5, threshold: 10 });
        assert!(!f.log.lock().get(&key).unwrap().claimed);
        assert_eq!(f.ledger.lock().total_supply(), 1000);
    }

    #[test]
    fn test_zero_credits_not_minted() {
        let mut f = fixture(1_000_000);
        f.distributor = RewardDistributor::new(
            Principal::new("distributor"),
            dao(),
            f.ledger.clone(),
            f.log.clone(),
            Arc::new(FixedRate(dec!(0.005))),
            RewardConfig::default().with_benchmark("energy", 1000),
        );
        let key = submit(&f, 900, "energy");
        let events = f.ledger.lock().events().len();

        let preview = f.distributor.preview(&key).unwrap();
        assert_eq!((preview.score, preview.credits), (10, 0));

        let err = f.distributor.claim(&key).unwrap_err();
        assert_eq!(err, Error::NoCredits(key.clone()));
        assert_eq!(err.code(), 309);
        assert!(!f.log.lock().get(&key).unwrap().claimed);
        assert_eq!(f.ledger.lock().total_supply(), 1000);
        assert_eq!(f.ledger.lock().events().len(), events);
    }

    #[test]
    fn test_missing_benchmark() {
        let f = fixture(1_000_000);
        let key = submit(&f, 10, "water");
        assert_eq!(
            f.distributor.claim(&key),
            Err(Error::MissingBenchmark("water".to_string()))
        );
    }

    #[test]
    fn test_mint_failure_leaves_entry_unclaimed() {
        let f = fixture(1200);
        let key = submit(&f, 500, "energy");

        let err = f.distributor.claim(&key).unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(ledger_core::Error::MintCapExceeded { .. })
        ));
        assert_eq!(err.code(), 113);
        assert!(!f.log.lock().get(&key).unwrap().claimed);

        f.ledger.lock().update_mint_cap(&owner(), 10_000).unwrap();
        assert_eq!(f.distributor.claim(&key), Ok(500));
    }

    #[test]
    fn test_batch_all_or_nothing() {
        let f = fixture(1500);
        let recipients = vec![Principal::new("a"), Principal::new("b")];

        let err = f
            .distributor
            .batch_distribute(&dao(), &recipients, &[300, 300])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(ledger_core::Error::MintCapExceeded { .. })
        ));
        let ledger = f.ledger.lock();
        assert_eq!(ledger.balance_of(&recipients[0]), 0);
        assert_eq!(ledger.total_supply(), 1000);
        drop(ledger);

        f.distributor
            .batch_distribute(&dao(), &recipients, &[300, 200])
            .unwrap();
        assert_eq!(f.ledger.lock().total_supply(), 1500);
    }

    #[test]
    fn test_batch_authorization_and_lengths() {
        let f = fixture(1_000_000);
        let recipients = vec![Principal::new("a")];

        assert!(matches!(
            f.distributor.batch_distribute(&owner(), &recipients, &[1]),
            Err(Error::NotAuthorized(_))
        ));
        assert_eq!(
            f.distributor.batch_distribute(&dao(), &recipients, &[1, 2]),
            Err(Error::BatchLengthMismatch {
                recipients: 1,
                amounts: 2
            })
        );
    }

    #[test]
    fn test_governance_maintenance() {
        let mut f = fixture(1_000_000);

        assert!(f.distributor.set_threshold(&owner(), 5).is_err());
        f.distributor.set_threshold(&dao(), 5).unwrap();
        f.distributor.set_benchmark(&dao(), "water", 400).unwrap();
        assert!(f.distributor.set_benchmark(&dao(), "water", 0).is_err());

        let key = submit(&f, 380, "water");
        assert_eq!(f.distributor.preview(&key).unwrap().score, 5);
        assert_eq!(f.distributor.claim(&key), Ok(20));
    }

    #[test]
    fn test_rate_from_shared_provider() {
        let rate = Arc::new(Mutex::new(FixedRate(dec!(2))));
        assert_eq!(rate.credit_rate(), dec!(2));

        *rate.lock() = FixedRate(dec!(3));
        let provider: Arc<dyn RateProvider> = rate;
        assert_eq!(provider.credit_rate(), dec!(3));
    }
}
