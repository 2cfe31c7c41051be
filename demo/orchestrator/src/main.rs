//! CarbonRail demo orchestrator
//!
//! Wires the ledger, oracle gate, resource log, reward distributor,
//! governance and marketplace together and walks through the protocol end
//! to end. An optional first argument names a reward config TOML file.
//!
//! Set `CARBONRAIL_EVENTS_OUT` to write the ledger event log as JSON.

use anyhow::{bail, ensure, Context, Result};
use colored::Colorize;
use governance::{Governance, ProposalAction, SharedGovernance};
use ledger_core::{Amount, Ledger, Principal, SharedLedger};
use marketplace::{Marketplace, PaymentLedger, SharedPaymentLedger};
use oracle_gate::{OracleGate, ProofHash, SharedOracleGate};
use parking_lot::Mutex;
use prometheus::{Encoder, TextEncoder};
use rewards::{
    EntryKey, RateProvider, ResourceLog, RewardConfig, RewardDistributor, SharedResourceLog,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

const TOKEN_URI: &str = "https://example.com";

fn deployer() -> Principal {
    Principal::new("deployer")
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

fn buyer(i: u32) -> Principal {
    Principal::new(format!("buyer-{}", i))
}

fn member(i: u32) -> Principal {
    Principal::new(format!("member-{}", i))
}

fn heading(title: &str) {
    println!("\n{}", format!("== {} ==", title).bold().green());
}

fn passed(detail: impl AsRef<str>) {
    println!("   {} {}", "✓".green(), detail.as_ref());
}

/// Every component, wired by shared handles
struct Demo {
    ledger: SharedLedger,
    gate: SharedOracleGate,
    log: SharedResourceLog,
    governance: SharedGovernance,
    distributor: RewardDistributor,
    payments: SharedPaymentLedger,
    market: Arc<Mutex<Marketplace>>,
}

impl Demo {
    fn new(
        ledger_config: ledger_core::Config,
        reward_config: RewardConfig,
        market_config: marketplace::Config,
    ) -> Result<Self> {
        let ledger = Ledger::new(deployer(), ledger_config).into_shared();
        let gate = OracleGate::new(deployer(), oracle()).into_shared();
        let log = ResourceLog::new(gate.clone()).into_shared();

        let governance =
            Governance::new(dao(), (0..3).map(member), 2, dec!(1), ledger.clone())?.into_shared();
        let rates: Arc<dyn RateProvider> = governance.clone();

        let distributor = RewardDistributor::new(
            Principal::new("reward-distributor"),
            dao(),
            ledger.clone(),
            log.clone(),
            rates,
            reward_config,
        );

        let payments = PaymentLedger::new().into_shared();
        let market = Arc::new(Mutex::new(Marketplace::new(
            market_config,
            ledger.clone(),
            payments.clone(),
        )));

        Ok(Self {
            ledger,
            gate,
            log,
            governance,
            distributor,
            payments,
            market,
        })
    }

    /// Initialize, transfer, and the cap/balance rejections
    fn token_lifecycle(&self) -> Result<()> {
        heading("Token lifecycle");
        let recipient = Principal::new("recipient");

        let mut ledger = self.ledger.lock();
        ledger.initialize(
            &deployer(),
            "CarbonToken",
            "CT",
            8,
            Some(TOKEN_URI.to_string()),
            1000,
            1_000_000,
        )?;
        ensure!(ledger.balance_of(&deployer()) == 1000, "initial supply not credited");
        passed("initialize: owner holds 1000, supply 1000");

        ledger.transfer(&deployer(), 200, &deployer(), &recipient, None)?;
        ensure!(ledger.balance_of(&deployer()) == 800 && ledger.balance_of(&recipient) == 200);
        passed("transfer 200: owner 800, recipient 200");

        ledger.add_minter(&deployer(), self.distributor.principal())?;
        ledger.add_pauser(&deployer(), &deployer())?;
        drop(ledger);

        let mut capped = Ledger::new(deployer(), ledger_core::Config::default());
        capped.initialize(&deployer(), "CarbonToken", "CT", 8, None, 1000, 1000)?;
        capped.add_minter(&deployer(), &deployer())?;
        match capped.mint(&deployer(), 1, &recipient) {
            Err(ledger_core::Error::MintCapExceeded { .. }) => {
                passed("mint past cap rejected (MintCapExceeded)")
            }
            other => bail!("expected MintCapExceeded, got {:?}", other),
        }

        capped.add_burner(&deployer(), &deployer())?;
        match capped.burn(&deployer(), 1001, &deployer()) {
            Err(ledger_core::Error::InsufficientBalance { .. }) => {
                passed("burn beyond balance rejected (InsufficientBalance)")
            }
            other => bail!("expected InsufficientBalance, got {:?}", other),
        }
        Ok(())
    }

    /// Register a proof, submit usage, and show the replay is refused
    fn oracle_submission(&self) -> Result<EntryKey> {
        heading("Oracle-gated submission");
        let proof = ProofHash::digest(b"plant-7:energy:2024-06");

        self.gate.lock().register_expected_proof(&oracle(), 0, proof)?;
        let key = self.log.lock().submit(&plant(), 500, "energy", proof)?;
        ensure!(key.sequence == 0, "first entry must take sequence 0");
        passed(format!("submit accepted as {}", key));

        match self.log.lock().submit(&plant(), 500, "energy", proof) {
            Err(rewards::Error::Oracle(oracle_gate::Error::UnknownNonce { nonce, .. })) => {
                passed(format!("replay rejected (UnknownNonce at {})", nonce))
            }
            other => bail!("expected UnknownNonce, got {:?}", other),
        }
        Ok(key)
    }

    /// Claim the logged entry, then raise the rate through governance
    fn rewards_and_governance(&self, first: &EntryKey) -> Result<()> {
        heading("Rewards and governance");

        let credits = self.distributor.claim(first)?;
        passed(format!("claim {} minted {} credits", first, credits));
        ensure!(
            matches!(self.distributor.claim(first), Err(rewards::Error::AlreadyClaimed(_))),
            "double claim must fail"
        );
        passed("second claim rejected (AlreadyClaimed)");

        {
            let mut governance = self.governance.lock();
            let id = governance.propose(&member(0), ProposalAction::SetCreditRate(dec!(1.5)))?;
            governance.vote(&member(0), id, true)?;
            governance.vote(&member(1), id, true)?;
            governance.execute(id)?;
            passed(format!("proposal {} executed: rate {}", id, governance.credit_rate()));
        }

        let proof = ProofHash::digest(b"plant-7:energy:2024-07");
        self.gate.lock().register_expected_proof(&oracle(), 1, proof)?;
        let second = self.log.lock().submit(&plant(), 600, "energy", proof)?;
        let credits = self.distributor.claim(&second)?;
        passed(format!("claim {} minted {} credits at the new rate", second, credits));

        self.distributor
            .batch_distribute(&dao(), &[member(0), member(1)], &[25, 25])?;
        passed("batch distribution of 50 credits");

        self.ledger.lock().transfer_ownership(&deployer(), &dao())?;
        let mut governance = self.governance.lock();
        let id = governance.propose(&member(2), ProposalAction::SetMintCap(2_000_000))?;
        governance.vote(&member(1), id, true)?;
        governance.vote(&member(2), id, true)?;
        governance.execute(id)?;
        passed(format!(
            "mint cap raised to {} by governance",
            self.ledger.lock().mint_cap()
        ));
        Ok(())
    }

    /// List, buy, and the rollback of a failed buy
    fn marketplace_trade(&self) -> Result<()> {
        heading("Marketplace");
        self.payments.lock().credit(&buyer(0), 500)?;

        let mut market = self.market.lock();
        let id = market.list(&plant(), 50, 2)?;
        let escrowed = self.ledger.lock().balance_of(market.escrow());
        passed(format!("listed 50 credits at 2 (escrow holds {})", escrowed));

        market.buy(&buyer(0), &plant(), id)?;
        ensure!(self.payments.lock().balance_of(&plant()) == 100, "seller not paid");
        ensure!(self.ledger.lock().balance_of(&buyer(0)) == 50, "buyer not delivered");
        passed("buy: seller +100 payment, buyer +50 credits");

        let id = market.list(&plant(), 10, 3)?;
        self.ledger.lock().pause(&deployer())?;
        let before = self.payments.lock().balance_of(&buyer(0));
        match market.buy(&buyer(0), &plant(), id) {
            Err(marketplace::Error::Ledger(ledger_core::Error::Paused)) => {}
            other => bail!("expected Paused, got {:?}", other),
        }
        ensure!(self.payments.lock().balance_of(&buyer(0)) == before);
        self.ledger.lock().unpause(&deployer())?;
        passed("buy during pause rolled back; payment untouched");

        market.cancel(&plant(), id)?;
        passed("cancelled listing returned 10 credits");
        ensure!(market.escrow_invariant_holds(), "escrow does not cover open listings");
        Ok(())
    }

    /// Check invariants and dump metrics
    fn summary(&self) -> Result<()> {
        heading("Summary");
        let ledger = self.ledger.lock();

        ensure!(ledger.check_supply_invariant(), "supply invariant violated");
        ensure!(ledger.events().verify_chain(), "event chain broken");
        passed(format!(
            "supply {} / cap {}, {} events, chain verified",
            ledger.total_supply(),
            ledger.mint_cap(),
            ledger.events().len()
        ));

        if let Ok(path) = std::env::var("CARBONRAIL_EVENTS_OUT") {
            std::fs::write(&path, ledger.events().to_json()?)
                .with_context(|| format!("writing events to {}", path))?;
            passed(format!("event log written to {}", path));
        }

        if let Some(metrics) = ledger.metrics() {
            let mut buffer = Vec::new();
            TextEncoder::new().encode(&metrics.registry().gather(), &mut buffer)?;
            println!("\n{}", String::from_utf8(buffer)?);
        }
        Ok(())
    }
}

/// Two buyers race for one listing; operations serialize, one wins
async fn contested_listing(demo: &Demo) -> Result<()> {
    heading("Contested listing");
    for i in 1..=2 {
        demo.payments.lock().credit(&buyer(i), 100)?;
    }
    let id = demo.market.lock().list(&plant(), 10, 5)?;

    let handles: Vec<_> = (1..=2)
        .map(|i| {
            let market = demo.market.clone();
            tokio::spawn(async move { market.lock().buy(&buyer(i), &plant(), id) })
        })
        .collect();

    let mut filled = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => filled += 1,
            Err(marketplace::Error::ListingNotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    ensure!(filled == 1, "exactly one buyer must fill the listing");

    let total: Amount = (1..=2)
        .map(|i| demo.ledger.lock().balance_of(&buyer(i)))
        .sum();
    ensure!(total == 10);
    passed("one buyer filled, the other saw ListingNotFound");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting CarbonRail demo");

    let ledger_config = ledger_core::Config::from_env()?;
    let reward_config = match std::env::args().nth(1) {
        Some(path) => RewardConfig::from_file(&path)
            .with_context(|| format!("loading reward config {}", path))?,
        None => RewardConfig::default().with_benchmark("energy", 1_000),
    };
    let market_config = marketplace::Config::from_env()?;

    let demo = Demo::new(ledger_config, reward_config, market_config)?;
    demo.token_lifecycle()?;
    let first = demo.oracle_submission()?;
    demo.rewards_and_governance(&first)?;
    demo.marketplace_trade()?;
    contested_listing(&demo).await?;
    demo.summary()?;

    tracing::info!("CarbonRail demo finished");
    Ok(())
}
