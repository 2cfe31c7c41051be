//! Property-based tests for marketplace invariants
//!
//! - Escrow always covers open listings
//! - Credit supply and payment totals are conserved by trading
//! - A failed buy leaves both ledgers and the listing untouched

use ledger_core::{Amount, Ledger, Principal};
use marketplace::{Config, Marketplace, PaymentLedger};
use proptest::prelude::*;

const TRADERS: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Debug, Clone)]
enum Op {
    List { who: usize, amount: Amount, price: Amount },
    Buy { who: usize, seller: usize, id: u64 },
    Cancel { who: usize, id: u64 },
}

fn trader(i: usize) -> Principal {
    Principal::new(TRADERS[i % TRADERS.len()])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0usize..TRADERS.len();
    prop_oneof![
        (who.clone(), 0u128..120, 0u128..10)
            .prop_map(|(who, amount, price)| Op::List { who, amount, price }),
        (who.clone(), who.clone(), 0u64..4)
            .prop_map(|(who, seller, id)| Op::Buy { who, seller, id }),
        (who, 0u64..4).prop_map(|(who, id)| Op::Cancel { who, id }),
    ]
}

proptest! {
    #[test]
    fn prop_trading_conserves_value(ops in prop::collection::vec(op_strategy(), 1..50)) {
        let owner = Principal::new("owner");
        let mut ledger = Ledger::new(owner.clone(), ledger_core::Config::default());
        ledger.initialize(&owner, "CarbonToken", "CT", 8, None, 900, 1_000).unwrap();
        let mut payments = PaymentLedger::new();
        for i in 0..TRADERS.len() {
            ledger.transfer(&owner, 300, &owner, &trader(i), None).unwrap();
            payments.credit(&trader(i), 400).unwrap();
        }
        let ledger = ledger.into_shared();
        let payments = payments.into_shared();
        let mut market = Marketplace::new(Config::default(), ledger.clone(), payments.clone());

        for op in &ops {
            let credits_before = ledger.lock().state().clone();
            let paid_before = payments.lock().checkpoint();

            let outcome = match op {
                Op::List { who, amount, price } => {
                    market.list(&trader(*who), *amount, *price).map(|_| ())
                }
                Op::Buy { who, seller, id } => market.buy(&trader(*who), &trader(*seller), *id),
                Op::Cancel { who, id } => market.cancel(&trader(*who), *id),
            };

            if outcome.is_err() {
                let guard = ledger.lock();
                prop_assert_eq!(guard.state(), &credits_before);
                drop(guard);
                let mut restored = payments.lock().clone();
                restored.rollback(paid_before);
                for i in 0..TRADERS.len() {
                    prop_assert_eq!(
                        payments.lock().balance_of(&trader(i)),
                        restored.balance_of(&trader(i))
                    );
                }
            }

            prop_assert!(market.escrow_invariant_holds());
            prop_assert_eq!(payments.lock().total(), Some(1_200));
            let ledger = ledger.lock();
            prop_assert_eq!(ledger.total_supply(), 900);
            prop_assert!(ledger.check_supply_invariant());
        }
    }
}
