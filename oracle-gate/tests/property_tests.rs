//! Property-based tests for nonce sequencing
//!
//! - Counters strictly increase by one per accepted proof
//! - A consumed proof can never be accepted again for the same submitter

use ledger_core::Principal;
use oracle_gate::{Error, OracleGate, ProofHash};
use proptest::prelude::*;

fn proof(nonce: u64) -> ProofHash {
    ProofHash::digest(format!("reading-{}", nonce))
}

proptest! {
    /// Property: each accepted proof advances the counter by exactly one
    #[test]
    fn prop_nonce_strictly_increasing(
        registered in 1u64..30,
        attempts in prop::collection::vec((0usize..3, 0u64..40), 1..80),
    ) {
        let oracle = Principal::new("oracle");
        let mut gate = OracleGate::new(Principal::new("admin"), oracle.clone());
        for nonce in 0..registered {
            gate.register_expected_proof(&oracle, nonce, proof(nonce)).unwrap();
        }

        let submitters: Vec<Principal> =
            (0..3).map(|i| Principal::new(format!("plant-{}", i))).collect();

        for (who, guess) in attempts {
            let submitter = &submitters[who];
            let before = gate.current_nonce(submitter);

            match gate.validate(submitter, &proof(guess)) {
                Ok(consumed) => {
                    prop_assert_eq!(consumed, before);
                    prop_assert_eq!(guess, before);
                    prop_assert_eq!(gate.current_nonce(submitter), before + 1);
                }
                Err(_) => prop_assert_eq!(gate.current_nonce(submitter), before),
            }
        }
    }

    /// Property: replaying any consumed proof fails with a sequencing error
    #[test]
    fn prop_replay_always_fails(consumed in 1u64..20, extra in 0u64..5) {
        let oracle = Principal::new("oracle");
        let submitter = Principal::new("plant-0");
        let mut gate = OracleGate::new(Principal::new("admin"), oracle.clone());
        for nonce in 0..consumed + extra {
            gate.register_expected_proof(&oracle, nonce, proof(nonce)).unwrap();
        }
        for nonce in 0..consumed {
            gate.validate(&submitter, &proof(nonce)).unwrap();
        }

        for nonce in 0..consumed {
            let err = gate.validate(&submitter, &proof(nonce)).unwrap_err();
            let sequencing = matches!(
                err,
                Error::ProofMismatch { .. } | Error::UnknownNonce { .. }
            );
            prop_assert!(sequencing, "unexpected error {:?}", err);
        }
        prop_assert_eq!(gate.current_nonce(&submitter), consumed);
    }
}
