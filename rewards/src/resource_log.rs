//! Resource log
//!
//! Usage entries are admitted only after the oracle gate accepts the
//! attached proof. The sequence key of an entry is the nonce it consumed.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ledger_core::{Amount, Principal};
use oracle_gate::{ProofHash, SharedOracleGate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Maximum resource kind label length (bytes)
pub const MAX_RESOURCE_KIND_LEN: usize = 32;

/// Resource log shared with the reward distributor
pub type SharedResourceLog = Arc<Mutex<ResourceLog>>;

/// Resource kind label ("energy", "water", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKind(String);

impl ResourceKind {
    /// Validate and wrap a label
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() || label.len() > MAX_RESOURCE_KIND_LEN {
            return Err(Error::InvalidResourceKind(label));
        }
        Ok(Self(label))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry key: submitter plus the nonce consumed by its proof
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    /// Submitting principal
    pub submitter: Principal,

    /// Sequence position
    pub sequence: u64,
}

impl EntryKey {
    /// Create new key
    pub fn new(submitter: Principal, sequence: u64) -> Self {
        Self {
            submitter,
            sequence,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.submitter, self.sequence)
    }
}

/// Logged usage entry
///
/// Immutable except for `claimed`, which flips false → true once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLogEntry {
    /// Entry key
    pub key: EntryKey,

    /// Usage amount
    pub usage: Amount,

    /// Resource kind
    pub resource_kind: ResourceKind,

    /// Proof accepted by the oracle gate
    pub proof: ProofHash,

    /// Set once credits are minted for this entry
    pub claimed: bool,

    /// Admission time
    pub recorded_at: DateTime<Utc>,
}

/// Oracle-gated usage log
#[derive(Debug)]
pub struct ResourceLog {
    oracle: SharedOracleGate,
    entries: BTreeMap<EntryKey, ResourceLogEntry>,
}

impl ResourceLog {
    /// Create log validating against `oracle`
    pub fn new(oracle: SharedOracleGate) -> Self {
        Self {
            oracle,
            entries: BTreeMap::new(),
        }
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedResourceLog {
        Arc::new(Mutex::new(self))
    }

    /// Submit a usage reading with its oracle proof
    ///
    /// The caller is the submitter. Oracle rejections propagate unchanged.
    pub fn submit(
        &mut self,
        caller: &Principal,
        usage: Amount,
        resource_kind: &str,
        proof: ProofHash,
    ) -> Result<EntryKey> {
        if usage == 0 {
            return Err(Error::InvalidAmount("usage must be positive".to_string()));
        }
        let resource_kind = ResourceKind::new(resource_kind)?;

        let mut oracle = self.oracle.lock();
        let key = EntryKey::new(caller.clone(), oracle.current_nonce(caller));
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateEntry(key));
        }

        let sequence = oracle.validate(caller, &proof)?;
        drop(oracle);
        debug_assert_eq!(sequence, key.sequence);

        let entry = ResourceLogEntry {
            key: key.clone(),
            usage,
            resource_kind,
            proof,
            claimed: false,
            recorded_at: Utc::now(),
        };
        tracing::info!(
            "Logged {} {} usage for {}",
            entry.usage,
            entry.resource_kind,
            key
        );
        self.entries.insert(key.clone(), entry);

        Ok(key)
    }

    /// Look up an entry
    pub fn get(&self, key: &EntryKey) -> Option<&ResourceLogEntry> {
        self.entries.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &EntryKey) -> Option<&mut ResourceLogEntry> {
        self.entries.get_mut(key)
    }

    /// All entries of one submitter, in sequence order
    pub fn entries_for<'a>(
        &'a self,
        submitter: &'a Principal,
    ) -> impl Iterator<Item = &'a ResourceLogEntry> + 'a {
        self.entries
            .values()
            .filter(move |entry| &entry.key.submitter == submitter)
    }

    /// Entries not yet claimed
    pub fn unclaimed(&self) -> impl Iterator<Item = &ResourceLogEntry> {
        self.entries.values().filter(|entry| !entry.claimed)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_gate::OracleGate;

    fn oracle() -> Principal {
        Principal::new("oracle")
    }

    fn plant() -> Principal {
        Principal::new("plant-7")
    }

    fn create_test_log() -> (ResourceLog, SharedOracleGate) {
        let gate = OracleGate::new(Principal::new("admin"), oracle()).into_shared();
        (ResourceLog::new(gate.clone()), gate)
    }

    #[test]
    fn test_submit_then_replay() {
        let (mut log, gate) = create_test_log();
        let proof = ProofHash::digest(b"X");
        gate.lock()
            .register_expected_proof(&oracle(), 0, proof)
            .unwrap();

        let key = log.submit(&plant(), 500, "energy", proof).unwrap();
        assert_eq!(key, EntryKey::new(plant(), 0));

        let entry = log.get(&key).unwrap();
        assert_eq!(entry.usage, 500);
        assert_eq!(entry.resource_kind.as_str(), "energy");
        assert!(!entry.claimed);

        let err = log.submit(&plant(), 500, "energy", proof).unwrap_err();
        assert!(matches!(
            err,
            Error::Oracle(oracle_gate::Error::UnknownNonce { nonce: 1, .. })
        ));
        assert_eq!(err.code(), 200);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_input_checks_precede_oracle() {
        let (mut log, gate) = create_test_log();
        let proof = ProofHash::digest(b"X");
        gate.lock()
            .register_expected_proof(&oracle(), 0, proof)
            .unwrap();

        assert!(matches!(
            log.submit(&plant(), 0, "energy", proof),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            log.submit(&plant(), 10, "", proof),
            Err(Error::InvalidResourceKind(_))
        ));
        assert!(matches!(
            log.submit(&plant(), 10, &"k".repeat(33), proof),
            Err(Error::InvalidResourceKind(_))
        ));

        // nonce still unconsumed
        assert_eq!(gate.lock().current_nonce(&plant()), 0);
    }

    #[test]
    fn test_mismatch_propagates() {
        let (mut log, gate) = create_test_log();
        gate.lock()
            .register_expected_proof(&oracle(), 0, ProofHash::digest(b"X"))
            .unwrap();

        let err = log
            .submit(&plant(), 10, "energy", ProofHash::digest(b"Y"))
            .unwrap_err();
        assert_eq!(err.code(), 201);
        assert!(log.is_empty());
    }

    #[test]
    fn test_entries_for_submitter() {
        let (mut log, gate) = create_test_log();
        for nonce in 0..3u64 {
            gate.lock()
                .register_expected_proof(&oracle(), nonce, ProofHash::digest(nonce.to_le_bytes()))
                .unwrap();
        }

        log.submit(&plant(), 1, "energy", ProofHash::digest(0u64.to_le_bytes()))
            .unwrap();
        log.submit(&plant(), 2, "water", ProofHash::digest(1u64.to_le_bytes()))
            .unwrap();
        let other = Principal::new("plant-8");
        log.submit(&other, 3, "energy", ProofHash::digest(0u64.to_le_bytes()))
            .unwrap();

        let sequences: Vec<u64> = log.entries_for(&plant()).map(|e| e.key.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
        assert_eq!(log.unclaimed().count(), 3);
    }
}
