//! Append-only, hash-chained event log
//!
//! Every successful state mutation appends exactly one [`LedgerEvent`].
//! Events are never modified; a rolled-back operation truncates the log
//! back to its checkpoint, so rejected work leaves no trace.

use crate::crypto::{chain_hash, GENESIS_HASH};
use crate::types::{Amount, Principal, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event payload (one variant per state-mutating operation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Ledger initialized and initial supply credited to the owner
    Initialized {
        /// Deployer, now owner
        owner: Principal,
        /// Token name
        name: String,
        /// Token symbol
        symbol: String,
        /// Declared decimals
        decimals: u8,
        /// Metadata URI
        uri: Option<String>,
        /// Supply credited to the owner
        initial_supply: Amount,
        /// Initial mint cap
        mint_cap: Amount,
    },

    /// Credits moved between accounts
    Transfer {
        /// Debited account
        sender: Principal,
        /// Credited account
        recipient: Principal,
        /// Amount moved
        amount: Amount,
        /// Optional memo (at most 34 bytes)
        memo: Option<Vec<u8>>,
    },

    /// New credits created
    Mint {
        /// Minter that issued the credits
        minter: Principal,
        /// Credited account
        recipient: Principal,
        /// Amount created
        amount: Amount,
    },

    /// Credits destroyed
    Burn {
        /// Debited account
        sender: Principal,
        /// Amount destroyed
        amount: Amount,
    },

    /// Global pause set
    Paused {
        /// Pauser
        by: Principal,
    },

    /// Global pause cleared
    Unpaused {
        /// Pauser
        by: Principal,
    },

    /// Role granted
    RoleGranted {
        /// Role
        role: Role,
        /// New member
        account: Principal,
    },

    /// Role revoked
    RoleRevoked {
        /// Role
        role: Role,
        /// Former member
        account: Principal,
    },

    /// Account blacklisted
    Blacklisted {
        /// Restricted account
        account: Principal,
        /// Blacklister
        by: Principal,
    },

    /// Account removed from the blacklist
    Unblacklisted {
        /// Released account
        account: Principal,
        /// Blacklister
        by: Principal,
    },

    /// Mint cap changed
    MintCapUpdated {
        /// Previous cap
        old_cap: Amount,
        /// New cap
        new_cap: Amount,
    },

    /// Token URI changed
    TokenUriUpdated {
        /// New URI
        uri: Option<String>,
    },

    /// Owner changed
    OwnershipTransferred {
        /// Previous owner
        previous_owner: Principal,
        /// New owner
        new_owner: Principal,
    },
}

impl EventKind {
    /// Event name as emitted to subscribers
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Initialized { .. } => "initialized",
            EventKind::Transfer { .. } => "transfer",
            EventKind::Mint { .. } => "mint",
            EventKind::Burn { .. } => "burn",
            EventKind::Paused { .. } => "paused",
            EventKind::Unpaused { .. } => "unpaused",
            EventKind::RoleGranted { .. } => "role-granted",
            EventKind::RoleRevoked { .. } => "role-revoked",
            EventKind::Blacklisted { .. } => "blacklisted",
            EventKind::Unblacklisted { .. } => "unblacklisted",
            EventKind::MintCapUpdated { .. } => "mint-cap-updated",
            EventKind::TokenUriUpdated { .. } => "token-uri-updated",
            EventKind::OwnershipTransferred { .. } => "ownership-transferred",
        }
    }
}

/// Ledger event with its position in the hash chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Position in the log (0-based)
    pub sequence: u64,

    /// Payload
    pub kind: EventKind,

    /// Emission time
    pub timestamp: DateTime<Utc>,

    /// Hash of the preceding event (zero for the first)
    pub previous_hash: [u8; 32],

    /// Hash of this event
    pub hash: [u8; 32],
}

#[derive(Serialize)]
struct CanonicalEvent<'a> {
    event_id: &'a Uuid,
    sequence: u64,
    kind: &'a EventKind,
    timestamp_nanos: i64,
}

impl LedgerEvent {
    /// Create canonical bytes for hashing
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let canonical = CanonicalEvent {
            event_id: &self.event_id,
            sequence: self.sequence,
            kind: &self.kind,
            timestamp_nanos: self.timestamp.timestamp_nanos_opt().unwrap_or(0),
        };
        bincode::serialize(&canonical).expect("serialization cannot fail")
    }

    /// Recompute this event's hash from its contents
    pub fn compute_hash(&self) -> [u8; 32] {
        chain_hash(&self.previous_hash, &self.canonical_bytes())
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    /// Create empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return a reference to it
    pub fn append(&mut self, kind: EventKind) -> &LedgerEvent {
        let previous_hash = self.head();
        let mut event = LedgerEvent {
            event_id: Uuid::now_v7(),
            sequence: self.events.len() as u64,
            kind,
            timestamp: Utc::now(),
            previous_hash,
            hash: [0u8; 32],
        };
        event.hash = event.compute_hash();

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Hash of the latest event (genesis hash when empty)
    pub fn head(&self) -> [u8; 32] {
        self.events.last().map(|e| e.hash).unwrap_or(GENESIS_HASH)
    }

    /// All events in order
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events from `start` onwards
    pub fn since(&self, start: usize) -> &[LedgerEvent] {
        &self.events[start.min(self.events.len())..]
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop events past `len` (rollback)
    pub(crate) fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Export the log as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }

    /// Verify sequence numbers and hash links of the whole log
    pub fn verify_chain(&self) -> bool {
        let mut previous = GENESIS_HASH;
        for (i, event) in self.events.iter().enumerate() {
            if event.sequence != i as u64
                || event.previous_hash != previous
                || event.compute_hash() != event.hash
            {
                return false;
            }
            previous = event.hash;
        }
        true
    }
}
