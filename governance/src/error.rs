//! Error types for governance

use thiserror::Error;

/// Result type for governance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Governance errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller is not a member
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// No proposal with this id
    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    /// Proposal already executed
    #[error("Proposal {0} is closed")]
    ProposalClosed(u64),

    /// Member already voted on this proposal
    #[error("Already voted on proposal {0}")]
    AlreadyVoted(u64),

    /// Vote tally does not carry the proposal
    #[error("Proposal not passed: {yes} yes, {no} no, quorum {quorum}")]
    NotPassed {
        /// Yes votes
        yes: u32,
        /// No votes
        no: u32,
        /// Required yes votes
        quorum: u32,
    },

    /// Credit rate must be positive
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// Quorum zero or larger than the member set
    #[error("Invalid quorum {quorum} for {members} members")]
    InvalidQuorum {
        /// Requested quorum
        quorum: u32,
        /// Member count
        members: usize,
    },

    /// Ledger rejected an executed action
    #[error(transparent)]
    Ledger(#[from] ledger_core::Error),
}

impl Error {
    /// Stable numeric error code
    pub fn code(&self) -> u32 {
        match self {
            Error::NotAuthorized(_) => 100,
            Error::ProposalNotFound(_) => 500,
            Error::ProposalClosed(_) => 501,
            Error::AlreadyVoted(_) => 502,
            Error::NotPassed { .. } => 503,
            Error::InvalidRate(_) => 504,
            Error::InvalidQuorum { .. } => 505,
            Error::Ledger(e) => e.code(),
        }
    }
}
