//! Pool error taxonomy.
//!
//! Most errors carry a stable numeric code so peers interpret verdicts
//! identically across versions; see [`PoolError::code`]. Codes 12 and 14 are
//! reserved and must not be reassigned.

use thiserror::Error;

/// Error returned by the host's message validator.
///
/// The pool propagates the reason untouched so the host can surface gas
/// accounting failures to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MessageValidatorError(pub String);

/// Errors emitted by the commitment pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("no runtime configured")]
    NoRuntime,

    #[error("no committee configured")]
    NoCommittee,

    #[error("invalid committee kind")]
    InvalidCommitteeKind,

    #[error("batch attestation signature invalid")]
    RakSigInvalid,

    #[error("node not part of committee")]
    NotInCommittee,

    #[error("node already sent commitment")]
    AlreadyCommitted,

    #[error("submitted commitment is not based on correct block")]
    NotBasedOnCorrectBlock,

    #[error("discrepancy detected")]
    DiscrepancyDetected,

    #[error("still waiting for commits")]
    StillWaiting,

    #[error("insufficient votes to finalize discrepancy resolution round")]
    InsufficientVotes,

    #[error("bad executor commitment")]
    BadExecutorCommitment,

    #[error("invalid messages")]
    InvalidMessages,

    #[error("timeout not for correct round")]
    TimeoutNotCorrectRound,

    #[error("node is scheduler")]
    NodeIsScheduler,

    #[error("invalid round")]
    InvalidRound,

    #[error("no proposer commitment")]
    NoProposerCommitment,

    #[error("bad proposer commitment")]
    BadProposerCommitment,

    /// The commitment's outer signature does not verify. Outside the numeric
    /// taxonomy; permanent, so the networking layer drops rather than retries.
    #[error("invalid commitment signature")]
    InvalidSignature,

    /// The host's message validator rejected the proposer's messages.
    /// Propagated verbatim for gas accounting visibility.
    #[error(transparent)]
    MessageValidation(#[from] MessageValidatorError),
}

impl PoolError {
    /// Stable wire code, or `None` for module-external errors (signature
    /// failures and message-validator rejections).
    pub fn code(&self) -> Option<u32> {
        match self {
            PoolError::NoRuntime => Some(1),
            PoolError::NoCommittee => Some(2),
            PoolError::InvalidCommitteeKind => Some(3),
            PoolError::RakSigInvalid => Some(4),
            PoolError::NotInCommittee => Some(5),
            PoolError::AlreadyCommitted => Some(6),
            PoolError::NotBasedOnCorrectBlock => Some(7),
            PoolError::DiscrepancyDetected => Some(8),
            PoolError::StillWaiting => Some(9),
            PoolError::InsufficientVotes => Some(10),
            PoolError::BadExecutorCommitment => Some(11),
            // 12 reserved.
            PoolError::InvalidMessages => Some(13),
            // 14 reserved.
            PoolError::TimeoutNotCorrectRound => Some(15),
            PoolError::NodeIsScheduler => Some(16),
            PoolError::InvalidRound => Some(17),
            PoolError::NoProposerCommitment => Some(18),
            PoolError::BadProposerCommitment => Some(19),
            PoolError::InvalidSignature | PoolError::MessageValidation(_) => None,
        }
    }

    /// Whether peers sending messages that trigger this error should be
    /// rejected outright instead of retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            PoolError::InvalidMessages | PoolError::InvalidSignature
        )
    }
}
