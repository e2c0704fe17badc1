//! Executor commitments.
//!
//! A commitment is one committee member's signed verdict on a round: either
//! the compute results it produced, or an explicit failure indication. The
//! proposer's commitment additionally carries the round's side-effect
//! messages; everyone else only commits to their hash.

use meridian_types::{
    executor_commitment_message, rak_attestation_message, Hash, KeyPair, NodeId, PublicKey,
    RuntimeId, RuntimeMessage, Signature,
};
use sbor::prelude::*;
use thiserror::Error;

use crate::error::PoolError;

/// Why a commitment indicates failure instead of carrying results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BasicSbor)]
pub enum Failure {
    /// Not a failure; the commitment carries results.
    #[default]
    None,
    /// The node failed to execute the round for an unspecified reason.
    Unknown,
    /// The node could not fetch the state needed to execute the round.
    StateUnavailable,
}

/// The verdict-bearing portion of a commitment.
///
/// Two commitments agreeing on this struct agree on the round's outcome.
/// Roots are optional because a failure commitment has none.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct ComputeResultsHeader {
    /// Round these results close.
    pub round: u64,
    /// Encoded hash of the block the round was computed on top of.
    pub previous_hash: Hash,
    /// Root of the round's I/O tree.
    pub io_root: Option<Hash>,
    /// Root of the runtime state tree after the round.
    pub state_root: Option<Hash>,
    /// Canonical hash of the emitted messages.
    pub messages_hash: Option<Hash>,
}

impl ComputeResultsHeader {
    /// Canonical encoding, used for vote keys and attestation payloads.
    fn encode(&self) -> Vec<u8> {
        sbor::basic_encode(self).expect("results header encoding cannot fail")
    }
}

/// The signed header of an executor commitment.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct ExecutorCommitmentHeader {
    /// Compute results, or the failure skeleton when `failure` is set.
    pub results: ComputeResultsHeader,
    /// Failure indication.
    pub failure: Failure,
    /// Attestation signature over the results by the node's runtime
    /// attestation key. Required when the runtime runs in trusted execution.
    pub rak_signature: Option<Signature>,
}

impl ExecutorCommitmentHeader {
    /// Attach an attestation signature produced by the enclave's RAK.
    ///
    /// Must happen before the outer signature is produced, since the outer
    /// signature covers the whole header.
    pub fn attach_rak_signature(&mut self, rak: &KeyPair) {
        let payload = rak_attestation_message(&self.results.encode());
        self.rak_signature = Some(rak.sign(&payload));
    }

    /// Verify the attestation signature against a registered RAK.
    pub fn verify_rak(&self, rak: &PublicKey) -> Result<(), PoolError> {
        let signature = self.rak_signature.ok_or(PoolError::RakSigInvalid)?;
        let payload = rak_attestation_message(&self.results.encode());
        rak.verify(&payload, &signature)
            .map_err(|_| PoolError::RakSigInvalid)
    }
}

/// Intra-commitment consistency violations found by
/// [`ExecutorCommitment::validate_basic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedCommitment {
    #[error("commitment is missing result roots")]
    MissingRoots,
    #[error("failure commitment carries result roots")]
    UnexpectedRoots,
    #[error("failure commitment carries messages")]
    UnexpectedMessages,
    #[error("failure commitment carries an attestation signature")]
    UnexpectedRakSignature,
}

/// A signed statement by a committee member about a round.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ExecutorCommitment {
    /// Submitting node. Doubles as the verifying key of `signature`.
    pub node_id: NodeId,
    /// The signed header.
    pub header: ExecutorCommitmentHeader,
    /// Outer signature by the node's identity key over the header.
    pub signature: Signature,
    /// Side-effect messages. Only the round's proposer may populate this.
    pub messages: Vec<RuntimeMessage>,
}

impl ExecutorCommitment {
    /// Build and sign a commitment.
    pub fn sign(
        key: &KeyPair,
        runtime_id: RuntimeId,
        header: ExecutorCommitmentHeader,
        messages: Vec<RuntimeMessage>,
    ) -> Self {
        let encoded = sbor::basic_encode(&header).expect("header encoding cannot fail");
        let payload = executor_commitment_message(&runtime_id, &encoded);
        Self {
            node_id: key.public_key().into(),
            signature: key.sign(&payload),
            header,
            messages,
        }
    }

    /// Verify the outer signature for the given runtime.
    pub fn verify_signature(&self, runtime_id: RuntimeId) -> Result<(), PoolError> {
        let encoded = sbor::basic_encode(&self.header).expect("header encoding cannot fail");
        let payload = executor_commitment_message(&runtime_id, &encoded);
        self.node_id
            .public_key()
            .verify(&payload, &self.signature)
            .map_err(|_| PoolError::InvalidSignature)
    }

    /// Whether this commitment indicates failure instead of results.
    pub fn is_indicating_failure(&self) -> bool {
        self.header.failure != Failure::None
    }

    /// Stable fingerprint of the verdict, for tallying.
    ///
    /// Two commitments with equal vote keys cast the same vote. Only
    /// meaningful for non-failure commitments; the tally counts failure
    /// commitments separately, never by key.
    pub fn to_vote(&self) -> Hash {
        Hash::from_bytes(&self.header.results.encode())
    }

    /// Equality on the consensus-material fields, ignoring the proposer-only
    /// message payload and all signatures.
    pub fn mostly_equal(&self, other: &ExecutorCommitment) -> bool {
        self.header.results == other.header.results
    }

    /// Check intra-commitment well-formedness.
    ///
    /// A results commitment must carry all three roots; a failure commitment
    /// must carry none of them, no messages, and no attestation signature.
    pub fn validate_basic(&self) -> Result<(), MalformedCommitment> {
        let results = &self.header.results;
        match self.header.failure {
            Failure::None => {
                if results.io_root.is_none()
                    || results.state_root.is_none()
                    || results.messages_hash.is_none()
                {
                    return Err(MalformedCommitment::MissingRoots);
                }
            }
            Failure::Unknown | Failure::StateUnavailable => {
                if results.io_root.is_some()
                    || results.state_root.is_some()
                    || results.messages_hash.is_some()
                {
                    return Err(MalformedCommitment::UnexpectedRoots);
                }
                if !self.messages.is_empty() {
                    return Err(MalformedCommitment::UnexpectedMessages);
                }
                if self.header.rak_signature.is_some() {
                    return Err(MalformedCommitment::UnexpectedRakSignature);
                }
            }
        }
        Ok(())
    }
}
