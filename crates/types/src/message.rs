//! Runtime side-effect messages.
//!
//! A runtime round may emit messages for the consensus layer to process
//! (staking transfers, registry updates). Only the round's proposer carries
//! them in its commitment; everyone else commits to their hash.

use crate::{Hash, NodeId};
use sbor::prelude::*;

/// A staking operation requested by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum StakingMessage {
    /// Transfer tokens out of the runtime's account.
    Transfer { to: NodeId, amount: u128 },
    /// Withdraw tokens into the runtime's account.
    Withdraw { from: NodeId, amount: u128 },
}

/// A registry operation requested by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum RegistryMessage {
    /// Update the runtime's own descriptor.
    UpdateRuntime { descriptor_hash: Hash },
}

/// A side-effect message emitted by a runtime round.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum RuntimeMessage {
    Staking(StakingMessage),
    Registry(RegistryMessage),
}

/// Canonical hash of a message list.
///
/// Everyone in the committee commits to this hash; the proposer additionally
/// carries the messages themselves. The empty list hashes to a well-defined
/// (non-zero) value so "no messages" is still an explicit commitment.
pub fn messages_hash(messages: &[RuntimeMessage]) -> Hash {
    let encoded =
        sbor::basic_encode(&messages.to_vec()).expect("message encoding cannot fail");
    Hash::from_bytes(&encoded)
}
