//! Runtime blocks.
//!
//! A runtime block closes one round of off-chain execution. The pool only
//! needs the header: commitments for round N+1 must reference the encoded
//! hash of the round-N header.

use crate::{Hash, RuntimeId};
use sbor::prelude::*;

/// Header of a runtime block.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockHeader {
    /// Runtime this block belongs to.
    pub runtime_id: RuntimeId,
    /// Round number.
    pub round: u64,
    /// Encoded hash of the previous round's header.
    pub previous_hash: Hash,
    /// Root of the round's I/O tree.
    pub io_root: Hash,
    /// Root of the runtime state tree after this round.
    pub state_root: Hash,
    /// Canonical hash of the round's emitted messages.
    pub messages_hash: Hash,
}

impl BlockHeader {
    /// Canonical hash of this header.
    pub fn encoded_hash(&self) -> Hash {
        let encoded = sbor::basic_encode(self).expect("header encoding cannot fail");
        Hash::from_bytes(&encoded)
    }
}

/// A runtime block.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Block {
    pub header: BlockHeader,
}

impl Block {
    /// Build the genesis block for a runtime.
    pub fn genesis(runtime_id: RuntimeId) -> Self {
        Self {
            header: BlockHeader {
                runtime_id,
                round: 0,
                previous_hash: Hash::ZERO,
                io_root: Hash::ZERO,
                state_root: Hash::ZERO,
                messages_hash: Hash::ZERO,
            },
        }
    }
}
