//! Foundation types for the Meridian executor-commitment layer.
//!
//! This crate provides the types shared between the commitment pool and its
//! host:
//!
//! - **Primitives**: [`Hash`], keys and signatures
//! - **Identifiers**: [`NodeId`], [`EpochId`], [`RuntimeId`], [`Version`]
//! - **Registry views**: [`RuntimeDescriptor`], [`Node`], [`Committee`]
//! - **Round data**: [`Block`], [`RuntimeMessage`]
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer. Every type
//! that crosses the consensus boundary derives `BasicSbor`, so its canonical
//! encoding is fixed and deterministic.

mod block;
mod committee;
mod crypto;
mod hash;
mod identifiers;
mod message;
mod node;
mod runtime;
mod signing;

pub use block::{Block, BlockHeader};
pub use committee::{Committee, CommitteeError, CommitteeKind, CommitteeMember, Role};
pub use crypto::{CryptoError, KeyPair, PublicKey, Signature};
pub use hash::{Hash, HexError};
pub use identifiers::{EpochId, NodeId, RuntimeId, Version};
pub use message::{messages_hash, RegistryMessage, RuntimeMessage, StakingMessage};
pub use node::{Capabilities, CapabilityTee, Node, NodeRuntime};
pub use runtime::{Deployment, ExecutorParameters, RuntimeDescriptor, TeeHardware};
pub use signing::{
    executor_commitment_message, rak_attestation_message, DOMAIN_EXECUTOR_COMMITMENT,
    DOMAIN_RAK_ATTESTATION,
};
