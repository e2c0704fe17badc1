//! Registry node descriptors.

use crate::{NodeId, PublicKey, RuntimeId, TeeHardware, Version};
use sbor::prelude::*;

/// Trusted execution capability advertised by a node for one runtime.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct CapabilityTee {
    /// Hardware the enclave runs on.
    pub hardware: TeeHardware,
    /// Runtime attestation key: signs compute results produced inside the
    /// enclave.
    pub rak: PublicKey,
}

/// Capabilities advertised by a node for one runtime binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct Capabilities {
    pub tee: Option<CapabilityTee>,
}

/// A node's registration for one runtime at one deployment version.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct NodeRuntime {
    pub id: RuntimeId,
    pub version: Version,
    pub capabilities: Capabilities,
}

/// A registry node descriptor.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Node {
    pub id: NodeId,
    /// Runtime bindings, one per (runtime, version) pair.
    pub runtimes: Vec<NodeRuntime>,
}

impl Node {
    /// Look up this node's binding for a runtime at a deployment version.
    pub fn get_runtime(&self, id: RuntimeId, version: Version) -> Option<&NodeRuntime> {
        self.runtimes
            .iter()
            .find(|rt| rt.id == id && rt.version == version)
    }
}
