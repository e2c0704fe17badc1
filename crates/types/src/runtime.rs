//! Runtime descriptors.
//!
//! The registry's view of a runtime: execution parameters, the trusted
//! execution requirement, and the deployment history that maps epochs to
//! active versions.

use crate::{EpochId, RuntimeId, Version};
use sbor::prelude::*;

/// Trusted execution hardware required by a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BasicSbor)]
pub enum TeeHardware {
    /// No trusted execution required.
    #[default]
    None,
    /// Intel SGX enclaves.
    IntelSgx,
}

/// Parameters of the executor committee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BasicSbor)]
pub struct ExecutorParameters {
    /// Number of workers elected per round.
    pub group_size: u16,
    /// Number of backup workers elected per round.
    pub group_backup_size: u16,
    /// How many workers may fail to commit before the round must escalate.
    pub allowed_stragglers: u16,
    /// Maximum number of side-effect messages a proposer commitment may carry.
    pub max_messages: u32,
}

/// One deployment of a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub struct Deployment {
    /// Version deployed.
    pub version: Version,
    /// First epoch this deployment is active in.
    pub valid_from: EpochId,
}

/// A runtime descriptor.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct RuntimeDescriptor {
    pub id: RuntimeId,
    pub tee_hardware: TeeHardware,
    pub executor: ExecutorParameters,
    /// Deployment history, oldest first.
    pub deployments: Vec<Deployment>,
}

impl RuntimeDescriptor {
    /// The deployment active in `epoch`: the one with the greatest
    /// `valid_from <= epoch`, or `None` if nothing is deployed yet.
    pub fn active_deployment(&self, epoch: EpochId) -> Option<&Deployment> {
        self.deployments
            .iter()
            .filter(|d| d.valid_from <= epoch)
            .max_by_key(|d| d.valid_from)
    }
}
