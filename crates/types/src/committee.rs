//! Elected committees.

use crate::{EpochId, NodeId};
use sbor::prelude::*;
use std::fmt;
use thiserror::Error;

/// Role of a member within an executor committee.
///
/// Workers run the computation in the fast path; backup workers re-run it
/// only after a discrepancy has been declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub enum Role {
    Worker,
    BackupWorker,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Worker => write!(f, "worker"),
            Role::BackupWorker => write!(f, "backup-worker"),
        }
    }
}

/// Kind of an elected committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub enum CommitteeKind {
    /// Executes runtime rounds and submits executor commitments.
    ComputeExecutor,
    /// Serves runtime storage.
    Storage,
}

impl fmt::Display for CommitteeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitteeKind::ComputeExecutor => write!(f, "compute-executor"),
            CommitteeKind::Storage => write!(f, "storage"),
        }
    }
}

/// One elected committee member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub struct CommitteeMember {
    pub node_id: NodeId,
    pub role: Role,
}

/// Errors from committee queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitteeError {
    #[error("committee has no workers")]
    NoWorkers,
}

/// An elected committee for one epoch.
///
/// Member order is the election order and is consensus-relevant: it fixes the
/// proposer rotation and the traversal order of every deterministic scan.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Committee {
    pub kind: CommitteeKind,
    pub members: Vec<CommitteeMember>,
    /// Epoch this committee is elected for.
    pub valid_for: EpochId,
}

impl Committee {
    /// The transaction scheduler (proposer) for a round.
    ///
    /// Deterministically picks one `Worker`: workers in declared order,
    /// indexed by `round % worker_count`.
    pub fn transaction_scheduler(&self, round: u64) -> Result<&CommitteeMember, CommitteeError> {
        let workers: Vec<&CommitteeMember> = self
            .members
            .iter()
            .filter(|m| m.role == Role::Worker)
            .collect();
        if workers.is_empty() {
            return Err(CommitteeError::NoWorkers);
        }
        Ok(workers[(round % workers.len() as u64) as usize])
    }

    /// Number of members holding `role`.
    pub fn role_count(&self, role: Role) -> usize {
        self.members.iter().filter(|m| m.role == role).count()
    }
}
