//! The executor-commitment pool.
//!
//! One pool instance collects the commitments of a single (runtime,
//! committee, round) triple and decides, deterministically, whether the round
//! finalizes, escalates to the backup workers, or fails.
//!
//! # State Machine Flow
//!
//! 1. **Admission** → `add_executor_commitment` validates and stores each
//!    arriving commitment
//! 2. **Tally** → `process_commitments` counts votes for the active role and
//!    produces a verdict
//! 3. **Driver** → `try_finalize` wraps the tally with timeout arming and the
//!    worker → backup-worker mode switch
//! 4. **Reset** → `reset_commitments` rolls the pool to the next round
//!
//! The pool is a single-writer object: the consensus engine serializes every
//! call against it, and all verdicts depend only on pool state and arguments.

use meridian_types::{
    messages_hash, Block, Committee, CommitteeKind, Hash, NodeId, Role, RuntimeDescriptor,
    TeeHardware,
};
use sbor::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

use crate::adapters::{MessageValidator, NodeLookup};
use crate::commitment::ExecutorCommitment;
use crate::error::PoolError;

/// Timeout value meaning "no timed callback is needed".
pub const TIMEOUT_NEVER: u64 = 0;

// Backup workers are given 15/10 of the round timeout: re-execution starts
// from a cold state.
const BACKUP_WORKER_TIMEOUT_NUMERATOR: u64 = 15;
const BACKUP_WORKER_TIMEOUT_DENOMINATOR: u64 = 10;

/// One tallied verdict: an example commitment carrying it, and its count.
struct VoteEntry {
    commit: ExecutorCommitment,
    tally: usize,
}

/// A pool of executor commitments for one round.
///
/// Serializable: the canonical SBOR encoding round-trips everything except
/// the member/worker caches, which rebuild on first need.
///
/// The pool is not safe for concurrent use.
#[derive(BasicSbor)]
pub struct Pool {
    /// Runtime the commitments are collected for.
    runtime: Option<RuntimeDescriptor>,
    /// Committee the commitments are collected from.
    committee: Option<Committee>,
    /// Current protocol round.
    round: u64,
    /// Accepted commitments, keyed by submitting node.
    commitments: BTreeMap<NodeId, ExecutorCommitment>,
    /// Whether the round has moved to discrepancy resolution.
    discrepancy: bool,
    /// Height at which the owner should call `try_finalize(didTimeout=true)`,
    /// or [`TIMEOUT_NEVER`].
    next_timeout: u64,

    /// Cached committee member set, rebuilt lazily from `committee`.
    #[sbor(skip)]
    member_set: BTreeSet<NodeId>,
    /// Cached committee worker set, rebuilt lazily from `committee`.
    #[sbor(skip)]
    worker_set: BTreeSet<NodeId>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("round", &self.round)
            .field(
                "committee_size",
                &self.committee.as_ref().map_or(0, |c| c.members.len()),
            )
            .field("commitments", &self.commitments.len())
            .field("discrepancy", &self.discrepancy)
            .field("next_timeout", &self.next_timeout)
            .finish()
    }
}

impl Pool {
    /// Create an empty pool for a (runtime, committee, round) triple.
    pub fn new(
        runtime: Option<RuntimeDescriptor>,
        committee: Option<Committee>,
        round: u64,
    ) -> Self {
        Self {
            runtime,
            committee,
            round,
            commitments: BTreeMap::new(),
            discrepancy: false,
            next_timeout: TIMEOUT_NEVER,
            member_set: BTreeSet::new(),
            worker_set: BTreeSet::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// Runtime descriptor this pool collects commitments for.
    pub fn runtime(&self) -> Option<&RuntimeDescriptor> {
        self.runtime.as_ref()
    }

    /// Committee this pool collects commitments from.
    pub fn committee(&self) -> Option<&Committee> {
        self.committee.as_ref()
    }

    /// Current protocol round.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Accepted commitments, keyed by node.
    pub fn commitments(&self) -> &BTreeMap<NodeId, ExecutorCommitment> {
        &self.commitments
    }

    /// Whether the round has moved to discrepancy resolution.
    pub fn discrepancy(&self) -> bool {
        self.discrepancy
    }

    /// Height of the next expected forced finalization, or [`TIMEOUT_NEVER`].
    pub fn next_timeout(&self) -> u64 {
        self.next_timeout
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Committee membership
    // ═══════════════════════════════════════════════════════════════════════

    fn ensure_member_sets(&mut self) {
        let Some(committee) = &self.committee else {
            return;
        };
        if !self.member_set.is_empty() {
            return;
        }
        for member in &committee.members {
            self.member_set.insert(member.node_id);
            if member.role == Role::Worker {
                self.worker_set.insert(member.node_id);
            }
        }
    }

    fn is_member(&mut self, id: &NodeId) -> bool {
        if self.committee.is_none() {
            return false;
        }
        self.ensure_member_sets();
        self.member_set.contains(id)
    }

    fn is_worker(&mut self, id: &NodeId) -> bool {
        if self.committee.is_none() {
            return false;
        }
        self.ensure_member_sets();
        self.worker_set.contains(id)
    }

    fn is_scheduler(&self, id: &NodeId) -> bool {
        let Some(committee) = &self.committee else {
            return false;
        };
        match committee.transaction_scheduler(self.round) {
            Ok(scheduler) => scheduler.node_id == *id,
            Err(_) => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Roll the pool forward to a new round, clearing the commitments, the
    /// discrepancy flag, and the timeout.
    pub fn reset_commitments(&mut self, round: u64) {
        self.round = round;
        self.commitments.clear();
        self.discrepancy = false;
        self.next_timeout = TIMEOUT_NEVER;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Admission
    // ═══════════════════════════════════════════════════════════════════════

    /// Verify and add a new executor commitment to the pool.
    ///
    /// `parent` is the block the committed round executes on top of. The two
    /// adapter calls (`node_lookup` during attestation verification,
    /// `msg_validator` on proposer messages) are the only points where
    /// admission leaves the pool.
    ///
    /// A node that equivocates — submits a second commitment with a different
    /// verdict — is only rejected via [`PoolError::AlreadyCommitted`]; no
    /// evidence of the conflicting submission is recorded.
    pub fn add_executor_commitment(
        &mut self,
        parent: &Block,
        node_lookup: &dyn NodeLookup,
        msg_validator: &dyn MessageValidator,
        commit: ExecutorCommitment,
    ) -> Result<(), PoolError> {
        let runtime_id = self.runtime.as_ref().ok_or(PoolError::NoRuntime)?.id;

        // Outer signature by the submitting node, bound to the runtime.
        commit.verify_signature(runtime_id)?;

        self.add_verified_executor_commitment(parent, node_lookup, msg_validator, commit)
    }

    fn add_verified_executor_commitment(
        &mut self,
        parent: &Block,
        node_lookup: &dyn NodeLookup,
        msg_validator: &dyn MessageValidator,
        commit: ExecutorCommitment,
    ) -> Result<(), PoolError> {
        {
            let committee = self.committee.as_ref().ok_or(PoolError::NoCommittee)?;
            if committee.kind != CommitteeKind::ComputeExecutor {
                return Err(PoolError::InvalidCommitteeKind);
            }
        }

        // The node must be a committee member. No role filtering here:
        // commitments may arrive in any order, so a backup worker is admitted
        // even before a discrepancy has been declared.
        if !self.is_member(&commit.node_id) {
            return Err(PoolError::NotInCommittee);
        }

        // One commitment per node; no overwrites.
        if self.commitments.contains_key(&commit.node_id) {
            return Err(PoolError::AlreadyCommitted);
        }

        let runtime = self.runtime.as_ref().ok_or(PoolError::NoRuntime)?;
        let committee = self.committee.as_ref().ok_or(PoolError::NoCommittee)?;

        if self.round != parent.header.round {
            error!(
                round = self.round,
                block_round = parent.header.round,
                "incorrectly configured pool"
            );
            return Err(PoolError::InvalidRound);
        }

        // The commitment must extend the parent block.
        let expected_parent = parent.header.encoded_hash();
        if commit.header.results.previous_hash != expected_parent {
            debug!(
                node_id = ?commit.node_id,
                expected_previous_hash = ?expected_parent,
                previous_hash = ?commit.header.results.previous_hash,
                "executor commitment is not based on correct block"
            );
            return Err(PoolError::NotBasedOnCorrectBlock);
        }

        if let Err(err) = commit.validate_basic() {
            debug!(node_id = ?commit.node_id, %err, "executor commitment validate basic error");
            return Err(PoolError::BadExecutorCommitment);
        }

        if !commit.is_indicating_failure() {
            // Verify the trusted-execution attestation signature.
            if runtime.tee_hardware != TeeHardware::None {
                let node = match node_lookup.node(&commit.node_id) {
                    Ok(node) => node,
                    Err(err) => {
                        // Nodes cannot disappear mid-epoch; checked anyway.
                        warn!(
                            node_id = ?commit.node_id,
                            %err,
                            "unable to fetch node descriptor to verify attestation"
                        );
                        return Err(PoolError::NotInCommittee);
                    }
                };

                let Some(deployment) = runtime.active_deployment(committee.valid_for) else {
                    // Prevented elsewhere; checked anyway.
                    error!(
                        runtime_id = ?runtime.id,
                        node_id = ?commit.node_id,
                        "no active deployment"
                    );
                    return Err(PoolError::NoRuntime);
                };

                let Some(node_runtime) = node.get_runtime(runtime.id, deployment.version) else {
                    warn!(
                        runtime_id = ?runtime.id,
                        node_id = ?commit.node_id,
                        "committee member not registered with this runtime"
                    );
                    return Err(PoolError::NotInCommittee);
                };

                let Some(tee) = &node_runtime.capabilities.tee else {
                    error!(
                        runtime_id = ?runtime.id,
                        node_id = ?commit.node_id,
                        "node does not advertise a trusted-execution capability"
                    );
                    return Err(PoolError::RakSigInvalid);
                };

                commit.header.verify_rak(&tee.rak)?;
            }

            // Message rules: only the round's scheduler may emit messages.
            if self.is_scheduler(&commit.node_id) {
                if commit.messages.len() > runtime.executor.max_messages as usize {
                    debug!(
                        node_id = ?commit.node_id,
                        num_messages = commit.messages.len(),
                        max_messages = runtime.executor.max_messages,
                        "executor commitment from scheduler has too many messages"
                    );
                    return Err(PoolError::InvalidMessages);
                }
                let computed = messages_hash(&commit.messages);
                if Some(computed) != commit.header.results.messages_hash {
                    debug!(
                        node_id = ?commit.node_id,
                        expected_hash = ?computed,
                        messages_hash = ?commit.header.results.messages_hash,
                        "executor commitment from scheduler has invalid messages hash"
                    );
                    return Err(PoolError::InvalidMessages);
                }

                // Semantic validation (gas accounting); the validator's error
                // is propagated unchanged.
                if !commit.messages.is_empty() {
                    if let Err(err) = msg_validator.validate(&commit.messages) {
                        debug!(
                            node_id = ?commit.node_id,
                            %err,
                            "executor commitment from scheduler has invalid messages"
                        );
                        return Err(err.into());
                    }
                }
            } else if !commit.messages.is_empty() {
                debug!(
                    node_id = ?commit.node_id,
                    num_messages = commit.messages.len(),
                    "executor commitment from non-scheduler contains messages"
                );
                return Err(PoolError::InvalidMessages);
            }
        }

        self.commitments.insert(commit.node_id, commit);

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tally
    // ═══════════════════════════════════════════════════════════════════════

    /// Perform a single round of commitment checks: discrepancy detection
    /// while the flag is clear, discrepancy resolution once it is set.
    ///
    /// The `Ok` value is always the proposer's commitment — it is the one
    /// carrying the round's side-effect messages.
    ///
    /// # Panics
    ///
    /// Panics if the pool was wired up with a non-executor committee; that is
    /// a host programming error, not peer input.
    pub fn process_commitments(
        &mut self,
        did_timeout: bool,
    ) -> Result<ExecutorCommitment, PoolError> {
        let committee = self.committee.as_ref().ok_or(PoolError::NoCommittee)?;
        if committee.kind != CommitteeKind::ComputeExecutor {
            panic!(
                "commitment pool: unexpected committee kind: {}",
                committee.kind
            );
        }
        let runtime = self.runtime.as_ref().ok_or(PoolError::NoRuntime)?;

        // Gather votes over the active role, in committee order.
        let active_role = if self.discrepancy {
            Role::BackupWorker
        } else {
            Role::Worker
        };

        let mut total = 0usize;
        let mut commits = 0usize;
        let mut failures = 0usize;
        let mut votes: BTreeMap<Hash, VoteEntry> = BTreeMap::new();
        let mut second_verdict = false;

        for member in &committee.members {
            if member.role != active_role {
                continue;
            }
            total += 1;
            let Some(commit) = self.commitments.get(&member.node_id) else {
                continue;
            };
            commits += 1;

            if commit.is_indicating_failure() {
                failures += 1;
                continue;
            }

            votes
                .entry(commit.to_vote())
                .and_modify(|vote| vote.tally += 1)
                .or_insert_with(|| VoteEntry {
                    commit: commit.clone(),
                    tally: 1,
                });

            // Two distinct verdicts already prove a discrepancy; no need to
            // wait for the remaining commits.
            if !self.discrepancy && votes.len() > 1 {
                second_verdict = true;
                break;
            }
        }

        if second_verdict {
            self.discrepancy = true;
            return Err(PoolError::DiscrepancyDetected);
        }

        // Determine whether the proposer has submitted a commitment.
        let proposer = committee
            .transaction_scheduler(self.round)
            .map_err(|_| PoolError::NoCommittee)?;
        let proposer_commit = self.commitments.get(&proposer.node_id);
        if proposer_commit.is_none() && did_timeout {
            return Err(PoolError::NoProposerCommitment);
        }

        let (proposer_commit, winner) = if !self.discrepancy {
            // Discrepancy detection.
            let allowed_stragglers = usize::from(runtime.executor.allowed_stragglers);

            // If the number of valid commitments can no longer reach the
            // required threshold, escalate immediately instead of waiting for
            // the timer to expire.
            if failures > allowed_stragglers {
                self.discrepancy = true;
                return Err(PoolError::DiscrepancyDetected);
            }

            // While the timer is running, every worker has to answer. After
            // it fires, a bounded number of stragglers is tolerated, and
            // failures count as stragglers.
            let mut required = total;
            let mut commits = commits;
            if did_timeout {
                debug_assert!(
                    failures <= allowed_stragglers,
                    "failure overflow must have escalated above"
                );
                required = required.saturating_sub(allowed_stragglers);
                commits -= failures;
            }

            match proposer_commit {
                // The scan above ruled out a second verdict, so any surviving
                // vote is the round's verdict.
                Some(commit) if commits >= required => (commit, votes.values().next()),
                _ => return Err(PoolError::StillWaiting),
            }
        } else {
            // Discrepancy resolution: strict majority of backup workers.
            let required = total / 2 + 1;

            let top_vote = votes.values().max_by_key(|vote| vote.tally);
            let top_tally = top_vote.map_or(0, |vote| vote.tally);

            // Fail the round as soon as no verdict can reach the majority
            // with the votes still outstanding.
            let remaining = total - commits;
            if top_tally + remaining < required {
                return Err(PoolError::InsufficientVotes);
            }

            match (proposer_commit, top_vote) {
                (Some(commit), Some(top)) if top.tally >= required => (commit, Some(top)),
                _ if did_timeout => return Err(PoolError::InsufficientVotes),
                _ => return Err(PoolError::StillWaiting),
            }
        };

        // The proposer's commitment carries the authoritative messages, so it
        // must agree with the winning verdict. With every commit indicating
        // failure there is no surviving verdict at all, and nothing to
        // finalize with.
        match winner {
            Some(winner) if proposer_commit.mostly_equal(&winner.commit) => {
                Ok(proposer_commit.clone())
            }
            _ => Err(PoolError::BadProposerCommitment),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Finalization driver
    // ═══════════════════════════════════════════════════════════════════════

    /// Attempt to finalize the round, arming or clearing the timeout on the
    /// way out.
    ///
    /// When the detection-mode timer fires (`did_timeout`) and
    /// `is_timeout_authoritative` is false, the discrepancy verdict is
    /// returned without committing the state transition; replicas that are
    /// not the authoritative finalizer use this to peek at the verdict.
    pub fn try_finalize(
        &mut self,
        height: u64,
        round_timeout: u64,
        did_timeout: bool,
        is_timeout_authoritative: bool,
    ) -> Result<ExecutorCommitment, PoolError> {
        match self.process_commitments(did_timeout) {
            Ok(commit) => {
                self.next_timeout = TIMEOUT_NEVER;
                Ok(commit)
            }
            Err(PoolError::StillWaiting) => {
                if did_timeout {
                    // The fast path's round timer expired: hand the round to
                    // the backup workers, assuming it is ours to hand over.
                    if is_timeout_authoritative {
                        self.discrepancy = true;
                        // Re-arm stretched: backup workers need more time to
                        // redo the computation.
                        self.next_timeout = height
                            + (BACKUP_WORKER_TIMEOUT_NUMERATOR * round_timeout)
                                / BACKUP_WORKER_TIMEOUT_DENOMINATOR;
                    } else {
                        self.next_timeout = TIMEOUT_NEVER;
                    }
                    return Err(PoolError::DiscrepancyDetected);
                }

                // Insufficient commitments for finalization, wait.
                self.next_timeout = height + round_timeout;
                Err(PoolError::StillWaiting)
            }
            Err(PoolError::DiscrepancyDetected) => {
                self.next_timeout = height + round_timeout;
                Err(PoolError::DiscrepancyDetected)
            }
            Err(err) => {
                self.next_timeout = TIMEOUT_NEVER;
                Err(err)
            }
        }
    }

    /// Whether the time is up for the owner to call
    /// `try_finalize(did_timeout = true)`.
    pub fn is_timeout(&self, height: u64) -> bool {
        self.next_timeout != TIMEOUT_NEVER && height >= self.next_timeout
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Proposer timeout
    // ═══════════════════════════════════════════════════════════════════════

    /// Verify a worker's request to force-timeout a stalled round because the
    /// proposer is unresponsive.
    ///
    /// Only valid from a worker that is not the round's scheduler, for the
    /// current round, and before any commitment has arrived.
    pub fn check_proposer_timeout(
        &mut self,
        parent: &Block,
        _node_lookup: &dyn NodeLookup,
        requester: NodeId,
        round: u64,
    ) -> Result<(), PoolError> {
        {
            let committee = self.committee.as_ref().ok_or(PoolError::NoCommittee)?;
            if committee.kind != CommitteeKind::ComputeExecutor {
                return Err(PoolError::InvalidCommitteeKind);
            }
        }

        if round != parent.header.round {
            return Err(PoolError::TimeoutNotCorrectRound);
        }

        // Only valid while the round is still silent.
        if !self.commitments.is_empty() {
            return Err(PoolError::AlreadyCommitted);
        }

        if !self.is_worker(&requester) {
            return Err(PoolError::NotInCommittee);
        }

        if self.is_scheduler(&requester) {
            return Err(PoolError::NodeIsScheduler);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_types::{
        Committee, CommitteeMember, EpochId, ExecutorParameters, RuntimeDescriptor, RuntimeId,
    };

    fn member(seed: u8, role: Role) -> CommitteeMember {
        CommitteeMember {
            node_id: NodeId([seed; 32]),
            role,
        }
    }

    fn make_runtime() -> RuntimeDescriptor {
        RuntimeDescriptor {
            id: RuntimeId([42; 32]),
            tee_hardware: TeeHardware::None,
            executor: ExecutorParameters {
                group_size: 3,
                group_backup_size: 2,
                allowed_stragglers: 1,
                max_messages: 4,
            },
            deployments: vec![],
        }
    }

    fn make_committee(kind: CommitteeKind) -> Committee {
        Committee {
            kind,
            members: vec![
                member(1, Role::Worker),
                member(2, Role::Worker),
                member(3, Role::BackupWorker),
            ],
            valid_for: EpochId::GENESIS,
        }
    }

    #[test]
    fn test_is_timeout() {
        let mut pool = Pool::new(None, None, 0);
        assert!(!pool.is_timeout(0));
        assert!(!pool.is_timeout(u64::MAX));

        pool.next_timeout = 10;
        assert!(!pool.is_timeout(9));
        assert!(pool.is_timeout(10));
        assert!(pool.is_timeout(11));
    }

    #[test]
    fn test_reset_clears_round_state() {
        let mut pool = Pool::new(
            Some(make_runtime()),
            Some(make_committee(CommitteeKind::ComputeExecutor)),
            3,
        );
        pool.discrepancy = true;
        pool.next_timeout = 99;

        pool.reset_commitments(4);
        assert_eq!(pool.round(), 4);
        assert!(!pool.discrepancy());
        assert_eq!(pool.next_timeout(), TIMEOUT_NEVER);
        assert!(pool.commitments().is_empty());
    }

    #[test]
    fn test_process_requires_committee() {
        let mut pool = Pool::new(Some(make_runtime()), None, 0);
        assert_eq!(
            pool.process_commitments(false).unwrap_err(),
            PoolError::NoCommittee
        );
    }

    #[test]
    fn test_process_requires_runtime() {
        let mut pool = Pool::new(None, Some(make_committee(CommitteeKind::ComputeExecutor)), 0);
        assert_eq!(
            pool.process_commitments(false).unwrap_err(),
            PoolError::NoRuntime
        );
    }

    #[test]
    #[should_panic(expected = "unexpected committee kind")]
    fn test_process_panics_on_non_executor_committee() {
        let mut pool = Pool::new(
            Some(make_runtime()),
            Some(make_committee(CommitteeKind::Storage)),
            0,
        );
        let _ = pool.process_commitments(false);
    }

    #[test]
    fn test_member_sets_rebuild_after_decode() {
        let pool = Pool::new(
            Some(make_runtime()),
            Some(make_committee(CommitteeKind::ComputeExecutor)),
            0,
        );
        let bytes = sbor::basic_encode(&pool).unwrap();
        let mut decoded: Pool = sbor::basic_decode(&bytes).unwrap();

        assert!(decoded.member_set.is_empty());
        assert!(decoded.is_member(&NodeId([1; 32])));
        assert!(decoded.is_worker(&NodeId([2; 32])));
        assert!(!decoded.is_worker(&NodeId([3; 32])));
        assert!(!decoded.is_member(&NodeId([9; 32])));
    }
}
