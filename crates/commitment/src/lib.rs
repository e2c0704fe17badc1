//! Executor-commitment pool.
//!
//! This crate decides whether a round of off-chain computation finalizes.
//! Each member of the elected executor committee submits a signed
//! [`ExecutorCommitment`]; the [`Pool`] validates them on arrival, tallies
//! them, and produces a deterministic verdict.
//!
//! # Trust Model
//!
//! - **Fast path**: every worker must produce the same verdict. While the
//!   round timer runs, all workers are required to answer; after it fires, up
//!   to `allowed_stragglers` may be missing (explicit failure indications
//!   count as stragglers).
//! - **Discrepancy**: the moment two distinct verdicts coexist — or too many
//!   workers report failure for a worker majority to remain reachable — the
//!   round escalates to the backup workers, who re-run the computation and
//!   must reach a strict majority.
//! - **Proposer**: one worker per round is the transaction scheduler. Only
//!   its commitment carries the round's side-effect messages, so the verdict
//!   the pool returns is always the proposer's commitment, and the proposer
//!   must agree with the winning vote.
//!
//! # Determinism
//!
//! The pool is consensus code: verdicts are a function of pool state and
//! arguments only. Iteration follows the committee's declared member order,
//! vote maps are `BTreeMap`s, and the host-supplied adapters must themselves
//! be deterministic functions of consensus state.
//!
//! # Driving the Pool
//!
//! The host consensus engine feeds commitments through
//! [`Pool::add_executor_commitment`] and calls [`Pool::try_finalize`] at
//! block boundaries, passing `did_timeout = true` whenever
//! [`Pool::is_timeout`] holds at the current height. Timeouts are logical
//! block heights, never wall-clock time.

mod adapters;
mod commitment;
mod error;
mod pool;

pub use adapters::{AcceptAllMessages, MessageValidator, NodeLookup, NodeLookupError};
pub use commitment::{
    ComputeResultsHeader, ExecutorCommitment, ExecutorCommitmentHeader, Failure,
    MalformedCommitment,
};
pub use error::{MessageValidatorError, PoolError};
pub use pool::{Pool, TIMEOUT_NEVER};
