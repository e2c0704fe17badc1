//! Host adapter seams.
//!
//! The pool consults the host at exactly two points during admission: to
//! resolve a node's registry descriptor (attestation key verification) and to
//! semantically validate a proposer's side-effect messages (gas accounting).
//! Both adapters must be deterministic functions of consensus state; the pool
//! is consensus code and every validator must reach the same verdict.

use meridian_types::{Node, NodeId, RuntimeMessage};
use thiserror::Error;

use crate::error::MessageValidatorError;

/// Errors from registry node lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeLookupError {
    #[error("node not found in registry")]
    NotFound,
}

/// Registry node resolution.
pub trait NodeLookup {
    /// Look up a node descriptor.
    fn node(&self, id: &NodeId) -> Result<Node, NodeLookupError>;
}

/// Semantic validation of side-effect messages.
///
/// Only invoked on proposer commitments with a non-empty message list. The
/// returned error is surfaced by the pool unchanged.
pub trait MessageValidator {
    fn validate(&self, messages: &[RuntimeMessage]) -> Result<(), MessageValidatorError>;
}

impl<F> MessageValidator for F
where
    F: Fn(&[RuntimeMessage]) -> Result<(), MessageValidatorError>,
{
    fn validate(&self, messages: &[RuntimeMessage]) -> Result<(), MessageValidatorError> {
        self(messages)
    }
}

/// A validator that accepts any message list.
///
/// For hosts that do not meter messages (and for tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllMessages;

impl MessageValidator for AcceptAllMessages {
    fn validate(&self, _messages: &[RuntimeMessage]) -> Result<(), MessageValidatorError> {
        Ok(())
    }
}
