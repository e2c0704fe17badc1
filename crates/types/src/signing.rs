//! Signing payload construction.
//!
//! Every signature at the consensus layer is over a domain-separated payload
//! so signatures cannot be replayed across contexts (or across runtimes, for
//! payloads that embed the runtime id).

use crate::RuntimeId;

/// Domain tag for a node's outer signature on an executor commitment.
pub const DOMAIN_EXECUTOR_COMMITMENT: &[u8] = b"meridian/executor-commitment:";

/// Domain tag for an enclave's attestation signature on compute results.
pub const DOMAIN_RAK_ATTESTATION: &[u8] = b"meridian/rak-attestation:";

/// Payload a node signs when submitting an executor commitment.
///
/// Binds the runtime id so a commitment for one runtime cannot be replayed
/// into another runtime's pool.
pub fn executor_commitment_message(runtime_id: &RuntimeId, encoded_header: &[u8]) -> Vec<u8> {
    let mut message =
        Vec::with_capacity(DOMAIN_EXECUTOR_COMMITMENT.len() + 32 + encoded_header.len());
    message.extend_from_slice(DOMAIN_EXECUTOR_COMMITMENT);
    message.extend_from_slice(&runtime_id.0);
    message.extend_from_slice(encoded_header);
    message
}

/// Payload an enclave's attestation key signs over compute results.
pub fn rak_attestation_message(encoded_results: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(DOMAIN_RAK_ATTESTATION.len() + encoded_results.len());
    message.extend_from_slice(DOMAIN_RAK_ATTESTATION);
    message.extend_from_slice(encoded_results);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_id_separates_commitment_payloads() {
        let a = executor_commitment_message(&RuntimeId([1; 32]), b"header");
        let b = executor_commitment_message(&RuntimeId([2; 32]), b"header");
        assert_ne!(a, b);
    }

    #[test]
    fn test_domains_do_not_collide() {
        let a = executor_commitment_message(&RuntimeId([0; 32]), b"x");
        let b = rak_attestation_message(b"x");
        assert_ne!(a, b);
    }
}
