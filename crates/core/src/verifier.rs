//! # Attestation Verifier
//!
//! Validates a structured, timestamped attestation against the calling
//! oracle's registered key and the freshness window. Three gates, checked
//! in order, all read-only:
//!
//! 1. **Shape** — non-zero commitments, sane timestamp.
//! 2. **Freshness** — age at most one hour at confirmation time.
//! 3. **Signature** — Ed25519 over the proof hash, verified against the
//!    oracle's registered public key.
//!
//! The verifier mutates nothing; the oracle layer runs it before touching
//! any record.

use thiserror::Error;

use provenet_common::crypto::{verify_signature, CryptoError};
use provenet_common::error::ErrorKind;
use provenet_common::proof::ProofError;
use provenet_common::ContributionProof;

/// Attestation rejection reasons.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid proof: {0}")]
    Proof(#[from] ProofError),

    #[error("invalid signature: {0}")]
    Signature(#[from] CryptoError),
}

impl VerifyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Proof(e) => e.kind(),
            Self::Signature(_) => ErrorKind::Authorization,
        }
    }
}

/// Verifies `proof` and its `signature` by `pubkey` at time `now`.
///
/// The signature payload is the proof's content hash, so any field change
/// invalidates the signature along with the binding.
pub fn verify_attestation(
    pubkey: &[u8; 32],
    proof: &ContributionProof,
    signature: &[u8],
    now: u64,
) -> Result<(), VerifyError> {
    proof.validate_shape(now)?;
    proof.check_freshness(now)?;
    verify_signature(pubkey, &proof.proof_hash(), signature)?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
