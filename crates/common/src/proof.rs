//! # Contribution Proofs
//!
//! A [`ContributionProof`] is the structured, timestamped attestation an
//! oracle signs when it confirms that a real-world contribution occurred.
//!
//! ## Content addressing
//!
//! [`ContributionProof::proof_hash`] is the SHA3-256 digest of the
//! canonical field encoding. The hash is what gets bound to a contribution
//! on first confirmation and what the replay set is keyed by: once a proof
//! hash is bound to one contribution it can never originate or confirm a
//! different one.
//!
//! ## Validity
//!
//! Two independent checks, both caller-side before any state mutation:
//!
//! 1. **Shape** ([`validate_shape`](ContributionProof::validate_shape)):
//!    non-zero merkle root, location hash, building hash and data size,
//!    and a timestamp not in the future.
//! 2. **Freshness** ([`check_freshness`](ContributionProof::check_freshness)):
//!    age at most [`MAX_PROOF_AGE_SECS`] at confirmation time.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

use crate::constants::{is_proof_stale, MAX_PROOF_AGE_SECS};
use crate::error::ErrorKind;
use crate::types::ProofHash;

// ════════════════════════════════════════════════════════════════════════════════
// CONTRIBUTION PROOF
// ════════════════════════════════════════════════════════════════════════════════

/// Structured attestation of a physical contribution.
///
/// All fields are immutable once signed; any change produces a different
/// [`proof_hash`](ContributionProof::proof_hash) and therefore a different
/// signature payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionProof {
    /// Merkle root of the underlying sensor/measurement data.
    pub merkle_root: [u8; 32],
    /// Hash committing to the geographic location of the work.
    pub location_hash: [u8; 32],
    /// Hash committing to the building the work was performed on.
    pub building_hash: [u8; 32],
    /// Unix timestamp when the attestation was produced.
    pub timestamp: u64,
    /// Size in bytes of the committed measurement data.
    pub data_size: u64,
}

impl ContributionProof {
    /// SHA3-256 digest of the canonical field encoding.
    ///
    /// Encoding: a domain tag followed by the five fields in declaration
    /// order, integers big-endian. Deterministic across platforms.
    #[must_use]
    pub fn proof_hash(&self) -> ProofHash {
        let mut hasher = Sha3_256::new();
        hasher.update(b"provenet.proof.v1");
        hasher.update(self.merkle_root);
        hasher.update(self.location_hash);
        hasher.update(self.building_hash);
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.data_size.to_be_bytes());
        hasher.finalize().into()
    }

    /// Validates the structural shape of the proof against `now`.
    ///
    /// Rejects zeroed commitments, zero data size, and future-dated
    /// timestamps. Does not consult any state.
    pub fn validate_shape(&self, now: u64) -> Result<(), ProofError> {
        if self.merkle_root == [0u8; 32] {
            return Err(ProofError::EmptyMerkleRoot);
        }
        if self.location_hash == [0u8; 32] {
            return Err(ProofError::EmptyLocationHash);
        }
        if self.building_hash == [0u8; 32] {
            return Err(ProofError::EmptyBuildingHash);
        }
        if self.data_size == 0 {
            return Err(ProofError::ZeroDataSize);
        }
        if self.timestamp > now {
            return Err(ProofError::FutureTimestamp {
                timestamp: self.timestamp,
                now,
            });
        }
        Ok(())
    }

    /// Validates that the proof is still fresh at `now`.
    ///
    /// A proof older than [`MAX_PROOF_AGE_SECS`] can never be used to
    /// originate or confirm a contribution.
    pub fn check_freshness(&self, now: u64) -> Result<(), ProofError> {
        if is_proof_stale(self.timestamp, now) {
            return Err(ProofError::Stale {
                age_secs: now.saturating_sub(self.timestamp),
                max_secs: MAX_PROOF_AGE_SECS,
            });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PROOF ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Rejection reasons for a malformed or expired proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// Merkle root is all zeroes.
    EmptyMerkleRoot,
    /// Location hash is all zeroes.
    EmptyLocationHash,
    /// Building hash is all zeroes.
    EmptyBuildingHash,
    /// Data size is zero.
    ZeroDataSize,
    /// Timestamp lies in the future relative to the ledger clock.
    FutureTimestamp {
        /// Timestamp claimed by the proof.
        timestamp: u64,
        /// Current ledger time.
        now: u64,
    },
    /// Proof is older than the maximum accepted age.
    Stale {
        /// Age of the proof in seconds.
        age_secs: u64,
        /// Maximum accepted age in seconds.
        max_secs: u64,
    },
}

impl ProofError {
    /// Coarse classification for callers that branch on error class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyMerkleRoot
            | Self::EmptyLocationHash
            | Self::EmptyBuildingHash
            | Self::ZeroDataSize => ErrorKind::Validation,
            Self::FutureTimestamp { .. } | Self::Stale { .. } => ErrorKind::Temporal,
        }
    }
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMerkleRoot => write!(f, "proof merkle root is empty"),
            Self::EmptyLocationHash => write!(f, "proof location hash is empty"),
            Self::EmptyBuildingHash => write!(f, "proof building hash is empty"),
            Self::ZeroDataSize => write!(f, "proof data size is zero"),
            Self::FutureTimestamp { timestamp, now } => {
                write!(f, "proof timestamp {} is in the future (now {})", timestamp, now)
            }
            Self::Stale { age_secs, max_secs } => {
                write!(f, "proof is stale: age {}s exceeds maximum {}s", age_secs, max_secs)
            }
        }
    }
}

impl std::error::Error for ProofError {}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
