//! # Contribution Record State Machine
//!
//! State types for a contribution claim moving through attestation.
//!
//! ## State Machine
//!
//! ```text
//! Pending (exists, below quorum)
//!   │ confirmations reach quorum, 24h delay elapses
//!   ├──(finalize / resolve VALID)──▶ Finalized   (terminal, minted)
//!   └──(resolve INVALID)──────────▶ Voided      (terminal, nothing minted)
//! ```
//!
//! "Eligible" (quorum met, delay not yet elapsed) is a derived condition,
//! not a stored status — eligibility is always computed against the
//! authoritative clock at the moment of the mutation that relies on it.
//!
//! ## Invalid Transitions (rejected)
//!
//! - Finalized → anything
//! - Voided → anything
//!
//! The `disputed` flag is orthogonal to the status: once set it blocks
//! finalization until a ruling clears it, but it does not itself move the
//! record to a terminal state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{finalization_eligible_time, MIN_CONFIRMATIONS};
use crate::types::{Address, ContributionId, ProofHash, SubjectId};

// ════════════════════════════════════════════════════════════════════════════════
// CONTRIBUTION STATUS
// ════════════════════════════════════════════════════════════════════════════════

/// Lifecycle status of a contribution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionStatus {
    /// Record exists and may still accumulate confirmations.
    Pending,
    /// Terminal: settled and minted.
    Finalized,
    /// Terminal: ruled invalid, nothing minted.
    Voided,
}

impl ContributionStatus {
    /// Whether the record has reached a terminal state.
    #[must_use]
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Voided)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// CONTRIBUTION
// ════════════════════════════════════════════════════════════════════════════════

/// One contribution claim and its attestation progress.
///
/// ## Invariants
///
/// - `proof_hash` is bound at creation (the first confirmation) and never
///   changes; later confirmers must present the exact same hash.
/// - `confirmations` only grows, and only by distinct oracles.
/// - `status` transitions only per the state machine above; terminal states
///   are reached exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Content-derived record id.
    pub id: ContributionId,
    /// Worker the contribution is attributed to.
    pub worker: Address,
    /// Building the work was performed on.
    pub building: SubjectId,
    /// Settlement amount claimed.
    pub amount: u128,
    /// Proof hash bound by the first confirming oracle.
    pub proof_hash: ProofHash,
    /// Distinct oracles that have confirmed. BTreeSet for deterministic
    /// iteration order across replays.
    pub confirmations: BTreeSet<Address>,
    /// Unix timestamp of the first proposal.
    pub proposed_at: u64,
    /// Set when a dispute pre-empts finalization; cleared by a ruling.
    pub disputed: bool,
    /// Current lifecycle status.
    pub status: ContributionStatus,
}

impl Contribution {
    /// Creates a fresh record with no confirmations yet.
    ///
    /// The proposer's own confirmation is applied separately by the
    /// oracle layer so that propose-and-confirm share one code path.
    #[must_use]
    pub fn new(
        id: ContributionId,
        worker: Address,
        building: SubjectId,
        amount: u128,
        proof_hash: ProofHash,
        proposed_at: u64,
    ) -> Self {
        Self {
            id,
            worker,
            building,
            amount,
            proof_hash,
            confirmations: BTreeSet::new(),
            proposed_at,
            disputed: false,
            status: ContributionStatus::Pending,
        }
    }

    /// Number of distinct confirming oracles.
    #[must_use]
    pub fn confirmation_count(&self) -> u32 {
        self.confirmations.len() as u32
    }

    /// Whether quorum has been reached.
    #[must_use]
    pub fn has_quorum(&self) -> bool {
        self.confirmation_count() >= MIN_CONFIRMATIONS
    }

    /// Whether the 24h finalization delay has elapsed at `now`.
    #[must_use]
    #[inline]
    pub fn delay_elapsed(&self, now: u64) -> bool {
        now >= finalization_eligible_time(self.proposed_at)
    }

    /// Transition: Pending → Finalized.
    ///
    /// Rejected (no-op, returns `false`) unless status is `Pending`.
    pub fn mark_finalized(&mut self) -> bool {
        if self.status != ContributionStatus::Pending {
            return false;
        }
        self.status = ContributionStatus::Finalized;
        true
    }

    /// Transition: Pending → Voided.
    ///
    /// Rejected (no-op, returns `false`) unless status is `Pending`.
    pub fn mark_voided(&mut self) -> bool {
        if self.status != ContributionStatus::Pending {
            return false;
        }
        self.status = ContributionStatus::Voided;
        true
    }
}

/// Derives the content id of a contribution record.
///
/// SHA3-256 over a domain tag, the building id, the worker address, and
/// the amount. The proof is deliberately excluded: every oracle attesting
/// to the same (building, worker, amount) claim lands on the same record,
/// which is what lets a later confirmer's proof hash be checked against
/// the binding instead of silently creating a sibling record.
#[must_use]
pub fn derive_contribution_id(building: &SubjectId, worker: &Address, amount: u128) -> ContributionId {
    use sha3::{Digest, Sha3_256};

    let mut hasher = Sha3_256::new();
    hasher.update(b"provenet.contribution.v1");
    hasher.update(building);
    hasher.update(worker.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.finalize().into()
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
