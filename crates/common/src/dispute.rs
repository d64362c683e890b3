//! # Dispute Record & Commit-Reveal Voting Types
//!
//! State types for the bond-gated challenge game that can pre-empt a
//! pending contribution.
//!
//! ## State Machine
//!
//! ```text
//! Pending (record constructed, not yet funded)
//!   └──(bond taken, contribution flagged)──▶ Voting
//!         └──(48h window closes, ruling computed)──▶ Resolved (terminal)
//! ```
//!
//! ## Commit-Reveal
//!
//! Jurors first submit `commitment = SHA3-256(tag ‖ vote ‖ salt)`, then
//! reveal `(vote, salt)` which is checked against the commitment before
//! tallying. This prevents vote-copying and last-mover advantage during
//! the voting window.
//!
//! ## Apathy Rule
//!
//! If fewer than [`MIN_JURORS`] jurors reveal, the ruling defaults to
//! VALID. Apathy is deliberately treated as trusting the original
//! contribution, so a dispute cannot be stalled into an automatic win by
//! simply not voting.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;

use crate::constants::{voting_end_time, MIN_JURORS};
use crate::types::{Address, ContributionId};

// ════════════════════════════════════════════════════════════════════════════════
// DISPUTE STATUS & RULING
// ════════════════════════════════════════════════════════════════════════════════

/// Lifecycle status of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeStatus {
    /// Constructed but not yet funded and attached to its contribution.
    Pending,
    /// Bond taken, contribution flagged, voting window open.
    Voting,
    /// Terminal: ruling applied.
    Resolved,
}

/// Outcome of a resolved dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ruling {
    /// The contribution stands; the disputer's bond is forfeited.
    Valid,
    /// The contribution is voided; the bond is returned to the disputer.
    Invalid,
}

// ════════════════════════════════════════════════════════════════════════════════
// VOTE COMMITMENT
// ════════════════════════════════════════════════════════════════════════════════

/// One juror's commit-reveal record within a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCommitment {
    /// Juror that committed.
    pub committer: Address,
    /// SHA3-256 commitment to (vote, salt).
    pub commitment: [u8; 32],
    /// Set once the juror has revealed.
    pub revealed: bool,
    /// The revealed vote, if any. `true` means the contribution is valid.
    pub vote: Option<bool>,
}

/// Commitment digest a juror submits during the commit phase.
///
/// `SHA3-256(tag ‖ vote ‖ salt)` with `vote` encoded as a single byte.
#[must_use]
pub fn vote_commitment_hash(vote: bool, salt: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(b"provenet.vote.v1");
    hasher.update([u8::from(vote)]);
    hasher.update(salt);
    hasher.finalize().into()
}

// ════════════════════════════════════════════════════════════════════════════════
// EVIDENCE
// ════════════════════════════════════════════════════════════════════════════════

/// Informational evidence attached to a dispute. Never affects tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Address that submitted the evidence.
    pub submitter: Address,
    /// Opaque reference (URI, content hash, case number).
    pub reference: String,
    /// Unix timestamp of submission.
    pub submitted_at: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// DISPUTE
// ════════════════════════════════════════════════════════════════════════════════

/// One challenge against a pending contribution.
///
/// ## Invariants
///
/// - `bond` is fixed at construction and either forfeited or returned in
///   full at resolution.
/// - One commitment per juror; one reveal per commitment.
/// - `valid_votes + invalid_votes` equals the number of revealed
///   commitments.
/// - `ruling` is `Some` exactly when `status == Resolved`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Contribution under challenge.
    pub contribution_id: ContributionId,
    /// Address that raised the dispute and posted the bond.
    pub disputer: Address,
    /// Bond amount held for the duration of the dispute.
    pub bond: u128,
    /// Free-form reason given when raising.
    pub reason: String,
    /// Unix timestamp the dispute was raised.
    pub raised_at: u64,
    /// End of the commit-reveal voting window.
    pub voting_ends_at: u64,
    /// Current status.
    pub status: DisputeStatus,
    /// Revealed votes for the contribution being valid.
    pub valid_votes: u32,
    /// Revealed votes for the contribution being invalid.
    pub invalid_votes: u32,
    /// Per-juror commitments, keyed by juror address.
    pub commitments: BTreeMap<Address, VoteCommitment>,
    /// Informational evidence log.
    pub evidence: Vec<Evidence>,
    /// Final ruling, set at resolution.
    pub ruling: Option<Ruling>,
}

impl Dispute {
    /// Constructs a dispute in `Pending` status. The resolver opens voting
    /// only after the bond transfer and contribution flagging succeed.
    #[must_use]
    pub fn new(
        contribution_id: ContributionId,
        disputer: Address,
        bond: u128,
        reason: String,
        raised_at: u64,
    ) -> Self {
        Self {
            contribution_id,
            disputer,
            bond,
            reason,
            raised_at,
            voting_ends_at: voting_end_time(raised_at),
            status: DisputeStatus::Pending,
            valid_votes: 0,
            invalid_votes: 0,
            commitments: BTreeMap::new(),
            evidence: Vec::new(),
            ruling: None,
        }
    }

    /// Transition: Pending → Voting. No-op unless status is `Pending`.
    pub fn open_voting(&mut self) {
        if self.status != DisputeStatus::Pending {
            return;
        }
        self.status = DisputeStatus::Voting;
    }

    /// Whether the voting window is still open at `now`.
    #[must_use]
    #[inline]
    pub fn voting_open(&self, now: u64) -> bool {
        self.status == DisputeStatus::Voting && now < self.voting_ends_at
    }

    /// Whether the dispute can be resolved at `now` (window closed, still
    /// in `Voting`).
    #[must_use]
    #[inline]
    pub fn resolvable(&self, now: u64) -> bool {
        self.status == DisputeStatus::Voting && now >= self.voting_ends_at
    }

    /// Total revealed votes.
    #[must_use]
    pub fn revealed_count(&self) -> u32 {
        self.valid_votes + self.invalid_votes
    }

    /// Computes the ruling from the current tallies.
    ///
    /// Below [`MIN_JURORS`] revealed votes the ruling is VALID (apathy
    /// rule). Otherwise VALID wins ties.
    #[must_use]
    pub fn compute_ruling(&self) -> Ruling {
        if self.revealed_count() < MIN_JURORS {
            return Ruling::Valid;
        }
        if self.valid_votes >= self.invalid_votes {
            Ruling::Valid
        } else {
            Ruling::Invalid
        }
    }

    /// Transition: Voting → Resolved with `ruling`. No-op unless status is
    /// `Voting`.
    pub fn mark_resolved(&mut self, ruling: Ruling) {
        if self.status != DisputeStatus::Voting {
            return;
        }
        self.status = DisputeStatus::Resolved;
        self.ruling = Some(ruling);
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
