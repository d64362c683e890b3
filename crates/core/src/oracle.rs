//! # Oracle Consensus Operations
//!
//! The threshold-attestation lifecycle of a contribution claim:
//!
//! 1. **Propose / confirm.** A staked oracle presents a claim with a
//!    signed, fresh proof. The first attestation creates the record and
//!    binds the proof hash; later attestations for the same derived id
//!    must carry the identical hash and add the oracle to the
//!    confirmation set. Propose and confirm are the same entry point.
//! 2. **Finalize.** Permissionless. Once the record has quorum, the
//!    challenge delay has elapsed, and no dispute is pending, value is
//!    minted by the distributor split and the record goes terminal.
//! 3. **Dispute flag / ruling.** A flagged record cannot finalize. A
//!    ruling either clears the flag (valid) or voids the record
//!    (invalid).
//!
//! Every operation validates fully before its first mutation.

use thiserror::Error;
use tracing::{info, warn};

use provenet_common::constants::{finalization_eligible_time, MIN_CONFIRMATIONS};
use provenet_common::contribution::derive_contribution_id;
use provenet_common::error::ErrorKind;
use provenet_common::stake::StakeError;
use provenet_common::types::short_id;
use provenet_common::{
    Address, Contribution, ContributionId, ContributionProof, ContributionStatus, DisputeStatus,
    Payout, SubjectId,
};

use crate::distributor::{self, DistributionError};
use crate::state::{authorize, AuthError, Capability, LedgerState};
use crate::verifier::{verify_attestation, VerifyError};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// Attestation-lifecycle failures.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Stake(#[from] StakeError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("worker {worker} is not active")]
    InactiveWorker { worker: Address },

    #[error("building {subject} is not registered")]
    UnregisteredBuilding { subject: String },

    #[error("no contribution {id}")]
    UnknownContribution { id: String },

    #[error("contribution is {status:?}, no further transitions")]
    AlreadyTerminal { status: ContributionStatus },

    #[error("contribution is under dispute")]
    Disputed,

    #[error("contribution is not under dispute")]
    NotDisputed,

    #[error("an open dispute game holds a bond for this contribution")]
    DisputeGameOpen,

    #[error("proof hash does not match the bound proof")]
    ProofMismatch,

    #[error("oracle {oracle} already confirmed this contribution")]
    AlreadyConfirmed { oracle: Address },

    #[error("proof already bound to contribution {bound_to}")]
    ProofAlreadyUsed { bound_to: String },

    #[error("quorum not met: {confirmations} of {required} confirmations")]
    QuorumNotMet { confirmations: u32, required: u32 },

    #[error("finalization delay not elapsed: eligible at {eligible_at}, now {now}")]
    DelayNotElapsed { eligible_at: u64, now: u64 },
}

impl OracleError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(e) => e.kind(),
            Self::Stake(e) => e.kind(),
            Self::Verify(e) => e.kind(),
            Self::Distribution(e) => e.kind(),
            Self::ZeroAmount => ErrorKind::Validation,
            Self::InactiveWorker { .. } | Self::UnregisteredBuilding { .. } => ErrorKind::Validation,
            Self::UnknownContribution { .. }
            | Self::AlreadyTerminal { .. }
            | Self::Disputed
            | Self::NotDisputed
            | Self::DisputeGameOpen
            | Self::AlreadyConfirmed { .. }
            | Self::ProofAlreadyUsed { .. }
            | Self::QuorumNotMet { .. } => ErrorKind::State,
            Self::ProofMismatch => ErrorKind::Validation,
            Self::DelayNotElapsed { .. } => ErrorKind::Temporal,
        }
    }
}

/// Result of a propose/confirm call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposeOutcome {
    /// Derived record id the attestation landed on.
    pub contribution_id: ContributionId,
    /// Confirmation count after this attestation.
    pub confirmations: u32,
    /// `true` if this attestation created the record.
    pub created: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// PROPOSE / CONFIRM
// ════════════════════════════════════════════════════════════════════════════════

/// Attests to a contribution claim, creating the record on first
/// attestation and adding a confirmation on subsequent ones.
///
/// ## Validation order
///
/// 1. Non-zero amount.
/// 2. Caller is a registered oracle meeting the minimum stake.
/// 3. The proof is well-formed, fresh, and signed by the caller's key.
/// 4. The worker is active and the building registered.
/// 5. Record-level checks: terminal / disputed / proof-binding /
///    duplicate-confirmer on an existing record, proof-replay on a new
///    one.
#[allow(clippy::too_many_arguments)]
pub fn propose(
    state: &mut LedgerState,
    caller: Address,
    building: SubjectId,
    worker: Address,
    amount: u128,
    proof: &ContributionProof,
    signature: &[u8],
    now: u64,
) -> Result<ProposeOutcome, OracleError> {
    if amount == 0 {
        return Err(OracleError::ZeroAmount);
    }
    authorize(state, caller, Capability::Oracle)?;
    let pubkey = state.oracles[&caller];

    let active = state.stakes.get(&caller).map_or(0, |s| s.active);
    state.params.stake_requirement.check(active)?;

    verify_attestation(&pubkey, proof, signature, now)?;

    if !state.identity.is_worker_active(&worker) {
        return Err(OracleError::InactiveWorker { worker });
    }
    if !state.identity.is_building_registered(&building) {
        return Err(OracleError::UnregisteredBuilding {
            subject: hex::encode(building),
        });
    }

    let id = derive_contribution_id(&building, &worker, amount);
    let proof_hash = proof.proof_hash();

    if let Some(record) = state.contributions.get_mut(&id) {
        // Confirmation of an existing record.
        if record.status.is_terminal() {
            return Err(OracleError::AlreadyTerminal {
                status: record.status,
            });
        }
        if record.disputed {
            return Err(OracleError::Disputed);
        }
        if record.proof_hash != proof_hash {
            warn!(
                id = %short_id(&id),
                oracle = %caller,
                "confirmation carried a different proof hash"
            );
            return Err(OracleError::ProofMismatch);
        }
        if !record.confirmations.insert(caller) {
            return Err(OracleError::AlreadyConfirmed { oracle: caller });
        }
        let confirmations = record.confirmation_count();
        info!(
            id = %short_id(&id),
            oracle = %caller,
            confirmations,
            "contribution confirmed"
        );
        return Ok(ProposeOutcome {
            contribution_id: id,
            confirmations,
            created: false,
        });
    }

    // First attestation: the proof must never have backed another record.
    if let Some(bound_to) = state.used_proofs.get(&proof_hash) {
        return Err(OracleError::ProofAlreadyUsed {
            bound_to: short_id(bound_to),
        });
    }

    let mut record = Contribution::new(id, worker, building, amount, proof_hash, now);
    record.confirmations.insert(caller);
    state.contributions.insert(id, record);
    state.used_proofs.insert(proof_hash, id);

    info!(
        id = %short_id(&id),
        oracle = %caller,
        worker = %worker,
        amount,
        "contribution proposed"
    );
    Ok(ProposeOutcome {
        contribution_id: id,
        confirmations: 1,
        created: true,
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// FINALIZE
// ════════════════════════════════════════════════════════════════════════════════

/// Finalizes an eligible contribution, minting its settlement split.
///
/// Permissionless: eligibility is a property of the record and the
/// clock, not the caller. Idempotence comes from the terminal-state
/// check, not from the caller behaving.
pub fn finalize(
    state: &mut LedgerState,
    id: ContributionId,
    now: u64,
) -> Result<Payout, OracleError> {
    let record = state
        .contributions
        .get(&id)
        .ok_or_else(|| OracleError::UnknownContribution { id: short_id(&id) })?;

    if record.status.is_terminal() {
        return Err(OracleError::AlreadyTerminal {
            status: record.status,
        });
    }
    if record.disputed {
        return Err(OracleError::Disputed);
    }
    if !record.has_quorum() {
        return Err(OracleError::QuorumNotMet {
            confirmations: record.confirmation_count(),
            required: MIN_CONFIRMATIONS,
        });
    }
    if !record.delay_elapsed(now) {
        return Err(OracleError::DelayNotElapsed {
            eligible_at: finalization_eligible_time(record.proposed_at),
            now,
        });
    }

    let (worker, building, amount) = (record.worker, record.building, record.amount);

    // The distributor runs its own pause/cap validation before the first
    // credit, so a rejection here leaves the record Pending.
    let payout = distributor::distribute_mint(state, worker, building, amount, now)?;

    let record = state
        .contributions
        .get_mut(&id)
        .ok_or_else(|| OracleError::UnknownContribution { id: short_id(&id) })?;
    record.mark_finalized();

    info!(id = %short_id(&id), amount, "contribution finalized");
    Ok(payout)
}

// ════════════════════════════════════════════════════════════════════════════════
// DISPUTE FLAG & RULING
// ════════════════════════════════════════════════════════════════════════════════

/// Flags a contribution as disputed, blocking finalization until a
/// ruling. Open to the admin and to registered oracles; the bonded
/// challenge path goes through the dispute game instead.
pub fn flag_dispute(
    state: &mut LedgerState,
    caller: Address,
    id: ContributionId,
) -> Result<(), OracleError> {
    if authorize(state, caller, Capability::Admin).is_err() {
        authorize(state, caller, Capability::Oracle)?;
    }
    flag_disputed(state, id)
}

/// Crate-internal flag hook: validates the record is Pending and not
/// already flagged, then sets the flag.
pub(crate) fn flag_disputed(state: &mut LedgerState, id: ContributionId) -> Result<(), OracleError> {
    let record = state
        .contributions
        .get_mut(&id)
        .ok_or_else(|| OracleError::UnknownContribution { id: short_id(&id) })?;
    if record.status.is_terminal() {
        return Err(OracleError::AlreadyTerminal {
            status: record.status,
        });
    }
    if record.disputed {
        return Err(OracleError::Disputed);
    }
    record.disputed = true;
    info!(id = %short_id(&id), "contribution flagged as disputed");
    Ok(())
}

/// Applies a ruling by the resolver authority directly.
///
/// Rejected while a commit-reveal dispute game is open for the id: the
/// game's own resolution settles the bond, and ruling past it would
/// strand that bond. Returns the payout if the ruling finalized the
/// record immediately.
pub fn resolve_dispute(
    state: &mut LedgerState,
    caller: Address,
    id: ContributionId,
    valid: bool,
    now: u64,
) -> Result<Option<Payout>, OracleError> {
    authorize(state, caller, Capability::Resolver)?;
    if let Some(dispute) = state.disputes.get(&id) {
        if dispute.status != DisputeStatus::Resolved {
            return Err(OracleError::DisputeGameOpen);
        }
    }
    apply_ruling(state, id, valid, now)
}

/// Crate-internal ruling hook shared by the resolver entry point and the
/// commit-reveal dispute game.
///
/// - **Valid**: clears the flag. If the record already has quorum and
///   the delay has elapsed it finalizes immediately (returning the
///   payout); otherwise it returns to the normal Pending lifecycle.
/// - **Invalid**: clears the flag and voids the record.
pub(crate) fn apply_ruling(
    state: &mut LedgerState,
    id: ContributionId,
    valid: bool,
    now: u64,
) -> Result<Option<Payout>, OracleError> {
    let record = state
        .contributions
        .get(&id)
        .ok_or_else(|| OracleError::UnknownContribution { id: short_id(&id) })?;
    if record.status.is_terminal() {
        return Err(OracleError::AlreadyTerminal {
            status: record.status,
        });
    }
    if !record.disputed {
        return Err(OracleError::NotDisputed);
    }

    if !valid {
        let record = state
            .contributions
            .get_mut(&id)
            .ok_or_else(|| OracleError::UnknownContribution { id: short_id(&id) })?;
        record.disputed = false;
        record.mark_voided();
        warn!(id = %short_id(&id), "contribution voided by ruling");
        return Ok(None);
    }

    // Mint first: the distributor validates its own preconditions, so a
    // pause or cap rejection aborts before the record is touched.
    let settle = record.has_quorum() && record.delay_elapsed(now);
    let (worker, building, amount) = (record.worker, record.building, record.amount);

    let payout = if settle {
        Some(distributor::distribute_mint(state, worker, building, amount, now)?)
    } else {
        None
    };

    let record = state
        .contributions
        .get_mut(&id)
        .ok_or_else(|| OracleError::UnknownContribution { id: short_id(&id) })?;
    record.disputed = false;
    if settle {
        record.mark_finalized();
        info!(id = %short_id(&id), "contribution upheld and finalized");
    } else {
        info!(id = %short_id(&id), "contribution upheld, returned to pending");
    }
    Ok(payout)
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
