//! # Dispute Game Operations
//!
//! Bond-gated, commit-reveal challenge against a pending contribution:
//!
//! 1. **Raise.** Anyone with the bond can challenge. The contribution is
//!    flagged (blocking finalization), the bond is debited, and a 48h
//!    voting window opens. One dispute per contribution, ever.
//! 2. **Commit.** Staked oracles submit a hash commitment to their vote.
//!    One commitment per juror, only while the window is open.
//! 3. **Reveal.** Jurors open their commitment with the vote and salt;
//!    the hash must match. Tallies only count revealed votes.
//! 4. **Resolve.** Permissionless once the window closes. The ruling is
//!    computed from the tallies (apathy and ties favor VALID), the bond
//!    is settled, and the ruling is pushed into the contribution
//!    lifecycle.
//!
//! A VALID ruling forfeits the bond to the platform treasury; an INVALID
//! ruling returns it to the disputer.

use thiserror::Error;
use tracing::info;

use provenet_common::dispute::vote_commitment_hash;
use provenet_common::error::ErrorKind;
use provenet_common::types::short_id;
use provenet_common::{Address, ContributionId, Dispute, Evidence, Ruling, VoteCommitment};

use crate::oracle::{self, OracleError};
use crate::staking;
use crate::state::{FundsError, LedgerState};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// Dispute-game failures.
#[derive(Debug, Error)]
pub enum DisputeError {
    #[error(transparent)]
    Funds(#[from] FundsError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("contribution already has a dispute")]
    AlreadyDisputed,

    #[error("no dispute for contribution {id}")]
    UnknownDispute { id: String },

    #[error("voting window is not open")]
    VotingClosed,

    #[error("voting window has not closed yet: ends at {ends_at}, now {now}")]
    VotingStillOpen { ends_at: u64, now: u64 },

    #[error("juror {juror} does not meet the minimum stake")]
    IneligibleJuror { juror: Address },

    #[error("juror {juror} already committed")]
    AlreadyCommitted { juror: Address },

    #[error("juror {juror} has no commitment")]
    NoCommitment { juror: Address },

    #[error("juror {juror} already revealed")]
    AlreadyRevealed { juror: Address },

    #[error("reveal does not match the commitment")]
    CommitmentMismatch,

    #[error("evidence reference is empty")]
    EmptyEvidence,
}

impl DisputeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            // An uncovered bond is a balance failure, classified State
            // like every other debit in the ledger.
            Self::Funds(e) => e.kind(),
            Self::Oracle(e) => e.kind(),
            Self::AlreadyDisputed | Self::UnknownDispute { .. } => ErrorKind::State,
            Self::VotingClosed | Self::VotingStillOpen { .. } => ErrorKind::Temporal,
            Self::IneligibleJuror { .. } => ErrorKind::Authorization,
            Self::AlreadyCommitted { .. } | Self::NoCommitment { .. } | Self::AlreadyRevealed { .. } => {
                ErrorKind::State
            }
            Self::CommitmentMismatch | Self::EmptyEvidence => ErrorKind::Validation,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// RAISE
// ════════════════════════════════════════════════════════════════════════════════

/// Raises a dispute against a pending contribution.
///
/// All checks run before the first mutation: no prior dispute for the
/// id, the contribution is flaggable, and the caller can cover the bond.
/// Then, in order: flag the contribution, debit the bond, insert the
/// dispute with its voting window open.
pub fn raise_dispute(
    state: &mut LedgerState,
    caller: Address,
    id: ContributionId,
    reason: String,
    now: u64,
) -> Result<(), DisputeError> {
    if state.disputes.contains_key(&id) {
        return Err(DisputeError::AlreadyDisputed);
    }
    let bond = state.params.dispute_bond;
    let available = state.balance_of(&caller);
    if available < bond {
        return Err(DisputeError::Funds(FundsError::InsufficientBalance {
            account: caller,
            required: bond,
            available,
        }));
    }

    // Flagging validates the contribution exists, is Pending, and is not
    // already flagged.
    oracle::flag_disputed(state, id)?;
    state.debit(caller, bond)?;

    let mut dispute = Dispute::new(id, caller, bond, reason, now);
    dispute.open_voting();
    state.disputes.insert(id, dispute);

    info!(
        id = %short_id(&id),
        disputer = %caller,
        bond,
        "dispute raised"
    );
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// EVIDENCE
// ════════════════════════════════════════════════════════════════════════════════

/// Attaches an evidence reference to an open dispute. Informational
/// only; tallies never read it.
pub fn submit_evidence(
    state: &mut LedgerState,
    caller: Address,
    id: ContributionId,
    reference: String,
    now: u64,
) -> Result<(), DisputeError> {
    if reference.is_empty() {
        return Err(DisputeError::EmptyEvidence);
    }
    let dispute = state
        .disputes
        .get_mut(&id)
        .ok_or_else(|| DisputeError::UnknownDispute { id: short_id(&id) })?;
    if !dispute.voting_open(now) {
        return Err(DisputeError::VotingClosed);
    }

    dispute.evidence.push(Evidence {
        submitter: caller,
        reference,
        submitted_at: now,
    });
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// COMMIT / REVEAL
// ════════════════════════════════════════════════════════════════════════════════

/// Records a juror's hash commitment to their vote.
///
/// Jurors are staked oracles; the eligibility check uses the same
/// minimum-stake predicate as confirmation.
pub fn commit_vote(
    state: &mut LedgerState,
    caller: Address,
    id: ContributionId,
    commitment: [u8; 32],
    now: u64,
) -> Result<(), DisputeError> {
    if !staking::has_min_stake(state, &caller) {
        return Err(DisputeError::IneligibleJuror { juror: caller });
    }
    let dispute = state
        .disputes
        .get_mut(&id)
        .ok_or_else(|| DisputeError::UnknownDispute { id: short_id(&id) })?;
    if !dispute.voting_open(now) {
        return Err(DisputeError::VotingClosed);
    }
    if dispute.commitments.contains_key(&caller) {
        return Err(DisputeError::AlreadyCommitted { juror: caller });
    }

    dispute.commitments.insert(
        caller,
        VoteCommitment {
            committer: caller,
            commitment,
            revealed: false,
            vote: None,
        },
    );
    info!(id = %short_id(&id), juror = %caller, "vote committed");
    Ok(())
}

/// Opens a juror's commitment and tallies the vote.
///
/// The reveal must land inside the same voting window as the commit and
/// hash to the stored commitment.
pub fn reveal_vote(
    state: &mut LedgerState,
    caller: Address,
    id: ContributionId,
    vote: bool,
    salt: &[u8; 32],
    now: u64,
) -> Result<(), DisputeError> {
    let dispute = state
        .disputes
        .get_mut(&id)
        .ok_or_else(|| DisputeError::UnknownDispute { id: short_id(&id) })?;
    if !dispute.voting_open(now) {
        return Err(DisputeError::VotingClosed);
    }
    let entry = dispute
        .commitments
        .get_mut(&caller)
        .ok_or(DisputeError::NoCommitment { juror: caller })?;
    if entry.revealed {
        return Err(DisputeError::AlreadyRevealed { juror: caller });
    }
    if vote_commitment_hash(vote, salt) != entry.commitment {
        return Err(DisputeError::CommitmentMismatch);
    }

    entry.revealed = true;
    entry.vote = Some(vote);
    if vote {
        dispute.valid_votes += 1;
    } else {
        dispute.invalid_votes += 1;
    }

    info!(id = %short_id(&id), juror = %caller, vote, "vote revealed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// RESOLVE
// ════════════════════════════════════════════════════════════════════════════════

/// Resolves a dispute whose voting window has closed. Permissionless.
///
/// Settles the bond, applies the ruling to the contribution, and marks
/// the dispute Resolved. Returns the ruling.
pub fn resolve_dispute(
    state: &mut LedgerState,
    id: ContributionId,
    now: u64,
) -> Result<Ruling, DisputeError> {
    let dispute = state
        .disputes
        .get(&id)
        .ok_or_else(|| DisputeError::UnknownDispute { id: short_id(&id) })?;
    if !dispute.resolvable(now) {
        return Err(DisputeError::VotingStillOpen {
            ends_at: dispute.voting_ends_at,
            now,
        });
    }
    let ruling = dispute.compute_ruling();
    let (bond, disputer) = (dispute.bond, dispute.disputer);

    // The ruling mutates the contribution first; if that fails the
    // dispute stays resolvable and no funds have moved.
    oracle::apply_ruling(state, id, ruling == Ruling::Valid, now)?;

    match ruling {
        Ruling::Valid => {
            state.platform_treasury = state.platform_treasury.saturating_add(bond);
        }
        Ruling::Invalid => {
            state.credit(disputer, bond);
        }
    }

    if let Some(dispute) = state.disputes.get_mut(&id) {
        dispute.mark_resolved(ruling);
    }

    info!(id = %short_id(&id), ?ruling, "dispute resolved");
    Ok(ruling)
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use provenet_common::constants::{
        DEFAULT_MIN_ORACLE_STAKE, DISPUTE_BOND, VOTING_WINDOW_SECS,
    };
    use provenet_common::crypto::{generate_keypair_bytes, sign_message};
    use provenet_common::{ContributionProof, ContributionStatus, DisputeStatus, SubjectId};

    use crate::oracle::propose;

    const NOW: u64 = 1_700_000_000;
    const BUILDING: SubjectId = [0xB1; 32];
    const SALT: [u8; 32] = [0x55; 32];

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn admin() -> Address {
        addr(0xAD)
    }

    fn worker() -> Address {
        addr(0x07)
    }

    fn add_oracle(state: &mut LedgerState) -> (Vec<u8>, Address) {
        let keypair = generate_keypair_bytes();
        let pubkey: [u8; 32] = keypair[32..].try_into().expect("pubkey half");
        let address = staking::register_oracle(state, admin(), pubkey).expect("register");
        state.credit(address, DEFAULT_MIN_ORACLE_STAKE);
        staking::stake(state, address, DEFAULT_MIN_ORACLE_STAKE).expect("stake");
        (keypair, address)
    }

    /// State with a funded disputer, three staked oracle jurors, and one
    /// pending contribution with quorum.
    fn setup() -> (LedgerState, ContributionId, Address, Vec<Address>) {
        let mut state = LedgerState::new(admin(), addr(0x9E));
        state
            .identity
            .register_worker(admin(), worker())
            .expect("worker");
        state
            .identity
            .register_building(admin(), BUILDING, addr(0xB0))
            .expect("building");

        let mut jurors = Vec::new();
        let mut id = [0u8; 32];
        for i in 0..3 {
            let (keypair, address) = add_oracle(&mut state);
            jurors.push(address);
            if i < 2 {
                let proof = ContributionProof {
                    merkle_root: [0x10; 32],
                    location_hash: [0x11; 32],
                    building_hash: [0x12; 32],
                    timestamp: NOW,
                    data_size: 4_096,
                };
                let sig = sign_message(&keypair, &proof.proof_hash()).expect("sign");
                id = propose(
                    &mut state,
                    address,
                    BUILDING,
                    worker(),
                    1_000,
                    &proof,
                    &sig,
                    NOW,
                )
                .expect("attest")
                .contribution_id;
            }
        }

        let disputer = addr(0xD1);
        state.credit(disputer, 5_000);
        (state, id, disputer, jurors)
    }

    #[test]
    fn raise_flags_contribution_and_takes_bond() {
        let (mut state, id, disputer, _) = setup();
        raise_dispute(&mut state, disputer, id, "forged proof".into(), NOW).expect("raise");

        assert!(state.contributions[&id].disputed);
        assert_eq!(state.balance_of(&disputer), 5_000 - DISPUTE_BOND);
        let d = &state.disputes[&id];
        assert_eq!(d.status, DisputeStatus::Voting);
        assert_eq!(d.voting_ends_at, NOW + VOTING_WINDOW_SECS);
    }

    #[test]
    fn raise_without_bond_leaves_contribution_unflagged() {
        let (mut state, id, _, _) = setup();
        let poor = addr(0xEE);
        state.credit(poor, DISPUTE_BOND - 1);

        let err = raise_dispute(&mut state, poor, id, "r".into(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(!state.contributions[&id].disputed);
        assert!(state.disputes.is_empty());
    }

    #[test]
    fn one_dispute_per_contribution_ever() {
        let (mut state, id, disputer, _) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");
        resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).expect("resolve");

        // Even after resolution (which cleared the flag), no second round.
        let err = raise_dispute(&mut state, disputer, id, "again".into(), NOW + VOTING_WINDOW_SECS)
            .unwrap_err();
        assert!(matches!(err, DisputeError::AlreadyDisputed));
    }

    #[test]
    fn commit_requires_stake_and_open_window() {
        let (mut state, id, disputer, jurors) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        let err = commit_vote(&mut state, addr(0x99), id, [0u8; 32], NOW).unwrap_err();
        assert!(matches!(err, DisputeError::IneligibleJuror { .. }));

        let c = vote_commitment_hash(true, &SALT);
        commit_vote(&mut state, jurors[0], id, c, NOW + 10).expect("commit");
        assert!(matches!(
            commit_vote(&mut state, jurors[0], id, c, NOW + 11),
            Err(DisputeError::AlreadyCommitted { .. })
        ));
        assert!(matches!(
            commit_vote(&mut state, jurors[1], id, c, NOW + VOTING_WINDOW_SECS),
            Err(DisputeError::VotingClosed)
        ));
    }

    #[test]
    fn reveal_validates_commitment_and_tallies() {
        let (mut state, id, disputer, jurors) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        let c = vote_commitment_hash(false, &SALT);
        commit_vote(&mut state, jurors[0], id, c, NOW + 10).expect("commit");

        // Wrong vote, wrong salt, missing commitment.
        assert!(matches!(
            reveal_vote(&mut state, jurors[0], id, true, &SALT, NOW + 20),
            Err(DisputeError::CommitmentMismatch)
        ));
        assert!(matches!(
            reveal_vote(&mut state, jurors[0], id, false, &[0x56; 32], NOW + 20),
            Err(DisputeError::CommitmentMismatch)
        ));
        assert!(matches!(
            reveal_vote(&mut state, jurors[1], id, false, &SALT, NOW + 20),
            Err(DisputeError::NoCommitment { .. })
        ));

        reveal_vote(&mut state, jurors[0], id, false, &SALT, NOW + 20).expect("reveal");
        assert_eq!(state.disputes[&id].invalid_votes, 1);
        assert!(matches!(
            reveal_vote(&mut state, jurors[0], id, false, &SALT, NOW + 21),
            Err(DisputeError::AlreadyRevealed { .. })
        ));
    }

    #[test]
    fn apathy_resolves_valid_and_forfeits_bond() {
        let (mut state, id, disputer, _) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        let treasury_before = state.platform_treasury;
        let ruling = resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).expect("resolve");
        assert_eq!(ruling, Ruling::Valid);
        assert_eq!(state.platform_treasury, treasury_before + DISPUTE_BOND);
        assert_eq!(state.balance_of(&disputer), 5_000 - DISPUTE_BOND);

        // Upheld past the delay: ruling finalized the record.
        assert_eq!(
            state.contributions[&id].status,
            ContributionStatus::Finalized
        );
        assert_eq!(state.disputes[&id].status, DisputeStatus::Resolved);
    }

    #[test]
    fn majority_invalid_voids_and_returns_bond() {
        let (mut state, id, disputer, jurors) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        for juror in &jurors {
            let c = vote_commitment_hash(false, &SALT);
            commit_vote(&mut state, *juror, id, c, NOW + 10).expect("commit");
            reveal_vote(&mut state, *juror, id, false, &SALT, NOW + 20).expect("reveal");
        }

        let ruling = resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).expect("resolve");
        assert_eq!(ruling, Ruling::Invalid);
        assert_eq!(state.balance_of(&disputer), 5_000);
        assert_eq!(state.contributions[&id].status, ContributionStatus::Voided);
        assert_eq!(state.total_minted, 0);
    }

    #[test]
    fn ties_rule_valid() {
        let (mut state, id, disputer, jurors) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        // Need a fourth juror for a 2-2 tie at quorum.
        let (_, extra) = add_oracle(&mut state);
        let voters = [jurors[0], jurors[1], jurors[2], extra];
        for (i, juror) in voters.iter().enumerate() {
            let vote = i % 2 == 0;
            let c = vote_commitment_hash(vote, &SALT);
            commit_vote(&mut state, *juror, id, c, NOW + 10).expect("commit");
            reveal_vote(&mut state, *juror, id, vote, &SALT, NOW + 20).expect("reveal");
        }

        let ruling = resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).expect("resolve");
        assert_eq!(ruling, Ruling::Valid);
    }

    #[test]
    fn unrevealed_commitments_do_not_count() {
        let (mut state, id, disputer, jurors) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        // Three commitments, only two reveals: below the juror floor, so
        // the apathy rule applies even though both reveals say invalid.
        for juror in &jurors {
            let c = vote_commitment_hash(false, &SALT);
            commit_vote(&mut state, *juror, id, c, NOW + 10).expect("commit");
        }
        reveal_vote(&mut state, jurors[0], id, false, &SALT, NOW + 20).expect("reveal");
        reveal_vote(&mut state, jurors[1], id, false, &SALT, NOW + 20).expect("reveal");

        let ruling = resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).expect("resolve");
        assert_eq!(ruling, Ruling::Valid);
    }

    #[test]
    fn resolve_rejects_while_window_open_and_after_resolution() {
        let (mut state, id, disputer, _) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        let err = resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS - 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Temporal);

        resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).expect("resolve");
        assert!(resolve_dispute(&mut state, id, NOW + VOTING_WINDOW_SECS).is_err());
    }

    #[test]
    fn evidence_attaches_only_while_voting() {
        let (mut state, id, disputer, _) = setup();
        raise_dispute(&mut state, disputer, id, "r".into(), NOW).expect("raise");

        submit_evidence(&mut state, disputer, id, "ipfs://cafe".into(), NOW + 5).expect("evidence");
        assert_eq!(state.disputes[&id].evidence.len(), 1);

        assert!(matches!(
            submit_evidence(&mut state, disputer, id, "".into(), NOW + 6),
            Err(DisputeError::EmptyEvidence)
        ));
        assert!(matches!(
            submit_evidence(&mut state, disputer, id, "late".into(), NOW + VOTING_WINDOW_SECS),
            Err(DisputeError::VotingClosed)
        ));
    }
}
