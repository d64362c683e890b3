//! # Oracle Registration & Staking
//!
//! Oracles put funds at risk to earn the right to confirm contributions
//! and vote on disputes. Funds move between three places:
//!
//! ```text
//!   balance ──stake──▶ active ──request_withdrawal──▶ pending ──withdraw──▶ balance
//!                        │
//!                      slash──▶ platform treasury
//! ```
//!
//! Only the `active` bucket counts toward eligibility and only the
//! `active` bucket is slashable. A withdrawal request both drops
//! eligibility (if it takes active below the minimum) and shelters the
//! requested funds from future slashes; the seven-day delay exists so a
//! pending dispute can still be slashed out of whatever stayed active.
//!
//! Repeated withdrawal requests accumulate into the pending bucket and
//! restart the unlock clock for the whole bucket.

use thiserror::Error;
use tracing::{info, warn};

use provenet_common::constants::WITHDRAWAL_DELAY_SECS;
use provenet_common::crypto::address_from_pubkey;
use provenet_common::error::ErrorKind;
use provenet_common::{Address, OracleStake};

use crate::state::{authorize, AuthError, Capability, FundsError, LedgerState};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// Staking operation failures.
#[derive(Debug, Error)]
pub enum StakingError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Funds(#[from] FundsError),

    #[error("oracle {oracle} is already registered")]
    AlreadyRegistered { oracle: Address },

    #[error("{oracle} is not a registered oracle")]
    UnknownOracle { oracle: Address },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("requested {requested} exceeds active stake {active}")]
    InsufficientActive { requested: u128, active: u128 },

    #[error("no pending withdrawal")]
    NothingPending,

    #[error("withdrawal locked until {unlock_at}, now {now}")]
    WithdrawalLocked { unlock_at: u64, now: u64 },
}

impl StakingError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(e) => e.kind(),
            Self::Funds(e) => e.kind(),
            Self::AlreadyRegistered { .. } | Self::UnknownOracle { .. } => ErrorKind::State,
            Self::ZeroAmount => ErrorKind::Validation,
            Self::InsufficientActive { .. } | Self::NothingPending => ErrorKind::State,
            Self::WithdrawalLocked { .. } => ErrorKind::Temporal,
        }
    }
}

/// Why stake was slashed. Recorded in the log line only; the economic
/// effect is identical across reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashReason {
    /// Confirmed a contribution later ruled invalid.
    FalseAttestation,
    /// Misbehavior inside the dispute game itself.
    DisputeMisconduct,
    /// Prolonged failure to participate.
    Inactivity,
}

// ════════════════════════════════════════════════════════════════════════════════
// OPERATIONS
// ════════════════════════════════════════════════════════════════════════════════

/// Registers a new oracle under the address derived from `pubkey`.
///
/// Admin-gated. Returns the derived oracle address so the caller can
/// fund and stake it.
pub fn register_oracle(
    state: &mut LedgerState,
    caller: Address,
    pubkey: [u8; 32],
) -> Result<Address, StakingError> {
    authorize(state, caller, Capability::Admin)?;

    let oracle = address_from_pubkey(&pubkey);
    if state.oracles.contains_key(&oracle) {
        return Err(StakingError::AlreadyRegistered { oracle });
    }

    state.oracles.insert(oracle, pubkey);
    state.stakes.insert(oracle, OracleStake::default());
    info!(oracle = %oracle, "oracle registered");
    Ok(oracle)
}

/// Moves `amount` from the caller's balance into their active stake.
pub fn stake(state: &mut LedgerState, caller: Address, amount: u128) -> Result<(), StakingError> {
    if amount == 0 {
        return Err(StakingError::ZeroAmount);
    }
    if !state.oracles.contains_key(&caller) {
        return Err(StakingError::UnknownOracle { oracle: caller });
    }

    state.debit(caller, amount)?;
    let entry = state.stakes.entry(caller).or_default();
    entry.active = entry.active.saturating_add(amount);

    info!(oracle = %caller, amount, active = entry.active, "stake added");
    Ok(())
}

/// Moves `amount` from active stake into the pending-withdrawal bucket
/// and starts (or restarts) the unlock clock for the whole bucket.
pub fn request_withdrawal(
    state: &mut LedgerState,
    caller: Address,
    amount: u128,
    now: u64,
) -> Result<(), StakingError> {
    if amount == 0 {
        return Err(StakingError::ZeroAmount);
    }
    let entry = state
        .stakes
        .get_mut(&caller)
        .ok_or(StakingError::UnknownOracle { oracle: caller })?;
    if amount > entry.active {
        return Err(StakingError::InsufficientActive {
            requested: amount,
            active: entry.active,
        });
    }

    entry.active -= amount;
    entry.pending_withdrawal = entry.pending_withdrawal.saturating_add(amount);
    entry.unlock_at = now.saturating_add(WITHDRAWAL_DELAY_SECS);

    info!(
        oracle = %caller,
        amount,
        unlock_at = entry.unlock_at,
        "withdrawal requested"
    );
    Ok(())
}

/// Pays out the whole pending bucket once the unlock clock has elapsed.
pub fn withdraw(state: &mut LedgerState, caller: Address, now: u64) -> Result<u128, StakingError> {
    let entry = state
        .stakes
        .get_mut(&caller)
        .ok_or(StakingError::UnknownOracle { oracle: caller })?;
    if entry.pending_withdrawal == 0 {
        return Err(StakingError::NothingPending);
    }
    if now < entry.unlock_at {
        return Err(StakingError::WithdrawalLocked {
            unlock_at: entry.unlock_at,
            now,
        });
    }

    let amount = entry.pending_withdrawal;
    entry.pending_withdrawal = 0;
    state.credit(caller, amount);

    info!(oracle = %caller, amount, "withdrawal paid out");
    Ok(amount)
}

/// Confiscates up to `amount` from `oracle`'s active stake into the
/// platform treasury. Admin-gated.
///
/// The pending-withdrawal bucket is out of reach. Slashing more than the
/// active bucket holds clamps to the bucket rather than failing, so a
/// ruling can always be enforced. Returns the amount actually slashed.
pub fn slash(
    state: &mut LedgerState,
    caller: Address,
    oracle: Address,
    amount: u128,
    reason: SlashReason,
) -> Result<u128, StakingError> {
    authorize(state, caller, Capability::Admin)?;

    let entry = state
        .stakes
        .get_mut(&oracle)
        .ok_or(StakingError::UnknownOracle { oracle })?;

    let slashed = amount.min(entry.active);
    entry.active -= slashed;
    state.platform_treasury = state.platform_treasury.saturating_add(slashed);

    warn!(
        oracle = %oracle,
        requested = amount,
        slashed,
        ?reason,
        "oracle slashed"
    );
    Ok(slashed)
}

/// Whether `oracle` currently meets the minimum active-stake requirement.
#[must_use]
pub fn has_min_stake(state: &LedgerState, oracle: &Address) -> bool {
    let active = state.stakes.get(oracle).map_or(0, |s| s.active);
    state.params.stake_requirement.is_met(active)
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
