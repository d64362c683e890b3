//! # Value Distributor
//!
//! The single choke point through which value enters or moves through the
//! ledger. Every settlement — whether minted for a finalized contribution
//! or routed from an access payment — is split by the fixed schedule:
//!
//! | Leg | Share | Recipient |
//! |-----|-------|-----------|
//! | worker | 70% | the contribution worker / subject recipient |
//! | building | 10% | the building's registered wallet / subject recipient |
//! | maintainer | 10% | registry-resolved maintainer |
//! | treasury | 10% + remainder | registry-resolved treasury |
//!
//! The distributor enforces the emergency pause on both paths and the
//! per-subject daily mint caps on the mint path only. All checks run
//! before the first credit, so a rejected distribution leaves the store
//! untouched.

use thiserror::Error;
use tracing::{debug, info};

use provenet_common::constants::day_index;
use provenet_common::error::ErrorKind;
use provenet_common::{Address, Payout, SubjectId};

use crate::registry::Role;
use crate::state::{authorize, AuthError, Capability, DailyUsage, LedgerState};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// Distribution failures. None of these leave a partial split behind.
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("distribution is paused")]
    Paused,

    #[error("building {subject} has no registered wallet")]
    UnknownBuilding { subject: String },

    #[error("daily cap exceeded for {scope}: cap {cap}, used {used}, requested {requested}")]
    DailyCapExceeded {
        scope: &'static str,
        cap: u128,
        used: u128,
        requested: u128,
    },
}

impl DistributionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(e) => e.kind(),
            Self::Paused => ErrorKind::State,
            Self::UnknownBuilding { .. } => ErrorKind::Validation,
            Self::DailyCapExceeded { .. } => ErrorKind::State,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ADMIN CONTROLS
// ════════════════════════════════════════════════════════════════════════════════

/// Sets or clears the emergency pause. While paused, both the mint and
/// payment paths reject.
pub fn set_paused(
    state: &mut LedgerState,
    caller: Address,
    paused: bool,
) -> Result<(), DistributionError> {
    authorize(state, caller, Capability::Admin)?;
    state.paused = paused;
    info!(paused, "distribution pause updated");
    Ok(())
}

/// Configures the per-subject daily mint ceilings. `None` disables the
/// respective cap.
pub fn set_daily_caps(
    state: &mut LedgerState,
    caller: Address,
    worker_cap: Option<u128>,
    building_cap: Option<u128>,
) -> Result<(), DistributionError> {
    authorize(state, caller, Capability::Admin)?;
    state.params.worker_daily_cap = worker_cap;
    state.params.building_daily_cap = building_cap;
    info!(?worker_cap, ?building_cap, "daily caps updated");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// CAP ACCOUNTING
// ════════════════════════════════════════════════════════════════════════════════

/// Amount already counted against `usage` for the day containing `now`.
/// A counter from an earlier day reads as zero.
fn used_today(usage: Option<&DailyUsage>, today: u64) -> u128 {
    match usage {
        Some(u) if u.day == today => u.minted,
        _ => 0,
    }
}

fn check_cap(
    scope: &'static str,
    cap: Option<u128>,
    used: u128,
    requested: u128,
) -> Result<(), DistributionError> {
    if let Some(cap) = cap {
        if used.saturating_add(requested) > cap {
            return Err(DistributionError::DailyCapExceeded {
                scope,
                cap,
                used,
                requested,
            });
        }
    }
    Ok(())
}

fn record_usage(usage: &mut DailyUsage, today: u64, amount: u128) {
    if usage.day != today {
        usage.day = today;
        usage.minted = 0;
    }
    usage.minted = usage.minted.saturating_add(amount);
}

// ════════════════════════════════════════════════════════════════════════════════
// SETTLEMENT PATHS
// ════════════════════════════════════════════════════════════════════════════════

/// Mints `amount` split four ways for a finalized contribution.
///
/// Validation order: pause, building wallet lookup, both daily caps.
/// Only after every check passes are the four legs minted, so a cap
/// rejection on the building leaves the worker's counter untouched too.
pub(crate) fn distribute_mint(
    state: &mut LedgerState,
    worker: Address,
    building: SubjectId,
    amount: u128,
    now: u64,
) -> Result<Payout, DistributionError> {
    if state.paused {
        return Err(DistributionError::Paused);
    }
    let building_wallet =
        state
            .identity
            .building_wallet(&building)
            .ok_or_else(|| DistributionError::UnknownBuilding {
                subject: hex::encode(building),
            })?;
    let maintainer = state.addresses.resolve(Role::Maintainer);
    let treasury = state.addresses.resolve(Role::Treasury);

    let payout = Payout::split(amount);
    let today = day_index(now);

    // Caps are checked on the subject's own leg, both before the first
    // credit.
    check_cap(
        "worker",
        state.params.worker_daily_cap,
        used_today(state.worker_usage.get(&worker), today),
        payout.worker,
    )?;
    check_cap(
        "building",
        state.params.building_daily_cap,
        used_today(state.building_usage.get(&building), today),
        payout.building,
    )?;

    record_usage(state.worker_usage.entry(worker).or_default(), today, payout.worker);
    record_usage(
        state.building_usage.entry(building).or_default(),
        today,
        payout.building,
    );

    state.mint(worker, payout.worker);
    state.mint(building_wallet, payout.building);
    state.mint(maintainer, payout.maintainer);
    state.mint(treasury, payout.treasury);

    info!(
        worker = %worker,
        building = %hex::encode(building),
        amount,
        "contribution value minted"
    );
    Ok(payout)
}

/// Routes already-debited payment value by the same split. The worker
/// and building legs both go to `recipient` (the subject's registered
/// wallet); maintainer and treasury legs resolve through the registry.
///
/// No daily cap applies: payments move existing value, they do not mint.
pub(crate) fn distribute_payment(
    state: &mut LedgerState,
    recipient: Address,
    amount: u128,
) -> Result<Payout, DistributionError> {
    if state.paused {
        return Err(DistributionError::Paused);
    }
    let maintainer = state.addresses.resolve(Role::Maintainer);
    let treasury = state.addresses.resolve(Role::Treasury);

    let payout = Payout::split(amount);
    state.credit(recipient, payout.worker.saturating_add(payout.building));
    state.credit(maintainer, payout.maintainer);
    state.credit(treasury, payout.treasury);

    debug!(recipient = %recipient, amount, "payment routed");
    Ok(payout)
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
