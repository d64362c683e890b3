//! # Economic Constants & Timing Windows
//!
//! Single source of truth for economic and timing constants used across
//! the provenet crates. Both the state layer and external tooling MUST
//! reference these constants instead of redefining them.

// ════════════════════════════════════════════════════════════════════════════════
// SETTLEMENT SPLIT
// ════════════════════════════════════════════════════════════════════════════════

/// Share of settled value paid to the contributing worker (70%).
pub const SHARE_WORKER_PERCENT: u128 = 70;

/// Share of settled value paid to the building owner (10%).
pub const SHARE_BUILDING_PERCENT: u128 = 10;

/// Share of settled value paid to the platform maintainer (10%).
pub const SHARE_MAINTAINER_PERCENT: u128 = 10;

/// Share of settled value paid to the treasury (10%).
///
/// The treasury leg also absorbs the integer-division remainder, so the
/// four shares always sum exactly to the settled amount.
pub const SHARE_TREASURY_PERCENT: u128 = 10;

/// Total split percentage. MUST always be 100.
pub const SHARE_TOTAL_PERCENT: u128 = 100;

// ════════════════════════════════════════════════════════════════════════════════
// CONTRIBUTION LIFECYCLE
// ════════════════════════════════════════════════════════════════════════════════

/// Distinct staked oracles required before a contribution becomes eligible.
pub const MIN_CONFIRMATIONS: u32 = 2;

/// Mandatory challenge window between quorum and finalization (24 hours).
pub const FINALIZATION_DELAY_SECS: u64 = 86_400;

/// Maximum age of a contribution proof at confirmation time (1 hour).
pub const MAX_PROOF_AGE_SECS: u64 = 3_600;

// ════════════════════════════════════════════════════════════════════════════════
// STAKING
// ════════════════════════════════════════════════════════════════════════════════

/// Default minimum active stake for confirmation and dispute-vote
/// eligibility.
pub const DEFAULT_MIN_ORACLE_STAKE: u128 = 500;

/// Delay between a withdrawal request and the funds unlocking (7 days).
pub const WITHDRAWAL_DELAY_SECS: u64 = 604_800;

// ════════════════════════════════════════════════════════════════════════════════
// DISPUTES
// ════════════════════════════════════════════════════════════════════════════════

/// Fixed bond transferred from a disputer when raising a dispute.
pub const DISPUTE_BOND: u128 = 1_000;

/// Commit-reveal voting window after a dispute is raised (48 hours).
pub const VOTING_WINDOW_SECS: u64 = 172_800;

/// Minimum revealed votes for a dispute ruling to follow the tally.
///
/// Below this count the ruling defaults to VALID: apathy is treated as
/// trusting the original contribution, so a dispute cannot be stalled
/// into an automatic win by simply not voting.
pub const MIN_JURORS: u32 = 3;

// ════════════════════════════════════════════════════════════════════════════════
// PAYMENTS
// ════════════════════════════════════════════════════════════════════════════════

/// Price used for a subject with no stored and no scheduled price.
pub const DEFAULT_ACCESS_PRICE: u128 = 10;

/// Delay before a scheduled price change takes effect (7 days).
pub const PRICE_UPDATE_DELAY_SECS: u64 = 604_800;

// ════════════════════════════════════════════════════════════════════════════════
// DAILY CAPS
// ════════════════════════════════════════════════════════════════════════════════

/// Seconds per calendar day, used for day-index bucketing of cap usage.
pub const SECS_PER_DAY: u64 = 86_400;

// ════════════════════════════════════════════════════════════════════════════════
// FUNCTIONS
// ════════════════════════════════════════════════════════════════════════════════

/// Day index of a unix timestamp. Cap usage counters reset when this
/// crosses a boundary.
#[must_use]
#[inline]
pub const fn day_index(now: u64) -> u64 {
    now / SECS_PER_DAY
}

/// Earliest time a contribution proposed at `proposed_at` may finalize.
///
/// Returns `proposed_at` on overflow (does not panic).
#[must_use]
#[inline]
pub const fn finalization_eligible_time(proposed_at: u64) -> u64 {
    match proposed_at.checked_add(FINALIZATION_DELAY_SECS) {
        Some(t) => t,
        None => proposed_at,
    }
}

/// Whether a proof timestamped `proof_ts` is stale at `now`.
///
/// Future-dated proofs are not stale; they are rejected separately by
/// shape validation. On overflow of `proof_ts + MAX_PROOF_AGE_SECS` the
/// proof is treated as stale.
#[must_use]
#[inline]
pub const fn is_proof_stale(proof_ts: u64, now: u64) -> bool {
    match proof_ts.checked_add(MAX_PROOF_AGE_SECS) {
        Some(expiry) => now > expiry,
        None => true,
    }
}

/// End of the commit-reveal voting window for a dispute raised at `start`.
///
/// Returns `start` on overflow (does not panic).
#[must_use]
#[inline]
pub const fn voting_end_time(start: u64) -> u64 {
    match start.checked_add(VOTING_WINDOW_SECS) {
        Some(end) => end,
        None => start,
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
