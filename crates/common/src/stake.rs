//! # Oracle Stake Buckets & Minimum-Stake Requirement
//!
//! Per-oracle staked funds are tracked in two independent buckets:
//!
//! | Bucket | Meaning |
//! |--------|---------|
//! | `active` | At-risk stake. Counts toward eligibility, slashable. |
//! | `pending_withdrawal` | Requested out, unlocking. Not eligible, not slashable. |
//!
//! The buckets are independent so that a withdrawal request cannot be
//! slashed while a slash can still reduce whatever remains active. Moving
//! funds between buckets is done by the state layer; this module only
//! defines the record and the pure predicates on it.
//!
//! [`StakeRequirement::check`] is the pure minimum-stake predicate gating
//! both contribution confirmation and dispute-vote eligibility.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DEFAULT_MIN_ORACLE_STAKE;
use crate::error::ErrorKind;

// ════════════════════════════════════════════════════════════════════════════════
// ORACLE STAKE
// ════════════════════════════════════════════════════════════════════════════════

/// One oracle's staked funds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleStake {
    /// At-risk stake counting toward minimum-stake eligibility.
    pub active: u128,
    /// Funds requested out, waiting for the unlock clock.
    pub pending_withdrawal: u128,
    /// Unix timestamp the pending bucket unlocks. Meaningless while
    /// `pending_withdrawal == 0`.
    pub unlock_at: u64,
}

impl OracleStake {
    /// Total funds attributed to the oracle across both buckets.
    #[must_use]
    pub fn total(&self) -> u128 {
        self.active.saturating_add(self.pending_withdrawal)
    }

    /// Whether the pending bucket can be withdrawn at `now`.
    #[must_use]
    #[inline]
    pub fn withdrawable(&self, now: u64) -> bool {
        self.pending_withdrawal > 0 && now >= self.unlock_at
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// STAKE REQUIREMENT
// ════════════════════════════════════════════════════════════════════════════════

/// Minimum active stake required for oracle eligibility.
///
/// The check is strict: zero stake is always rejected, then the active
/// amount must be at least the configured minimum. Only the `active`
/// bucket counts — requesting a withdrawal immediately drops eligibility
/// if it takes the active bucket below the minimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRequirement {
    /// Minimum active stake.
    pub min_stake: u128,
}

impl Default for StakeRequirement {
    fn default() -> Self {
        Self {
            min_stake: DEFAULT_MIN_ORACLE_STAKE,
        }
    }
}

impl StakeRequirement {
    /// Validates that `active_stake` meets the minimum.
    ///
    /// Pure function: deterministic, no side effects.
    pub fn check(&self, active_stake: u128) -> Result<(), StakeError> {
        if active_stake == 0 {
            return Err(StakeError::ZeroStake);
        }
        if active_stake < self.min_stake {
            return Err(StakeError::InsufficientStake {
                required: self.min_stake,
                actual: active_stake,
            });
        }
        Ok(())
    }

    /// Boolean form of [`check`](Self::check).
    #[must_use]
    pub fn is_met(&self, active_stake: u128) -> bool {
        self.check(active_stake).is_ok()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// STAKE ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Stake verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeError {
    /// Active stake is exactly zero.
    ZeroStake,
    /// Active stake is non-zero but below the minimum.
    InsufficientStake {
        /// Minimum required.
        required: u128,
        /// Actual active stake.
        actual: u128,
    },
}

impl StakeError {
    /// Coarse classification. Stake gates are authorization failures.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Authorization
    }
}

impl fmt::Display for StakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeError::ZeroStake => write!(f, "stake is zero: minimum stake required"),
            StakeError::InsufficientStake { required, actual } => {
                write!(f, "insufficient stake: required {}, actual {}", required, actual)
            }
        }
    }
}

impl std::error::Error for StakeError {}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_minimum_matches_constant() {
        let req = StakeRequirement::default();
        assert_eq!(req.min_stake, DEFAULT_MIN_ORACLE_STAKE);
    }

    #[test]
    fn zero_stake_rejected_before_insufficient() {
        let req = StakeRequirement::default();
        assert_eq!(req.check(0), Err(StakeError::ZeroStake));
    }

    #[test]
    fn below_minimum_rejected_with_amounts() {
        let req = StakeRequirement { min_stake: 500 };
        assert_eq!(
            req.check(499),
            Err(StakeError::InsufficientStake {
                required: 500,
                actual: 499,
            })
        );
    }

    #[test]
    fn exact_minimum_passes() {
        let req = StakeRequirement { min_stake: 500 };
        assert_eq!(req.check(500), Ok(()));
        assert!(req.is_met(500));
    }

    #[test]
    fn above_minimum_passes() {
        let req = StakeRequirement { min_stake: 500 };
        assert_eq!(req.check(u128::MAX), Ok(()));
    }

    #[test]
    fn total_spans_both_buckets() {
        let s = OracleStake {
            active: 400,
            pending_withdrawal: 600,
            unlock_at: 0,
        };
        assert_eq!(s.total(), 1_000);
    }

    #[test]
    fn withdrawable_requires_pending_and_unlock() {
        let s = OracleStake {
            active: 0,
            pending_withdrawal: 600,
            unlock_at: 1_000,
        };
        assert!(!s.withdrawable(999));
        assert!(s.withdrawable(1_000));
        assert!(s.withdrawable(1_001));

        let empty = OracleStake::default();
        assert!(!empty.withdrawable(u64::MAX));
    }

    #[test]
    fn stake_error_display() {
        let err = StakeError::InsufficientStake {
            required: 500,
            actual: 400,
        };
        assert_eq!(format!("{}", err), "insufficient stake: required 500, actual 400");
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn oracle_stake_serde_roundtrip() {
        let s = OracleStake {
            active: 1_000,
            pending_withdrawal: 250,
            unlock_at: 1_700_000_000,
        };
        let json = serde_json::to_string(&s).expect("serialize");
        let back: OracleStake = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(s, back);
    }
}
