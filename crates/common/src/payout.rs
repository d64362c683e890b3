//! # Settlement Split
//!
//! The fixed 70/10/10/10 distribution of settled value among the worker,
//! the building owner, the platform maintainer, and the treasury.
//!
//! ## Economic Invariant
//!
//! [`Payout::split`] guarantees:
//!
//! `worker + building + maintainer + treasury == amount`
//!
//! The treasury leg absorbs the integer-division remainder, so no value is
//! created or destroyed by rounding.

use serde::{Deserialize, Serialize};

use crate::constants::{
    SHARE_BUILDING_PERCENT, SHARE_MAINTAINER_PERCENT, SHARE_TOTAL_PERCENT, SHARE_WORKER_PERCENT,
};

/// Result of splitting a settled amount into its four legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Worker share (70%).
    pub worker: u128,
    /// Building-owner share (10%).
    pub building: u128,
    /// Platform maintainer share (10%).
    pub maintainer: u128,
    /// Treasury share (10% plus any rounding remainder).
    pub treasury: u128,
}

impl Payout {
    /// Splits `amount` 70/10/10/10 with the remainder assigned to the
    /// treasury leg.
    ///
    /// This function is PURE — no mutations, no side effects, and the four
    /// legs always sum exactly to `amount`, over the full `u128` range.
    #[must_use]
    pub fn split(amount: u128) -> Self {
        let worker = share_of(amount, SHARE_WORKER_PERCENT);
        let building = share_of(amount, SHARE_BUILDING_PERCENT);
        let maintainer = share_of(amount, SHARE_MAINTAINER_PERCENT);
        // Treasury takes the remainder so the legs sum exactly to amount.
        let treasury = amount - worker - building - maintainer;

        Self {
            worker,
            building,
            maintainer,
            treasury,
        }
    }

    /// Sum of all four legs. Always equals the split amount.
    #[must_use]
    pub fn total(&self) -> u128 {
        self.worker + self.building + self.maintainer + self.treasury
    }
}

/// `floor(amount * percent / 100)` without the intermediate product, so
/// the computation cannot overflow for any `amount`.
///
/// With `amount = 100q + r`: `floor(amount * p / 100) = p*q + floor(p*r / 100)`,
/// and `p*q <= p * (u128::MAX / 100)` stays in range for `p <= 100`.
#[inline]
const fn share_of(amount: u128, percent: u128) -> u128 {
    let quotient = amount / SHARE_TOTAL_PERCENT;
    let remainder = amount % SHARE_TOTAL_PERCENT;
    percent * quotient + percent * remainder / SHARE_TOTAL_PERCENT
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_of_100() {
        let p = Payout::split(100);
        assert_eq!(p.worker, 70);
        assert_eq!(p.building, 10);
        assert_eq!(p.maintainer, 10);
        assert_eq!(p.treasury, 10);
        assert_eq!(p.total(), 100);
    }

    #[test]
    fn split_of_zero() {
        let p = Payout::split(0);
        assert_eq!(p.total(), 0);
    }

    #[test]
    fn remainder_goes_to_treasury() {
        // 101: worker 70, building 10, maintainer 10, treasury 11.
        let p = Payout::split(101);
        assert_eq!(p.worker, 70);
        assert_eq!(p.building, 10);
        assert_eq!(p.maintainer, 10);
        assert_eq!(p.treasury, 11);
        assert_eq!(p.total(), 101);
    }

    #[test]
    fn conservation_over_awkward_amounts() {
        for amount in [1u128, 3, 7, 9, 13, 99, 101, 999, 1_001, 123_457] {
            let p = Payout::split(amount);
            assert_eq!(p.total(), amount, "value not conserved for {}", amount);
        }
    }

    #[test]
    fn conservation_at_extreme_amounts() {
        // The split must stay exact for the entire u128 range, including
        // amounts where a naive percentage multiply would overflow.
        for amount in [
            u128::MAX,
            u128::MAX - 1,
            u128::MAX / SHARE_TOTAL_PERCENT,
            u128::MAX / SHARE_TOTAL_PERCENT + 1,
        ] {
            let p = Payout::split(amount);
            assert_eq!(p.total(), amount, "value not conserved for {}", amount);
        }
    }

    #[test]
    fn max_amount_shares_are_proportional() {
        let p = Payout::split(u128::MAX);
        assert_eq!(p.worker, share_of(u128::MAX, 70));
        assert!(p.worker > p.building);
        assert!(p.treasury >= p.maintainer);
    }

    #[test]
    fn small_amounts_round_to_treasury() {
        // Below 10 every percentage leg truncates to zero.
        let p = Payout::split(9);
        assert_eq!(p.worker, 6);
        assert_eq!(p.building, 0);
        assert_eq!(p.maintainer, 0);
        assert_eq!(p.treasury, 3);
    }

    #[test]
    fn payout_serde_roundtrip() {
        let p = Payout::split(12_345);
        let json = serde_json::to_string(&p).expect("serialize");
        let back: Payout = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(p, back);
    }
}
