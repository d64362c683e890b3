//! # Access Payments & Pricing
//!
//! Micropayments for access to attested data, routed through the same
//! settlement split as contribution minting. Payments move existing
//! balance; nothing is minted on this path.
//!
//! ## Replay Protection
//!
//! Every payment carries a caller-chosen 32-byte nonce. Consumed nonces
//! land in a global never-pruned set; a reused nonce is rejected before
//! any funds move.
//!
//! ## Pricing
//!
//! Each subject has an effective access price: a scheduled change that
//! has come into effect, else the stored price, else the protocol
//! default. Price changes are scheduled by the admin or the subject's
//! own wallet and take effect only after the seven-day delay, so a
//! buyer's `max_price` cannot be front-run.

use thiserror::Error;
use tracing::info;

use provenet_common::constants::PRICE_UPDATE_DELAY_SECS;
use provenet_common::error::ErrorKind;
use provenet_common::{Address, Payout, SubjectId};

use crate::distributor::{self, DistributionError};
use crate::state::{FundsError, LedgerState, ScheduledPrice};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// Payment and pricing failures.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error(transparent)]
    Funds(#[from] FundsError),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    #[error("nonce is all zeroes")]
    ZeroNonce,

    #[error("subject {subject} is not registered")]
    UnknownSubject { subject: String },

    #[error("payment {offered} below the access price {required}")]
    BelowMinimum { required: u128, offered: u128 },

    #[error("access price {price} exceeds the caller's limit {limit}")]
    PriceLimitExceeded { price: u128, limit: u128 },

    #[error("nonce already consumed")]
    NonceAlreadyUsed,

    #[error("duplicate nonce within the batch")]
    DuplicateNonceInBatch,

    #[error("batch is empty")]
    EmptyBatch,

    #[error("caller {caller} may not set the price for this subject")]
    NotPriceSetter { caller: Address },

    #[error("no scheduled price for this subject")]
    NoScheduledPrice,

    #[error("scheduled price not yet effective: at {effective_at}, now {now}")]
    PriceNotEffective { effective_at: u64, now: u64 },
}

impl PaymentError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Funds(e) => e.kind(),
            Self::Distribution(e) => e.kind(),
            Self::ZeroNonce | Self::UnknownSubject { .. } => ErrorKind::Validation,
            Self::BelowMinimum { .. } | Self::PriceLimitExceeded { .. } => ErrorKind::Validation,
            Self::NonceAlreadyUsed | Self::DuplicateNonceInBatch => ErrorKind::State,
            Self::EmptyBatch => ErrorKind::Validation,
            Self::NotPriceSetter { .. } => ErrorKind::Authorization,
            Self::NoScheduledPrice => ErrorKind::State,
            Self::PriceNotEffective { .. } => ErrorKind::Temporal,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PRICING
// ════════════════════════════════════════════════════════════════════════════════

/// Effective access price of `subject` at `now`.
///
/// A scheduled change that has reached its effective time wins over the
/// stored price, which wins over the protocol default. Pure read: the
/// schedule is folded into the stored price lazily by
/// [`apply_price_update`] or on payment.
#[must_use]
pub fn effective_price(state: &LedgerState, subject: &SubjectId, now: u64) -> u128 {
    if let Some(scheduled) = state.scheduled_prices.get(subject) {
        if now >= scheduled.effective_at {
            return scheduled.price;
        }
    }
    state
        .prices
        .get(subject)
        .copied()
        .unwrap_or(state.params.default_access_price)
}

/// Schedules a price change for `subject`, effective after the
/// mandatory delay. Allowed for the admin and the subject's own wallet.
/// A second schedule before the first takes effect replaces it.
pub fn set_minimum_payment(
    state: &mut LedgerState,
    caller: Address,
    subject: SubjectId,
    price: u128,
    now: u64,
) -> Result<(), PaymentError> {
    let wallet = state
        .identity
        .building_wallet(&subject)
        .ok_or_else(|| PaymentError::UnknownSubject {
            subject: hex::encode(subject),
        })?;
    if caller != state.admin && caller != wallet {
        return Err(PaymentError::NotPriceSetter { caller });
    }

    let effective_at = now.saturating_add(PRICE_UPDATE_DELAY_SECS);
    state
        .scheduled_prices
        .insert(subject, ScheduledPrice { price, effective_at });

    info!(
        subject = %hex::encode(subject),
        price,
        effective_at,
        "price change scheduled"
    );
    Ok(())
}

/// Folds an effective scheduled price into the stored price.
/// Permissionless housekeeping; payments read through the schedule either
/// way.
pub fn apply_price_update(
    state: &mut LedgerState,
    subject: SubjectId,
    now: u64,
) -> Result<u128, PaymentError> {
    let scheduled = state
        .scheduled_prices
        .get(&subject)
        .copied()
        .ok_or(PaymentError::NoScheduledPrice)?;
    if now < scheduled.effective_at {
        return Err(PaymentError::PriceNotEffective {
            effective_at: scheduled.effective_at,
            now,
        });
    }

    state.prices.insert(subject, scheduled.price);
    state.scheduled_prices.remove(&subject);
    Ok(scheduled.price)
}

// ════════════════════════════════════════════════════════════════════════════════
// SINGLE PAYMENT
// ════════════════════════════════════════════════════════════════════════════════

/// One access payment within a batch (or on its own).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPayment {
    /// Subject whose data is being paid for.
    pub subject: SubjectId,
    /// Amount offered. Must cover the effective price.
    pub amount: u128,
    /// Caller-chosen replay nonce. Must be non-zero and never used.
    pub nonce: [u8; 32],
    /// Price ceiling the caller is willing to accept.
    pub max_price: u128,
}

/// Validates one payment item against the store at `now`. Read-only;
/// returns the subject's settlement wallet.
fn validate_item(
    state: &LedgerState,
    item: &AccessPayment,
    now: u64,
) -> Result<Address, PaymentError> {
    if item.nonce == [0u8; 32] {
        return Err(PaymentError::ZeroNonce);
    }
    let recipient = state
        .identity
        .building_wallet(&item.subject)
        .ok_or_else(|| PaymentError::UnknownSubject {
            subject: hex::encode(item.subject),
        })?;

    let price = effective_price(state, &item.subject, now);
    if price > item.max_price {
        return Err(PaymentError::PriceLimitExceeded {
            price,
            limit: item.max_price,
        });
    }
    if item.amount < price {
        return Err(PaymentError::BelowMinimum {
            required: price,
            offered: item.amount,
        });
    }
    if state.used_nonces.contains(&item.nonce) {
        return Err(PaymentError::NonceAlreadyUsed);
    }
    Ok(recipient)
}

/// Pays for access to `subject`'s data.
///
/// All checks run before any mutation: nonce shape and freshness,
/// subject registration, both price gates, the pause, and the caller's
/// balance. Then the payment is debited, the nonce consumed, and the
/// split routed with the subject's wallet taking the worker and
/// building legs.
pub fn pay_for_access(
    state: &mut LedgerState,
    caller: Address,
    payment: &AccessPayment,
    now: u64,
) -> Result<Payout, PaymentError> {
    let recipient = validate_item(state, payment, now)?;
    if state.paused {
        return Err(DistributionError::Paused.into());
    }
    let available = state.balance_of(&caller);
    if available < payment.amount {
        return Err(FundsError::InsufficientBalance {
            account: caller,
            required: payment.amount,
            available,
        }
        .into());
    }

    state.debit(caller, payment.amount)?;
    state.used_nonces.insert(payment.nonce);
    let payout = distributor::distribute_payment(state, recipient, payment.amount)?;

    info!(
        payer = %caller,
        subject = %hex::encode(payment.subject),
        amount = payment.amount,
        "access payment settled"
    );
    Ok(payout)
}

// ════════════════════════════════════════════════════════════════════════════════
// BATCH PAYMENT
// ════════════════════════════════════════════════════════════════════════════════

/// Settles a batch of access payments atomically.
///
/// Every item is validated (including nonce uniqueness within the batch)
/// and the total checked against the caller's balance before the first
/// debit. A single failing item rejects the whole batch untouched.
pub fn batch_pay_for_access(
    state: &mut LedgerState,
    caller: Address,
    payments: &[AccessPayment],
    now: u64,
) -> Result<Vec<Payout>, PaymentError> {
    if payments.is_empty() {
        return Err(PaymentError::EmptyBatch);
    }
    if state.paused {
        return Err(DistributionError::Paused.into());
    }

    let mut recipients = Vec::with_capacity(payments.len());
    let mut seen = std::collections::HashSet::with_capacity(payments.len());
    let mut total: u128 = 0;
    for item in payments {
        let recipient = validate_item(state, item, now)?;
        if !seen.insert(item.nonce) {
            return Err(PaymentError::DuplicateNonceInBatch);
        }
        total = total.saturating_add(item.amount);
        recipients.push(recipient);
    }

    let available = state.balance_of(&caller);
    if available < total {
        return Err(FundsError::InsufficientBalance {
            account: caller,
            required: total,
            available,
        }
        .into());
    }

    state.debit(caller, total)?;
    let mut payouts = Vec::with_capacity(payments.len());
    for (item, recipient) in payments.iter().zip(recipients) {
        state.used_nonces.insert(item.nonce);
        payouts.push(distributor::distribute_payment(state, recipient, item.amount)?);
    }

    info!(payer = %caller, items = payments.len(), total, "batch payment settled");
    Ok(payouts)
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use provenet_common::constants::DEFAULT_ACCESS_PRICE;

    use crate::distributor::set_paused;
    use crate::registry::Role;

    const NOW: u64 = 1_700_000_000;
    const SUBJECT: SubjectId = [0xB1; 32];

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn admin() -> Address {
        addr(0xAD)
    }

    fn nonce(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    fn item(amount: u128, n: u8) -> AccessPayment {
        AccessPayment {
            subject: SUBJECT,
            amount,
            nonce: nonce(n),
            max_price: u128::MAX,
        }
    }

    /// State with one registered subject, distinct role addresses, and a
    /// funded payer.
    fn setup() -> (LedgerState, Address) {
        let mut state = LedgerState::new(admin(), addr(0x9E));
        state
            .identity
            .register_building(admin(), SUBJECT, addr(0xB0))
            .expect("building");
        state
            .addresses
            .set_role(admin(), Role::Maintainer, addr(0xEE))
            .expect("maintainer");
        state
            .addresses
            .set_role(admin(), Role::Treasury, addr(0xFF))
            .expect("treasury");
        let payer = addr(0x01);
        state.credit(payer, 10_000);
        (state, payer)
    }

    #[test]
    fn payment_routes_split_and_consumes_nonce() {
        let (mut state, payer) = setup();
        let payout = pay_for_access(&mut state, payer, &item(1_000, 1), NOW).expect("pay");

        assert_eq!(payout.total(), 1_000);
        assert_eq!(state.balance_of(&payer), 9_000);
        // Subject wallet takes the worker and building legs.
        assert_eq!(state.balance_of(&addr(0xB0)), 800);
        assert_eq!(state.balance_of(&addr(0xEE)), 100);
        assert_eq!(state.balance_of(&addr(0xFF)), 100);
        assert!(state.used_nonces.contains(&nonce(1)));
        assert_eq!(state.total_minted, 0);
    }

    #[test]
    fn nonce_replay_rejected_before_funds_move() {
        let (mut state, payer) = setup();
        pay_for_access(&mut state, payer, &item(1_000, 1), NOW).expect("first");

        let err = pay_for_access(&mut state, payer, &item(1_000, 1), NOW).unwrap_err();
        assert!(matches!(err, PaymentError::NonceAlreadyUsed));
        assert_eq!(state.balance_of(&payer), 9_000);
    }

    #[test]
    fn zero_nonce_rejected() {
        let (mut state, payer) = setup();
        let mut p = item(1_000, 1);
        p.nonce = [0u8; 32];
        assert!(matches!(
            pay_for_access(&mut state, payer, &p, NOW),
            Err(PaymentError::ZeroNonce)
        ));
    }

    #[test]
    fn default_price_gates_payment() {
        let (mut state, payer) = setup();
        let err = pay_for_access(&mut state, payer, &item(DEFAULT_ACCESS_PRICE - 1, 1), NOW)
            .unwrap_err();
        assert!(matches!(err, PaymentError::BelowMinimum { .. }));

        pay_for_access(&mut state, payer, &item(DEFAULT_ACCESS_PRICE, 1), NOW).expect("at price");
    }

    #[test]
    fn max_price_protects_the_payer() {
        let (mut state, payer) = setup();
        let mut p = item(1_000, 1);
        p.max_price = DEFAULT_ACCESS_PRICE - 1;
        let err = pay_for_access(&mut state, payer, &p, NOW).unwrap_err();
        assert!(matches!(err, PaymentError::PriceLimitExceeded { .. }));
    }

    #[test]
    fn unknown_subject_rejected() {
        let (mut state, payer) = setup();
        let mut p = item(1_000, 1);
        p.subject = [0xCC; 32];
        assert!(matches!(
            pay_for_access(&mut state, payer, &p, NOW),
            Err(PaymentError::UnknownSubject { .. })
        ));
    }

    #[test]
    fn pause_blocks_payments() {
        let (mut state, payer) = setup();
        set_paused(&mut state, admin(), true).expect("pause");
        let err = pay_for_access(&mut state, payer, &item(1_000, 1), NOW).unwrap_err();
        assert!(matches!(
            err,
            PaymentError::Distribution(DistributionError::Paused)
        ));
        assert_eq!(state.balance_of(&payer), 10_000);
    }

    #[test]
    fn scheduled_price_takes_effect_after_delay() {
        let (mut state, payer) = setup();
        set_minimum_payment(&mut state, addr(0xB0), SUBJECT, 500, NOW).expect("schedule");

        // Old price until the delay elapses.
        assert_eq!(effective_price(&state, &SUBJECT, NOW), DEFAULT_ACCESS_PRICE);
        pay_for_access(&mut state, payer, &item(DEFAULT_ACCESS_PRICE, 1), NOW + 1).expect("old");

        let after = NOW + PRICE_UPDATE_DELAY_SECS;
        assert_eq!(effective_price(&state, &SUBJECT, after), 500);
        let err = pay_for_access(&mut state, payer, &item(499, 2), after).unwrap_err();
        assert!(matches!(err, PaymentError::BelowMinimum { required: 500, .. }));
    }

    #[test]
    fn price_setter_is_admin_or_subject_wallet() {
        let (mut state, payer) = setup();
        set_minimum_payment(&mut state, admin(), SUBJECT, 200, NOW).expect("admin");
        set_minimum_payment(&mut state, addr(0xB0), SUBJECT, 300, NOW).expect("wallet");

        let err = set_minimum_payment(&mut state, payer, SUBJECT, 1, NOW).unwrap_err();
        assert!(matches!(err, PaymentError::NotPriceSetter { .. }));
    }

    #[test]
    fn apply_price_update_folds_schedule() {
        let (mut state, _) = setup();
        set_minimum_payment(&mut state, admin(), SUBJECT, 250, NOW).expect("schedule");

        let err = apply_price_update(&mut state, SUBJECT, NOW + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Temporal);

        let price =
            apply_price_update(&mut state, SUBJECT, NOW + PRICE_UPDATE_DELAY_SECS).expect("apply");
        assert_eq!(price, 250);
        assert_eq!(state.prices[&SUBJECT], 250);
        assert!(state.scheduled_prices.is_empty());
        assert!(matches!(
            apply_price_update(&mut state, SUBJECT, u64::MAX),
            Err(PaymentError::NoScheduledPrice)
        ));
    }

    #[test]
    fn batch_settles_all_items() {
        let (mut state, payer) = setup();
        let payouts = batch_pay_for_access(
            &mut state,
            payer,
            &[item(1_000, 1), item(2_000, 2)],
            NOW,
        )
        .expect("batch");

        assert_eq!(payouts.len(), 2);
        assert_eq!(state.balance_of(&payer), 7_000);
        assert_eq!(state.balance_of(&addr(0xB0)), 2_400);
        assert!(state.used_nonces.contains(&nonce(1)));
        assert!(state.used_nonces.contains(&nonce(2)));
    }

    #[test]
    fn batch_rejects_wholesale_on_any_bad_item() {
        let (mut state, payer) = setup();

        // Second item reuses the first's nonce.
        let err = batch_pay_for_access(
            &mut state,
            payer,
            &[item(1_000, 1), item(2_000, 1)],
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateNonceInBatch));
        assert_eq!(state.balance_of(&payer), 10_000);
        assert!(state.used_nonces.is_empty());

        // Total beyond balance.
        let err = batch_pay_for_access(
            &mut state,
            payer,
            &[item(6_000, 1), item(6_000, 2)],
            NOW,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(state.balance_of(&payer), 10_000);

        assert!(matches!(
            batch_pay_for_access(&mut state, payer, &[], NOW),
            Err(PaymentError::EmptyBatch)
        ));
    }
}
