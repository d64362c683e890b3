//! # Ledger State Store
//!
//! [`LedgerState`] is the explicit, passed-by-handle persistent store every
//! operation executes against. It carries:
//!
//! - the fungible-asset balances (the external asset ledger modeled
//!   in-store, with mint reserved for the settlement path),
//! - oracle registrations and stake buckets,
//! - contribution and dispute records,
//! - the content-addressed replay sets (used proofs, used nonces),
//! - price state and daily-cap usage counters,
//! - protocol parameters and the capability set.
//!
//! ## Determinism
//!
//! Operations never read a wall clock; the caller passes `now`. Replaying
//! the same sequence of operations against a fresh store produces the
//! same store.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use provenet_common::constants::{DEFAULT_ACCESS_PRICE, DISPUTE_BOND};
use provenet_common::error::ErrorKind;
use provenet_common::stake::StakeRequirement;
use provenet_common::{Address, Contribution, ContributionId, Dispute, OracleStake, ProofHash, SubjectId};

use crate::registry::{AddressRegistry, IdentityRegistry};

// ════════════════════════════════════════════════════════════════════════════════
// PROTOCOL PARAMETERS
// ════════════════════════════════════════════════════════════════════════════════

/// Runtime-configurable economic knobs, constructed from protocol
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Minimum active stake for confirmation and vote eligibility.
    pub stake_requirement: StakeRequirement,
    /// Fixed bond taken when raising a dispute.
    pub dispute_bond: u128,
    /// Daily mint ceiling per worker subject. `None` = unlimited.
    pub worker_daily_cap: Option<u128>,
    /// Daily mint ceiling per building subject. `None` = unlimited.
    pub building_daily_cap: Option<u128>,
    /// Access price for subjects with no stored or scheduled price.
    pub default_access_price: u128,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            stake_requirement: StakeRequirement::default(),
            dispute_bond: DISPUTE_BOND,
            worker_daily_cap: None,
            building_daily_cap: None,
            default_access_price: DEFAULT_ACCESS_PRICE,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// DAILY USAGE / SCHEDULED PRICE
// ════════════════════════════════════════════════════════════════════════════════

/// Rolling per-subject mint counter, keyed by day index.
///
/// The counter resets the first time an operation observes a later day
/// index than the stored one — exactly once per boundary crossing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Amount minted to the subject during `day`.
    pub minted: u128,
    /// Day index the counter belongs to.
    pub day: u64,
}

/// A price change scheduled to take effect after the mandatory delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPrice {
    /// Price that becomes effective.
    pub price: u128,
    /// Unix timestamp from which the new price applies.
    pub effective_at: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// LEDGER STATE
// ════════════════════════════════════════════════════════════════════════════════

/// The shared store every operation executes against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    /// Fungible-asset balances.
    pub balances: HashMap<Address, u128>,
    /// Total value ever minted through settlement.
    pub total_minted: u128,
    /// Platform pot that forfeited dispute bonds and slashed stake land
    /// in. Deliberately separate from the registry-resolved treasury
    /// address used by the settlement split.
    pub platform_treasury: u128,
    /// Registered oracle → Ed25519 public key.
    pub oracles: HashMap<Address, [u8; 32]>,
    /// Per-oracle stake buckets.
    pub stakes: HashMap<Address, OracleStake>,
    /// Contribution records by content id.
    pub contributions: HashMap<ContributionId, Contribution>,
    /// Proof hash → contribution it is bound to. Never pruned.
    pub used_proofs: HashMap<ProofHash, ContributionId>,
    /// Active and resolved disputes, keyed by contribution id.
    pub disputes: HashMap<ContributionId, Dispute>,
    /// Consumed payment nonces. Never pruned.
    pub used_nonces: HashSet<[u8; 32]>,
    /// Stored access price per subject.
    pub prices: HashMap<SubjectId, u128>,
    /// Pending delayed price changes per subject.
    pub scheduled_prices: HashMap<SubjectId, ScheduledPrice>,
    /// Daily mint usage per worker.
    pub worker_usage: HashMap<Address, DailyUsage>,
    /// Daily mint usage per building.
    pub building_usage: HashMap<SubjectId, DailyUsage>,
    /// Economic parameters.
    pub params: ProtocolParams,
    /// Emergency pause: every distribution path rejects while set.
    pub paused: bool,
    /// Administrative authority (slashing, caps, pause, registration).
    pub admin: Address,
    /// The dispute-resolver authority for oracle-side ruling entry points.
    pub resolver_authority: Address,
    /// Worker/building identity registry (external collaborator).
    pub identity: IdentityRegistry,
    /// Maintainer/treasury role resolution (external collaborator).
    pub addresses: AddressRegistry,
}

impl LedgerState {
    /// Fresh store with the given authorities. The admin also owns both
    /// registries until ownership is handed over.
    #[must_use]
    pub fn new(admin: Address, resolver_authority: Address) -> Self {
        Self {
            balances: HashMap::new(),
            total_minted: 0,
            platform_treasury: 0,
            oracles: HashMap::new(),
            stakes: HashMap::new(),
            contributions: HashMap::new(),
            used_proofs: HashMap::new(),
            disputes: HashMap::new(),
            used_nonces: HashSet::new(),
            prices: HashMap::new(),
            scheduled_prices: HashMap::new(),
            worker_usage: HashMap::new(),
            building_usage: HashMap::new(),
            params: ProtocolParams::default(),
            paused: false,
            admin,
            resolver_authority,
            identity: IdentityRegistry::new(admin),
            addresses: AddressRegistry::new(admin),
        }
    }

    /// Balance of `account` (zero if unknown).
    #[must_use]
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Credits `amount` to `account`. Infallible; saturates at `u128::MAX`.
    pub fn credit(&mut self, account: Address, amount: u128) {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Debits `amount` from `account`, failing without mutation if the
    /// balance is insufficient.
    pub fn debit(&mut self, account: Address, amount: u128) -> Result<(), FundsError> {
        let available = self.balance_of(&account);
        if available < amount {
            return Err(FundsError::InsufficientBalance {
                account,
                required: amount,
                available,
            });
        }
        self.balances.insert(account, available - amount);
        Ok(())
    }

    /// Mints `amount` to `account`. Reserved for the settlement paths;
    /// kept crate-internal so only the distributor can reach it.
    pub(crate) fn mint(&mut self, account: Address, amount: u128) {
        self.credit(account, amount);
        self.total_minted = self.total_minted.saturating_add(amount);
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// AUTHORIZATION PREDICATE
// ════════════════════════════════════════════════════════════════════════════════

/// Capabilities an operation may demand of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The administrative authority.
    Admin,
    /// The dispute-resolver authority.
    Resolver,
    /// Any registered oracle.
    Oracle,
}

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("caller {caller} is not the admin authority")]
    NotAdmin { caller: Address },

    #[error("caller {caller} is not the resolver authority")]
    NotResolver { caller: Address },

    #[error("caller {caller} is not a registered oracle")]
    NotOracle { caller: Address },
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Authorization
    }
}

/// Evaluates the capability predicate for `caller` at the start of an
/// operation. No dynamic dispatch; the capability set is explicit state.
pub fn authorize(state: &LedgerState, caller: Address, cap: Capability) -> Result<(), AuthError> {
    match cap {
        Capability::Admin => {
            if caller != state.admin {
                return Err(AuthError::NotAdmin { caller });
            }
        }
        Capability::Resolver => {
            if caller != state.resolver_authority {
                return Err(AuthError::NotResolver { caller });
            }
        }
        Capability::Oracle => {
            if !state.oracles.contains_key(&caller) {
                return Err(AuthError::NotOracle { caller });
            }
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// FUNDS ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Balance failures on the modeled asset ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FundsError {
    #[error("insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: u128,
        available: u128,
    },
}

impl FundsError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::State
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn fresh() -> LedgerState {
        LedgerState::new(addr(0xAD), addr(0x9E))
    }

    #[test]
    fn new_state_is_empty_and_unpaused() {
        let state = fresh();
        assert!(!state.paused);
        assert_eq!(state.total_minted, 0);
        assert_eq!(state.platform_treasury, 0);
        assert!(state.contributions.is_empty());
        assert!(state.used_proofs.is_empty());
        assert!(state.used_nonces.is_empty());
    }

    #[test]
    fn credit_and_debit_roundtrip() {
        let mut state = fresh();
        let a = addr(0x01);
        state.credit(a, 1_000);
        assert_eq!(state.balance_of(&a), 1_000);

        state.debit(a, 400).expect("debit");
        assert_eq!(state.balance_of(&a), 600);
    }

    #[test]
    fn debit_beyond_balance_rejected_without_mutation() {
        let mut state = fresh();
        let a = addr(0x01);
        state.credit(a, 100);

        let result = state.debit(a, 101);
        assert_eq!(
            result,
            Err(FundsError::InsufficientBalance {
                account: a,
                required: 101,
                available: 100,
            })
        );
        assert_eq!(state.balance_of(&a), 100);
    }

    #[test]
    fn mint_tracks_total() {
        let mut state = fresh();
        state.mint(addr(0x01), 700);
        state.mint(addr(0x02), 300);
        assert_eq!(state.total_minted, 1_000);
    }

    #[test]
    fn authorize_admin() {
        let state = fresh();
        assert!(authorize(&state, addr(0xAD), Capability::Admin).is_ok());
        assert_eq!(
            authorize(&state, addr(0x01), Capability::Admin),
            Err(AuthError::NotAdmin { caller: addr(0x01) })
        );
    }

    #[test]
    fn authorize_resolver() {
        let state = fresh();
        assert!(authorize(&state, addr(0x9E), Capability::Resolver).is_ok());
        assert!(authorize(&state, addr(0xAD), Capability::Resolver).is_err());
    }

    #[test]
    fn authorize_oracle_requires_registration() {
        let mut state = fresh();
        let o = addr(0x10);
        assert_eq!(
            authorize(&state, o, Capability::Oracle),
            Err(AuthError::NotOracle { caller: o })
        );

        state.oracles.insert(o, [0x42; 32]);
        assert!(authorize(&state, o, Capability::Oracle).is_ok());
    }

    #[test]
    fn auth_errors_classify_as_authorization() {
        let err = AuthError::NotAdmin { caller: addr(0x01) };
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }
}
