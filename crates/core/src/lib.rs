//! # provenet-core
//!
//! The trust layer of provenet: a small set of mutually-distrusting staked
//! oracles agree that a real-world contribution occurred, value settles in
//! a fixed 70/10/10/10 split, and anyone can challenge a wrongly-approved
//! contribution before money moves.
//!
//! ## Execution model
//!
//! There are no in-process threads. Every public operation is a free
//! function taking the [`state::LedgerState`] store, the caller identity,
//! and the current time as explicit inputs — never as ambient globals.
//! The surrounding substrate serializes operations and applies each one
//! atomically; within an operation every precondition is validated before
//! the first mutation, so a failure anywhere leaves no observable effect.
//!
//! ## Modules
//!
//! - [`state`] — the explicit, passed-by-handle ledger store
//! - [`registry`] — identity and role-address registries (external
//!   collaborators modeled at their interface)
//! - [`verifier`] — proof shape, freshness, and signature verification
//! - [`staking`] — oracle stake, delayed withdrawals, slashing
//! - [`oracle`] — propose/confirm → finalize for contributions
//! - [`disputes`] — bond-gated commit-reveal challenge game
//! - [`distributor`] — split settlement with daily caps and emergency pause
//! - [`payments`] — per-access micropayments with replay protection and
//!   delayed price changes

pub mod disputes;
pub mod distributor;
pub mod oracle;
pub mod payments;
pub mod registry;
pub mod staking;
pub mod state;
pub mod verifier;
