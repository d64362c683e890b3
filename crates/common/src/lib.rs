//! # provenet-common
//!
//! Shared types and constants for the provenet contribution attestation
//! core. This crate holds the data model that both the ledger state layer
//! and external tooling agree on:
//!
//! - [`types`] — addresses and id aliases
//! - [`constants`] — economic constants (single source of truth)
//! - [`proof`] — structured contribution proofs and freshness rules
//! - [`contribution`] — the contribution record state machine
//! - [`dispute`] — dispute records and commit-reveal vote types
//! - [`stake`] — per-oracle stake buckets and minimum-stake checks
//! - [`payout`] — the fixed 70/10/10/10 settlement split
//! - [`crypto`] — Ed25519 helpers and address derivation
//!
//! Everything here is deterministic and side-effect free. Mutation of
//! ledger state lives in `provenet-core`.

pub mod constants;
pub mod contribution;
pub mod crypto;
pub mod dispute;
pub mod error;
pub mod payout;
pub mod proof;
pub mod stake;
pub mod types;

pub use contribution::{Contribution, ContributionStatus};
pub use dispute::{Dispute, DisputeStatus, Evidence, Ruling, VoteCommitment};
pub use error::ErrorKind;
pub use payout::Payout;
pub use proof::ContributionProof;
pub use stake::OracleStake;
pub use types::{Address, ContributionId, ProofHash, SubjectId};
