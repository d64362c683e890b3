//! Error classification shared by every operation error in the core.
//!
//! Each module defines its own error enum carrying diagnostic fields; the
//! [`ErrorKind`] here is the coarse taxonomy callers branch on when they
//! do not care about the specific variant.

use serde::{Deserialize, Serialize};

/// Coarse classification of an operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input: zero/empty identifiers, zero amounts, bad proof shape.
    Validation,
    /// Missing role or capability, insufficient stake, wrong caller.
    Authorization,
    /// The record is not in a state that permits the operation: already
    /// finalized, already disputed, duplicate confirmation, replay.
    State,
    /// A timing window is violated: proof expired, delay not elapsed,
    /// voting window open or closed.
    Temporal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_serde_roundtrip() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Authorization,
            ErrorKind::State,
            ErrorKind::Temporal,
        ] {
            let json = serde_json::to_string(&kind).expect("serialize");
            let back: ErrorKind = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(kind, back);
        }
    }
}
