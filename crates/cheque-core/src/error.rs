//! # Error Types
//!
//! Errors raised while constructing core primitives. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Errors from validated constructors and checked arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The string is not a `0x`-prefixed 20-byte hex address.
    #[error("invalid account address {input:?}: {reason}")]
    InvalidAccount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The string is not a valid non-negative amount.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Checked arithmetic overflowed or underflowed.
    #[error("amount arithmetic out of range: {lhs} {op} {rhs}")]
    AmountOutOfRange {
        /// Left operand.
        lhs: String,
        /// Operator symbol.
        op: &'static str,
        /// Right operand.
        rhs: String,
    },

    /// Timestamp parsing or construction failed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use string or integer for amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_account_display() {
        let err = CoreError::InvalidAccount {
            input: "0x12".to_string(),
            reason: "expected 40 hex digits".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("0x12"));
        assert!(msg.contains("40 hex digits"));
    }

    #[test]
    fn out_of_range_display() {
        let err = CoreError::AmountOutOfRange {
            lhs: "1".to_string(),
            op: "-",
            rhs: "2".to_string(),
        };
        assert_eq!(format!("{err}"), "amount arithmetic out of range: 1 - 2");
    }
}
