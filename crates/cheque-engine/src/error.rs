//! # Engine Error Types
//!
//! Rejections raised by the escrow engine. State machine rejections are
//! wrapped unchanged in [`EngineError::Cheque`].

use cheque_state::ChequeError;
use thiserror::Error;

/// Errors arising from engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An owner-only operation was submitted by another account.
    #[error("{caller} is not authorized to {operation}")]
    Unauthorized {
        /// The submitting account.
        caller: String,
        /// The attempted operation.
        operation: String,
    },

    /// Attached value (plus usable owner credit) does not cover the amount.
    #[error("{operation} requires {required} but {attached} was attached with {credit} owner credit")]
    InsufficientAttachedValue {
        /// The attempted operation.
        operation: String,
        /// Value the operation needs.
        required: String,
        /// Value attached to the submission.
        attached: String,
        /// Owner credit available to cover a shortfall.
        credit: String,
    },

    /// Value was attached to an operation that does not accept it.
    #[error("{operation} does not accept attached value (got {attached})")]
    UnexpectedAttachedValue {
        /// The attempted operation.
        operation: String,
        /// Value attached to the submission.
        attached: String,
    },

    /// A credit withdrawal exceeds the retained owner credit.
    #[error("withdrawal of {requested} exceeds owner credit {available}")]
    InsufficientOwnerCredit {
        /// The requested withdrawal.
        requested: String,
        /// The retained credit.
        available: String,
    },

    /// The ledger time moved backwards.
    #[error("timestamp {now} precedes last applied operation at {last}")]
    StaleTimestamp {
        /// The submitted ledger time.
        now: String,
        /// Ledger time of the last accepted operation.
        last: String,
    },

    /// A prepared operation was committed after another commit changed the
    /// ledger it was checked against.
    #[error("prepared {operation} is outdated; prepare it again")]
    OutdatedPreparation {
        /// The prepared operation.
        operation: String,
    },

    /// A commit would break a ledger balance identity. The commit was
    /// rolled back.
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),

    /// The cheque state machine rejected the transition.
    #[error(transparent)]
    Cheque(#[from] ChequeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_display() {
        let err = EngineError::Unauthorized {
            caller: "0xabc".to_string(),
            operation: "draw_cheque".to_string(),
        };
        assert_eq!(format!("{err}"), "0xabc is not authorized to draw_cheque");
    }

    #[test]
    fn cheque_error_is_transparent() {
        let inner = ChequeError::InvalidAmount {
            operation: "reduce".to_string(),
        };
        let err = EngineError::from(inner.clone());
        assert_eq!(format!("{err}"), format!("{inner}"));
    }
}
