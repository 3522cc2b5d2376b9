//! # Cheque Error Types
//!
//! Rejections raised by the cheque state machine. Each variant names the
//! payee and carries the values the precondition was checked against.

use thiserror::Error;

/// Errors arising from cheque transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChequeError {
    /// A draw was attempted while the payee already holds an active cheque.
    #[error("payee {payee} already holds an active cheque of {amount}")]
    ChequeAlreadyActive {
        /// The payee address.
        payee: String,
        /// The currently escrowed amount.
        amount: String,
    },

    /// The operation requires an active cheque.
    #[error("payee {payee} has no active cheque for {operation} (status {status})")]
    NoActiveCheque {
        /// The payee address.
        payee: String,
        /// The attempted operation.
        operation: String,
        /// The current status.
        status: String,
    },

    /// A reduction exceeds the cheque balance.
    #[error("reduction of {requested} exceeds cheque balance {balance} for payee {payee}")]
    InsufficientChequeBalance {
        /// The payee address.
        payee: String,
        /// The requested reduction.
        requested: String,
        /// The current balance.
        balance: String,
    },

    /// The cheque's validity window has elapsed.
    #[error("cheque for payee {payee} expired at {expired_at}")]
    ChequeExpired {
        /// The payee address.
        payee: String,
        /// The last instant the cheque was claimable.
        expired_at: String,
    },

    /// A reclaim was attempted while the cheque is still claimable.
    #[error("cheque for payee {payee} remains claimable until {expires_at}")]
    ChequeNotExpired {
        /// The payee address.
        payee: String,
        /// The last instant the cheque is claimable.
        expires_at: String,
    },

    /// A cancellation was attempted after the cancellation window closed.
    #[error("cancellation window for payee {payee} closed at {closed_at}")]
    OutsideCancellationWindow {
        /// The payee address.
        payee: String,
        /// The last instant cancellation was allowed.
        closed_at: String,
    },

    /// The operation requires a positive amount.
    #[error("{operation} requires a positive amount")]
    InvalidAmount {
        /// The attempted operation.
        operation: String,
    },

    /// The validity window is zero or pushes expiry past representable time.
    #[error("invalid validity window of {hours} hours")]
    InvalidValidityWindow {
        /// The rejected window.
        hours: u32,
    },

    /// The new balance would overflow.
    #[error("cheque balance overflow for payee {payee}: {balance} + {increment}")]
    AmountOverflow {
        /// The payee address.
        payee: String,
        /// The current balance.
        balance: String,
        /// The attempted increment.
        increment: String,
    },
}
