//! Client error types.

use cheque_core::{CanonicalizationError, CoreError};
use cheque_engine::EngineError;
use thiserror::Error;

/// Errors from ledger client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The engine rejected the operation. Nothing was applied.
    #[error("operation rejected: {0}")]
    Rejected(#[from] EngineError),

    /// The ledger's balance identities do not hold. Raised by checks run
    /// outside of any submission.
    #[error("ledger invariant check failed: {0}")]
    Invariant(EngineError),

    /// The caller's wallet cannot cover the attached value.
    #[error("{account} holds {balance} but attached {required}")]
    InsufficientFunds {
        /// The submitting account.
        account: String,
        /// Its wallet balance.
        balance: String,
        /// The attached value.
        required: String,
    },

    /// The receipt could not be canonicalized for digesting.
    #[error("receipt canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Wallet arithmetic left the representable range.
    #[error("wallet balance error: {0}")]
    Balance(#[from] CoreError),
}
