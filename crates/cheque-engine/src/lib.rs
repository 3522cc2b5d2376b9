//! # cheque-engine — Escrow Engine
//!
//! Applies cheque operations on behalf of a single owner account. The
//! engine owns an [`EscrowLedger`], checks who is calling and what value is
//! attached, runs the transition on the payee's [`Cheque`] record, and
//! commits the result through the ledger, which re-verifies the balance
//! identities before the change is kept.
//!
//! The engine is synchronous and never reads a clock. Callers pass the
//! caller identity, the attached value, and the ledger time explicitly.
//! Every accepted operation yields a [`Settlement`] listing the value that
//! leaves escrow; a rejected operation leaves the ledger untouched.
//!
//! [`Cheque`]: cheque_state::Cheque

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod operation;

pub use config::{ConfigError, EngineConfig, ExcessValuePolicy};
pub use engine::{EscrowEngine, PreparedOperation};
pub use error::EngineError;
pub use ledger::{Adjustment, EscrowLedger};
pub use operation::{Operation, Settlement, TransferReason, ValueTransfer};
