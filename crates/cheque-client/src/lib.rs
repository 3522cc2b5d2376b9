//! # cheque-client — Ledger Client Boundary
//!
//! The engine is a synchronous state-transition function; this crate puts a
//! ledger around it. [`LedgerClient`] is the boundary callers submit
//! operations through, and [`InMemoryLedger`] is the implementation used by
//! tests and the CLI. It keeps wallet balances, assigns sequence numbers and
//! ledger time, and returns a [`Confirmation`] with a receipt digest for
//! every accepted operation.
//!
//! A live-chain client would implement the same trait against a transaction
//! submission API; none ships here.

pub mod client;
pub mod config;
pub mod error;
pub mod memory;

pub use client::{Confirmation, LedgerClient, Submission};
pub use config::ClientConfig;
pub use error::ClientError;
pub use memory::InMemoryLedger;
