//! # cheque-state — Cheque Lifecycle State Machine
//!
//! Transition rules for the cheque record of one payee. Every transition is
//! a method on [`Cheque`] that validates the current status and the ledger
//! time it is given, then mutates the record and returns an audit entry.
//! Invalid transitions return a [`ChequeError`] and leave the record as it
//! was.
//!
//! ## States
//!
//! ```text
//!                    draw
//!   None ─────────────────────────▶ Active ◀──┐ increase / reduce (> 0)
//!   Cancelled ──────── draw ──────▶   │  └────┘
//!   CashedOut ──────── draw ──────▶   │
//!   Cleared   ──────── draw ──────▶   ├── cancel (within window) ──▶ Cancelled
//!   Reclaimed ──────── draw ──────▶   ├── cash_out (not expired) ──▶ CashedOut
//!                                     ├── reduce to zero ──────────▶ Cleared
//!                                     └── reclaim (expired) ───────▶ Reclaimed
//! ```
//!
//! The record does not know about the aggregate escrowed balance or who is
//! calling; those belong to the engine that owns the ledger.

pub mod cheque;
pub mod error;

pub use cheque::{Cheque, ChequeOperation, ChequeStatus, ChequeTransitionRecord, ValidityWindow};
pub use error::ChequeError;
