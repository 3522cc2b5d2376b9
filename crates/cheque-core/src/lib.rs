//! # cheque-core — Foundational Types for the Cheque Ledger
//!
//! The leaf crate of the workspace. It defines the primitives every other
//! crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Account` and `Amount` are
//!    newtypes with validated constructors. No bare strings for addresses and
//!    no bare integers for value.
//!
//! 2. **Checked arithmetic only.** `Amount` exposes `checked_add` and
//!    `checked_sub`; overflow and underflow surface as errors, never wrap.
//!
//! 3. **UTC-only ledger time.** `Timestamp` is UTC with seconds precision,
//!    which is the resolution the ledger supplies to every operation.
//!
//! 4. **Digests over canonical bytes.** Receipt digests are computed with
//!    `sha256_digest()`, which only accepts `&CanonicalBytes`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cheque-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod account;
pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use account::Account;
pub use amount::{Amount, UNIT_DECIMALS};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use temporal::Timestamp;
