//! # Cheque Record
//!
//! The per-payee record and its transitions. Time comparisons use the
//! ledger timestamp passed in by the caller, and both window boundaries are
//! inclusive: a cheque is claimable at exactly `drawn_at + validity_window`,
//! and cancellable at exactly `drawn_at + cancellation_window`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use cheque_core::{Account, Amount, Timestamp};

use crate::error::ChequeError;

// ─── Status ──────────────────────────────────────────────────────────

/// The status of a payee's cheque record.
///
/// Only `Active` carries a claim. The other statuses are kept distinct so
/// the audit trail shows how the last cheque ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChequeStatus {
    /// No cheque has ever been drawn for this payee.
    #[default]
    None,
    /// Drawn and claimable within its validity window.
    Active,
    /// Rescinded by the owner; escrow refunded.
    Cancelled,
    /// Claimed by the payee.
    CashedOut,
    /// Reduced to zero by the owner.
    Cleared,
    /// Expired and reclaimed by the owner.
    Reclaimed,
}

impl ChequeStatus {
    /// Whether the payee currently holds a claim.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::CashedOut => "CASHED_OUT",
            Self::Cleared => "CLEARED",
            Self::Reclaimed => "RECLAIMED",
        }
    }
}

impl std::fmt::Display for ChequeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Validity Window ─────────────────────────────────────────────────

/// How long, in whole hours, a drawn cheque stays claimable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidityWindow(u32);

impl ValidityWindow {
    /// Construct a window of `hours`.
    ///
    /// # Errors
    ///
    /// Returns [`ChequeError::InvalidValidityWindow`] for a zero window.
    pub fn hours(hours: u32) -> Result<Self, ChequeError> {
        if hours == 0 {
            return Err(ChequeError::InvalidValidityWindow { hours });
        }
        Ok(Self(hours))
    }

    /// The window length in hours.
    pub fn as_hours(&self) -> u32 {
        self.0
    }

    /// The window as a `chrono::Duration`.
    pub fn as_duration(&self) -> Duration {
        Duration::hours(i64::from(self.0))
    }
}

impl std::fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.0)
    }
}

// ─── Transition Records ──────────────────────────────────────────────

/// The operation that produced a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChequeOperation {
    /// A fresh draw.
    Draw,
    /// A top-up of an active cheque.
    Increase,
    /// A partial or full reduction by the owner.
    Reduce,
    /// An early cancellation by the owner.
    Cancel,
    /// A claim by the payee.
    Cashout,
    /// A reclaim of an expired cheque by the owner.
    Reclaim,
}

impl ChequeOperation {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Increase => "increase",
            Self::Reduce => "reduce",
            Self::Cancel => "cancel",
            Self::Cashout => "cashout",
            Self::Reclaim => "reclaim",
        }
    }
}

impl std::fmt::Display for ChequeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit entry for one transition of a cheque record.
///
/// Every successful transition returns one. The record itself keeps only
/// its current state; whoever owns it decides where the entries are logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChequeTransitionRecord {
    /// The operation applied.
    pub operation: ChequeOperation,
    /// Status before the transition.
    pub from_status: ChequeStatus,
    /// Status after the transition.
    pub to_status: ChequeStatus,
    /// Value moved into or out of escrow by this transition.
    pub moved: Amount,
    /// Cheque balance after the transition.
    pub balance_after: Amount,
    /// Ledger time of the transition.
    pub at: Timestamp,
}

// ─── Cheque ──────────────────────────────────────────────────────────

/// One payee's cheque record.
///
/// A record exists for every payee conceptually; payees never drawn for
/// are represented by [`Cheque::new`] with status [`ChequeStatus::None`].
/// Only an `Active` record carries a non-zero `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cheque {
    /// The payee this record belongs to.
    pub payee: Account,
    /// Value currently escrowed for the payee.
    pub amount: Amount,
    /// Ledger time of the most recent draw.
    pub drawn_at: Option<Timestamp>,
    /// Validity window set at the most recent draw.
    pub validity_window: Option<ValidityWindow>,
    /// Current status.
    pub status: ChequeStatus,
}

impl Cheque {
    /// An empty record for `payee` in status `None`.
    pub fn new(payee: Account) -> Self {
        Self {
            payee,
            amount: Amount::ZERO,
            drawn_at: None,
            validity_window: None,
            status: ChequeStatus::None,
        }
    }

    /// The last instant the cheque can be cashed out, if it has been drawn.
    pub fn expires_at(&self) -> Option<Timestamp> {
        let drawn_at = self.drawn_at?;
        let window = self.validity_window?;
        drawn_at.checked_add(window.as_duration())
    }

    /// Whether the validity window has elapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at(), Some(expires_at) if now > expires_at)
    }

    /// Draw a fresh cheque (any non-active status → ACTIVE).
    ///
    /// # Errors
    ///
    /// - [`ChequeError::ChequeAlreadyActive`] if a cheque is already active.
    /// - [`ChequeError::InvalidAmount`] for a zero amount.
    /// - [`ChequeError::InvalidValidityWindow`] if expiry is unrepresentable.
    pub fn draw(
        &mut self,
        amount: Amount,
        window: ValidityWindow,
        now: Timestamp,
    ) -> Result<ChequeTransitionRecord, ChequeError> {
        if self.status.is_active() {
            return Err(ChequeError::ChequeAlreadyActive {
                payee: self.payee.to_string(),
                amount: self.amount.to_string(),
            });
        }
        require_positive(amount, ChequeOperation::Draw)?;
        if now.checked_add(window.as_duration()).is_none() {
            return Err(ChequeError::InvalidValidityWindow {
                hours: window.as_hours(),
            });
        }
        let from = self.status;
        self.amount = amount;
        self.drawn_at = Some(now);
        self.validity_window = Some(window);
        Ok(self.record(ChequeOperation::Draw, from, ChequeStatus::Active, amount, now))
    }

    /// Add `amount` to an active, unexpired cheque.
    ///
    /// Neither `drawn_at` nor the validity window change.
    ///
    /// # Errors
    ///
    /// - [`ChequeError::NoActiveCheque`] if not active.
    /// - [`ChequeError::ChequeExpired`] if the validity window has elapsed.
    /// - [`ChequeError::InvalidAmount`] for a zero amount.
    /// - [`ChequeError::AmountOverflow`] if the balance would overflow.
    pub fn increase(
        &mut self,
        amount: Amount,
        now: Timestamp,
    ) -> Result<ChequeTransitionRecord, ChequeError> {
        self.require_active(ChequeOperation::Increase)?;
        self.require_unexpired(now)?;
        require_positive(amount, ChequeOperation::Increase)?;
        let balance = self
            .amount
            .checked_add(amount)
            .map_err(|_| ChequeError::AmountOverflow {
                payee: self.payee.to_string(),
                balance: self.amount.to_string(),
                increment: amount.to_string(),
            })?;
        self.amount = balance;
        Ok(self.record(
            ChequeOperation::Increase,
            ChequeStatus::Active,
            ChequeStatus::Active,
            amount,
            now,
        ))
    }

    /// Remove `amount` from an active cheque.
    ///
    /// A reduction to zero moves the record to `Cleared` so no zero-value
    /// claimable cheque remains; the returned entry's `to_status` says which.
    ///
    /// # Errors
    ///
    /// - [`ChequeError::NoActiveCheque`] if not active.
    /// - [`ChequeError::InvalidAmount`] for a zero amount.
    /// - [`ChequeError::InsufficientChequeBalance`] if `amount` exceeds the balance.
    pub fn reduce(
        &mut self,
        amount: Amount,
        now: Timestamp,
    ) -> Result<ChequeTransitionRecord, ChequeError> {
        self.require_active(ChequeOperation::Reduce)?;
        require_positive(amount, ChequeOperation::Reduce)?;
        let remaining =
            self.amount
                .checked_sub(amount)
                .map_err(|_| ChequeError::InsufficientChequeBalance {
                    payee: self.payee.to_string(),
                    requested: amount.to_string(),
                    balance: self.amount.to_string(),
                })?;
        let to = if remaining.is_zero() {
            ChequeStatus::Cleared
        } else {
            ChequeStatus::Active
        };
        self.amount = remaining;
        Ok(self.record(ChequeOperation::Reduce, ChequeStatus::Active, to, amount, now))
    }

    /// Cancel an active cheque within `cancellation_window` of its draw
    /// (ACTIVE → CANCELLED). The entry's `moved` is the refunded amount.
    ///
    /// # Errors
    ///
    /// - [`ChequeError::NoActiveCheque`] if not active.
    /// - [`ChequeError::OutsideCancellationWindow`] after the window closes,
    ///   or when its end is not a representable time.
    pub fn cancel(
        &mut self,
        cancellation_window: Duration,
        now: Timestamp,
    ) -> Result<ChequeTransitionRecord, ChequeError> {
        self.require_active(ChequeOperation::Cancel)?;
        let closes_at = self
            .drawn_at
            .and_then(|drawn_at| drawn_at.checked_add(cancellation_window));
        match closes_at {
            Some(closes_at) if now <= closes_at => {}
            Some(closes_at) => {
                return Err(ChequeError::OutsideCancellationWindow {
                    payee: self.payee.to_string(),
                    closed_at: closes_at.to_string(),
                })
            }
            None => {
                return Err(ChequeError::OutsideCancellationWindow {
                    payee: self.payee.to_string(),
                    closed_at: "unrepresentable".to_string(),
                })
            }
        }
        Ok(self.settle(ChequeOperation::Cancel, ChequeStatus::Cancelled, now))
    }

    /// Claim an active cheque before it expires (ACTIVE → CASHED_OUT).
    /// The entry's `moved` is the amount paid to the payee.
    ///
    /// # Errors
    ///
    /// - [`ChequeError::NoActiveCheque`] if not active.
    /// - [`ChequeError::ChequeExpired`] if `now` is past the validity window.
    pub fn cash_out(&mut self, now: Timestamp) -> Result<ChequeTransitionRecord, ChequeError> {
        self.require_active(ChequeOperation::Cashout)?;
        self.require_unexpired(now)?;
        Ok(self.settle(ChequeOperation::Cashout, ChequeStatus::CashedOut, now))
    }

    /// Return an expired cheque's escrow to the owner (ACTIVE → RECLAIMED).
    ///
    /// # Errors
    ///
    /// - [`ChequeError::NoActiveCheque`] if not active.
    /// - [`ChequeError::ChequeNotExpired`] while the cheque is still claimable.
    pub fn reclaim_expired(
        &mut self,
        now: Timestamp,
    ) -> Result<ChequeTransitionRecord, ChequeError> {
        self.require_active(ChequeOperation::Reclaim)?;
        if !self.is_expired(now) {
            return Err(ChequeError::ChequeNotExpired {
                payee: self.payee.to_string(),
                expires_at: self
                    .expires_at()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "never".to_string()),
            });
        }
        Ok(self.settle(ChequeOperation::Reclaim, ChequeStatus::Reclaimed, now))
    }

    /// Zero the balance and move to a terminal status. `moved` is what was held.
    fn settle(
        &mut self,
        operation: ChequeOperation,
        to: ChequeStatus,
        now: Timestamp,
    ) -> ChequeTransitionRecord {
        let released = self.amount;
        self.amount = Amount::ZERO;
        self.record(operation, ChequeStatus::Active, to, released, now)
    }

    fn require_active(&self, operation: ChequeOperation) -> Result<(), ChequeError> {
        if self.status.is_active() {
            return Ok(());
        }
        Err(ChequeError::NoActiveCheque {
            payee: self.payee.to_string(),
            operation: operation.to_string(),
            status: self.status.to_string(),
        })
    }

    fn require_unexpired(&self, now: Timestamp) -> Result<(), ChequeError> {
        match self.expires_at() {
            Some(expires_at) if now > expires_at => Err(ChequeError::ChequeExpired {
                payee: self.payee.to_string(),
                expired_at: expires_at.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn record(
        &mut self,
        operation: ChequeOperation,
        from: ChequeStatus,
        to: ChequeStatus,
        moved: Amount,
        at: Timestamp,
    ) -> ChequeTransitionRecord {
        self.status = to;
        ChequeTransitionRecord {
            operation,
            from_status: from,
            to_status: to,
            moved,
            balance_after: self.amount,
            at,
        }
    }
}

fn require_positive(amount: Amount, operation: ChequeOperation) -> Result<(), ChequeError> {
    if amount.is_zero() {
        return Err(ChequeError::InvalidAmount {
            operation: operation.to_string(),
        });
    }
    Ok(())
}
