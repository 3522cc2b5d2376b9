//! # Escrow Engine
//!
//! Authorization, attached-value handling, and settlement around the cheque
//! state machine. Every operation goes through two steps.
//!
//! [`EscrowEngine::prepare`] reads the ledger and nothing else:
//!
//! 1. rejects ledger time earlier than the last accepted operation,
//! 2. checks the caller and the attached value against the [`Operation`],
//! 3. runs the transition on a copy of the payee's record,
//! 4. works out the balance adjustments and the resulting [`Settlement`].
//!
//! [`EscrowEngine::commit`] then writes the prepared change through the
//! ledger, all-or-nothing. [`EscrowEngine::apply`] does both.

use tracing::debug;

use cheque_core::{Account, Amount, Timestamp};
use cheque_state::{Cheque, ChequeError, ChequeTransitionRecord, ValidityWindow};

use crate::config::{EngineConfig, ExcessValuePolicy};
use crate::error::EngineError;
use crate::ledger::{Adjustment, EscrowLedger, LedgerChange};
use crate::operation::{Operation, Settlement, TransferReason, ValueTransfer};

/// How a payable operation's required amount is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Funding {
    /// Attached value beyond the required amount.
    excess: Amount,
    /// Owner credit consumed to cover a shortfall.
    credit_used: Amount,
}

/// A ledger change together with the transfers it pays out.
type Effect = (LedgerChange, Vec<ValueTransfer>);

/// An operation that passed every check, ready to commit.
///
/// Valid only against the ledger state it was prepared from; committing
/// it after any other commit fails with [`EngineError::OutdatedPreparation`].
#[derive(Debug, Clone)]
pub struct PreparedOperation {
    operation: &'static str,
    change: LedgerChange,
    settlement: Settlement,
    now: Timestamp,
    basis: u64,
}

impl PreparedOperation {
    /// The settlement the operation produces once committed.
    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    /// Ledger time the operation applies at.
    pub fn timestamp(&self) -> Timestamp {
        self.now
    }
}

/// The cheque escrow engine for a single owner.
#[derive(Debug, Clone)]
pub struct EscrowEngine {
    owner: Account,
    config: EngineConfig,
    ledger: EscrowLedger,
    last_applied: Option<Timestamp>,
    commits: u64,
}

impl EscrowEngine {
    /// A fresh engine with an empty ledger.
    pub fn new(owner: Account, config: EngineConfig) -> Self {
        Self {
            owner,
            config,
            ledger: EscrowLedger::new(),
            last_applied: None,
            commits: 0,
        }
    }

    /// The owner account.
    pub fn owner(&self) -> &Account {
        &self.owner
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// Sum of amounts over active cheques.
    pub fn open_cheques(&self) -> Amount {
        self.ledger.open_cheques()
    }

    /// The cheque record for `payee`.
    pub fn cheque_of(&self, payee: &Account) -> Cheque {
        self.ledger.get(payee)
    }

    /// Committed transitions of `payee`'s record, oldest first.
    pub fn history_of(&self, payee: &Account) -> &[ChequeTransitionRecord] {
        self.ledger.history(payee)
    }

    /// Retained owner credit.
    pub fn owner_credit(&self) -> Amount {
        self.ledger.owner_credit()
    }

    /// Total value held by the contract.
    pub fn held_balance(&self) -> Amount {
        self.ledger.held_balance()
    }

    /// Ledger time of the last accepted operation.
    pub fn last_applied(&self) -> Option<Timestamp> {
        self.last_applied
    }

    /// Prepare and commit `operation` in one step.
    pub fn apply(
        &mut self,
        caller: &Account,
        operation: &Operation,
        attached: Amount,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        let prepared = self.prepare(caller, operation, attached, now)?;
        self.commit(prepared)
    }

    /// Check `operation` from `caller` with `attached` value at `now` and
    /// work out its effect without changing anything.
    ///
    /// # Errors
    ///
    /// - [`EngineError::StaleTimestamp`] if `now` precedes the last commit.
    /// - [`EngineError::Unauthorized`] for an owner-only operation from
    ///   another account.
    /// - [`EngineError::UnexpectedAttachedValue`] for value attached to an
    ///   operation that is not payable.
    /// - [`EngineError::InsufficientAttachedValue`] and
    ///   [`EngineError::InsufficientOwnerCredit`] when funds fall short.
    /// - [`EngineError::Cheque`] when the cheque record refuses the transition.
    pub fn prepare(
        &self,
        caller: &Account,
        operation: &Operation,
        attached: Amount,
        now: Timestamp,
    ) -> Result<PreparedOperation, EngineError> {
        self.guard_time(now)?;
        if operation.is_owner_only() {
            self.guard_owner(caller, operation)?;
        }
        if !operation.is_payable() {
            self.guard_unpayable(operation, attached)?;
        }

        let (change, transfers) = match operation {
            Operation::DrawCheque {
                payee,
                amount,
                validity_window_hours,
            } => {
                let window = ValidityWindow::hours(*validity_window_hours)?;
                let mut cheque = self.ledger.get(payee);
                let entry = cheque.draw(*amount, window, now)?;
                self.funded(operation, cheque, entry, attached)?
            }
            Operation::IncreaseChequeValue { payee, amount } => {
                let mut cheque = self.ledger.get(payee);
                let entry = cheque.increase(*amount, now)?;
                self.funded(operation, cheque, entry, attached)?
            }
            Operation::ReduceChequeValue { payee, amount } => {
                let mut cheque = self.ledger.get(payee);
                let entry = cheque.reduce(*amount, now)?;
                self.released(cheque, entry, TransferReason::Refund)
            }
            Operation::CancelDrawnCheque { payee } => {
                let mut cheque = self.ledger.get(payee);
                let entry = cheque.cancel(self.config.cancellation_window, now)?;
                self.released(cheque, entry, TransferReason::Refund)
            }
            Operation::ReclaimExpired { payee } => {
                let mut cheque = self.ledger.get(payee);
                let entry = cheque.reclaim_expired(now)?;
                self.released(cheque, entry, TransferReason::Refund)
            }
            Operation::Cashout => {
                let mut cheque = self.ledger.get(caller);
                let entry = cheque.cash_out(now)?;
                self.released(cheque, entry, TransferReason::Payout)
            }
            Operation::WithdrawCredit { amount } => self.withdrawal(*amount)?,
        };

        let (open_cheques, owner_credit) = self.ledger.project(&change)?;
        Ok(PreparedOperation {
            operation: operation.name(),
            change,
            settlement: Settlement {
                transfers,
                open_cheques,
                owner_credit,
            },
            now,
            basis: self.commits,
        })
    }

    /// Write a prepared operation through the ledger.
    ///
    /// # Errors
    ///
    /// - [`EngineError::OutdatedPreparation`] if anything was committed
    ///   since `prepared` was made.
    /// - [`EngineError::InvariantViolation`] if the ledger refuses the
    ///   change; the ledger is left as it was.
    pub fn commit(&mut self, prepared: PreparedOperation) -> Result<Settlement, EngineError> {
        if prepared.basis != self.commits {
            return Err(EngineError::OutdatedPreparation {
                operation: prepared.operation.to_string(),
            });
        }
        let payee = prepared
            .change
            .cheque
            .as_ref()
            .map(|(cheque, _)| cheque.payee.to_string());
        self.ledger.commit(prepared.change)?;
        self.commits += 1;
        self.last_applied = Some(prepared.now);

        let settlement = prepared.settlement;
        debug!(
            operation = prepared.operation,
            payee = payee.as_deref().unwrap_or("-"),
            transfers = settlement.transfers.len(),
            open_cheques = %settlement.open_cheques,
            owner_credit = %settlement.owner_credit,
            "operation committed"
        );
        Ok(settlement)
    }

    /// Escrow `amount` for `payee`, claimable for `validity_window_hours`.
    pub fn draw_cheque(
        &mut self,
        caller: &Account,
        payee: &Account,
        amount: Amount,
        validity_window_hours: u32,
        attached: Amount,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        let operation = Operation::DrawCheque {
            payee: payee.clone(),
            amount,
            validity_window_hours,
        };
        self.apply(caller, &operation, attached, now)
    }

    /// Add `amount` to `payee`'s active cheque.
    pub fn increase_cheque_value(
        &mut self,
        caller: &Account,
        payee: &Account,
        amount: Amount,
        attached: Amount,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        let operation = Operation::IncreaseChequeValue {
            payee: payee.clone(),
            amount,
        };
        self.apply(caller, &operation, attached, now)
    }

    /// Refund `amount` of `payee`'s active cheque to the owner.
    pub fn reduce_cheque_value(
        &mut self,
        caller: &Account,
        payee: &Account,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        let operation = Operation::ReduceChequeValue {
            payee: payee.clone(),
            amount,
        };
        self.apply(caller, &operation, Amount::ZERO, now)
    }

    /// Cancel `payee`'s active cheque and refund it in full.
    pub fn cancel_drawn_cheque(
        &mut self,
        caller: &Account,
        payee: &Account,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        let operation = Operation::CancelDrawnCheque {
            payee: payee.clone(),
        };
        self.apply(caller, &operation, Amount::ZERO, now)
    }

    /// Refund `payee`'s expired, unclaimed cheque in full.
    pub fn reclaim_expired(
        &mut self,
        caller: &Account,
        payee: &Account,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        let operation = Operation::ReclaimExpired {
            payee: payee.clone(),
        };
        self.apply(caller, &operation, Amount::ZERO, now)
    }

    /// Pay the caller's active cheque to the caller.
    pub fn cashout(&mut self, caller: &Account, now: Timestamp) -> Result<Settlement, EngineError> {
        self.apply(caller, &Operation::Cashout, Amount::ZERO, now)
    }

    /// Pay `amount` of retained owner credit to the owner.
    pub fn withdraw_credit(
        &mut self,
        caller: &Account,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Settlement, EngineError> {
        self.apply(caller, &Operation::WithdrawCredit { amount }, Amount::ZERO, now)
    }

    fn guard_time(&self, now: Timestamp) -> Result<(), EngineError> {
        match self.last_applied {
            Some(last) if now < last => Err(EngineError::StaleTimestamp {
                now: now.to_string(),
                last: last.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn guard_owner(&self, caller: &Account, operation: &Operation) -> Result<(), EngineError> {
        if caller != &self.owner {
            return Err(EngineError::Unauthorized {
                caller: caller.to_string(),
                operation: operation.name().to_string(),
            });
        }
        Ok(())
    }

    fn guard_unpayable(&self, operation: &Operation, attached: Amount) -> Result<(), EngineError> {
        if !attached.is_zero() {
            return Err(EngineError::UnexpectedAttachedValue {
                operation: operation.name().to_string(),
                attached: attached.to_string(),
            });
        }
        Ok(())
    }

    /// Decide how `required` is covered by `attached` under the configured
    /// excess value policy.
    fn fund(
        &self,
        operation: &Operation,
        required: Amount,
        attached: Amount,
    ) -> Result<Funding, EngineError> {
        if attached >= required {
            return Ok(Funding {
                excess: attached.saturating_sub(required),
                credit_used: Amount::ZERO,
            });
        }
        let shortfall = required.saturating_sub(attached);
        let credit = self.ledger.owner_credit();
        let covered_by_credit =
            self.config.excess_value_policy == ExcessValuePolicy::Retain && shortfall <= credit;
        if !covered_by_credit {
            return Err(EngineError::InsufficientAttachedValue {
                operation: operation.name().to_string(),
                required: required.to_string(),
                attached: attached.to_string(),
                credit: credit.to_string(),
            });
        }
        Ok(Funding {
            excess: Amount::ZERO,
            credit_used: shortfall,
        })
    }

    /// The change for a draw or increase that moved `entry.moved` into escrow.
    fn funded(
        &self,
        operation: &Operation,
        cheque: Cheque,
        entry: ChequeTransitionRecord,
        attached: Amount,
    ) -> Result<Effect, EngineError> {
        let amount = entry.moved;
        let funding = self.fund(operation, amount, attached)?;
        let mut transfers = Vec::new();
        let owner_credit = match self.config.excess_value_policy {
            ExcessValuePolicy::Refund => {
                if !funding.excess.is_zero() {
                    transfers.push(ValueTransfer {
                        to: self.owner.clone(),
                        amount: funding.excess,
                        reason: TransferReason::ExcessRefund,
                    });
                }
                Adjustment::NONE
            }
            ExcessValuePolicy::Retain if !funding.credit_used.is_zero() => {
                Adjustment::Decrease(funding.credit_used)
            }
            ExcessValuePolicy::Retain => Adjustment::Increase(funding.excess),
        };
        let outflow = transfers.iter().map(|t| t.amount).sum();

        let change = LedgerChange {
            cheque: Some((cheque, entry)),
            open_cheques: Adjustment::Increase(amount),
            owner_credit,
            inflow: attached,
            outflow,
        };
        Ok((change, transfers))
    }

    /// The change for a transition that released `entry.moved` from escrow
    /// to its recipient: the payee for a payout, otherwise the owner.
    fn released(
        &self,
        cheque: Cheque,
        entry: ChequeTransitionRecord,
        reason: TransferReason,
    ) -> Effect {
        let to = match reason {
            TransferReason::Payout => cheque.payee.clone(),
            _ => self.owner.clone(),
        };
        let amount = entry.moved;
        let change = LedgerChange {
            cheque: Some((cheque, entry)),
            open_cheques: Adjustment::Decrease(amount),
            owner_credit: Adjustment::NONE,
            inflow: Amount::ZERO,
            outflow: amount,
        };
        (change, vec![ValueTransfer { to, amount, reason }])
    }

    /// The change for paying `amount` of owner credit back to the owner.
    fn withdrawal(&self, amount: Amount) -> Result<Effect, EngineError> {
        if amount.is_zero() {
            return Err(ChequeError::InvalidAmount {
                operation: "withdraw_credit".to_string(),
            }
            .into());
        }
        let available = self.ledger.owner_credit();
        if amount > available {
            return Err(EngineError::InsufficientOwnerCredit {
                requested: amount.to_string(),
                available: available.to_string(),
            });
        }
        let change = LedgerChange {
            cheque: None,
            open_cheques: Adjustment::NONE,
            owner_credit: Adjustment::Decrease(amount),
            inflow: Amount::ZERO,
            outflow: amount,
        };
        let transfer = ValueTransfer {
            to: self.owner.clone(),
            amount,
            reason: TransferReason::CreditWithdrawal,
        };
        Ok((change, vec![transfer]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheque_state::ChequeStatus;
    use chrono::Duration;

    const OWNER: &str = "0x00000000000000000000000000000000000000aa";
    const PAYEE: &str = "0x00000000000000000000000000000000000000bb";

    fn owner() -> Account {
        Account::new(OWNER).unwrap()
    }

    fn payee() -> Account {
        Account::new(PAYEE).unwrap()
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::parse("2026-03-01T09:00:00Z")
            .unwrap()
            .checked_add(Duration::seconds(secs))
            .unwrap()
    }

    fn engine(policy: ExcessValuePolicy) -> EscrowEngine {
        EscrowEngine::new(
            owner(),
            EngineConfig::default().with_excess_value_policy(policy),
        )
    }

    fn amt(raw: u128) -> Amount {
        Amount::new(raw)
    }

    #[test]
    fn draw_refunds_excess_under_refund_policy() {
        let mut e = engine(ExcessValuePolicy::Refund);
        let s = e
            .draw_cheque(&owner(), &payee(), amt(10), 1, amt(100), at(0))
            .unwrap();
        assert_eq!(s.open_cheques, amt(10));
        assert_eq!(s.transfers.len(), 1);
        assert_eq!(s.transfers[0].reason, TransferReason::ExcessRefund);
        assert_eq!(s.paid_to(&owner()), amt(90));
        assert_eq!(e.held_balance(), amt(10));
        assert!(e.ledger().verify().is_ok());
    }

    #[test]
    fn draw_retains_excess_under_retain_policy() {
        let mut e = engine(ExcessValuePolicy::Retain);
        let s = e
            .draw_cheque(&owner(), &payee(), amt(10), 1, amt(100), at(0))
            .unwrap();
        assert!(s.transfers.is_empty());
        assert_eq!(s.owner_credit, amt(90));
        assert_eq!(e.held_balance(), amt(100));
    }

    #[test]
    fn retained_credit_covers_shortfall() {
        let mut e = engine(ExcessValuePolicy::Retain);
        e.draw_cheque(&owner(), &payee(), amt(10), 1, amt(100), at(0))
            .unwrap();
        let s = e
            .increase_cheque_value(&owner(), &payee(), amt(50), amt(0), at(1))
            .unwrap();
        assert_eq!(s.open_cheques, amt(60));
        assert_eq!(s.owner_credit, amt(40));
        assert_eq!(e.held_balance(), amt(100));
    }

    #[test]
    fn shortfall_rejected_under_refund_policy() {
        let mut e = engine(ExcessValuePolicy::Refund);
        let err = e
            .draw_cheque(&owner(), &payee(), amt(10), 1, amt(9), at(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientAttachedValue { .. }));
        assert_eq!(e.cheque_of(&payee()).status, ChequeStatus::None);
        assert!(e.open_cheques().is_zero());
        assert!(e.last_applied().is_none());
    }

    #[test]
    fn shortfall_beyond_credit_rejected() {
        let mut e = engine(ExcessValuePolicy::Retain);
        e.draw_cheque(&owner(), &payee(), amt(10), 1, amt(15), at(0))
            .unwrap();
        let err = e
            .increase_cheque_value(&owner(), &payee(), amt(10), amt(4), at(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientAttachedValue { .. }));
        assert_eq!(e.owner_credit(), amt(5));
        assert_eq!(e.open_cheques(), amt(10));
    }

    #[test]
    fn non_owner_cannot_draw() {
        let mut e = engine(ExcessValuePolicy::Refund);
        let err = e
            .draw_cheque(&payee(), &payee(), amt(10), 1, amt(10), at(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized { .. }));
    }

    #[test]
    fn non_owner_cannot_reduce_or_cancel() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(10), 1, amt(10), at(0))
            .unwrap();
        assert!(matches!(
            e.reduce_cheque_value(&payee(), &payee(), amt(1), at(1)),
            Err(EngineError::Unauthorized { .. })
        ));
        assert!(matches!(
            e.cancel_drawn_cheque(&payee(), &payee(), at(1)),
            Err(EngineError::Unauthorized { .. })
        ));
        assert_eq!(e.open_cheques(), amt(10));
    }

    #[test]
    fn draw_then_cancel_restores_aggregate() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(10), 1, amt(10), at(0))
            .unwrap();
        let s = e.cancel_drawn_cheque(&owner(), &payee(), at(60)).unwrap();
        assert_eq!(s.paid_to(&owner()), amt(10));
        assert!(e.open_cheques().is_zero());
        assert!(e.held_balance().is_zero());
        assert_eq!(e.cheque_of(&payee()).status, ChequeStatus::Cancelled);
    }

    #[test]
    fn cashout_pays_caller() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(0))
            .unwrap();
        let s = e.cashout(&payee(), at(3600)).unwrap();
        assert_eq!(s.paid_to(&payee()), amt(30));
        assert_eq!(s.transfers[0].reason, TransferReason::Payout);
        assert!(s.open_cheques.is_zero());
    }

    #[test]
    fn cashout_without_cheque_rejected() {
        let mut e = engine(ExcessValuePolicy::Refund);
        let err = e.cashout(&payee(), at(0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Cheque(ChequeError::NoActiveCheque { .. })
        ));
    }

    #[test]
    fn reclaim_after_expiry() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(0))
            .unwrap();
        assert!(e.reclaim_expired(&owner(), &payee(), at(3600)).is_err());
        let s = e.reclaim_expired(&owner(), &payee(), at(3601)).unwrap();
        assert_eq!(s.paid_to(&owner()), amt(30));
        assert_eq!(e.cheque_of(&payee()).status, ChequeStatus::Reclaimed);
    }

    #[test]
    fn stale_timestamp_rejected() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(100))
            .unwrap();
        let err = e.cashout(&payee(), at(99)).unwrap_err();
        assert!(matches!(err, EngineError::StaleTimestamp { .. }));
        assert!(e.cashout(&payee(), at(100)).is_ok());
    }

    #[test]
    fn attached_value_on_unpayable_operation_rejected() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(0))
            .unwrap();
        let err = e
            .apply(&payee(), &Operation::Cashout, amt(1), at(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnexpectedAttachedValue { .. }));
        assert!(e.cheque_of(&payee()).status.is_active());
    }

    #[test]
    fn withdraw_credit_pays_owner() {
        let mut e = engine(ExcessValuePolicy::Retain);
        e.draw_cheque(&owner(), &payee(), amt(10), 1, amt(100), at(0))
            .unwrap();
        let err = e.withdraw_credit(&owner(), amt(91), at(1)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientOwnerCredit { .. }));
        let s = e.withdraw_credit(&owner(), amt(90), at(1)).unwrap();
        assert_eq!(s.transfers[0].reason, TransferReason::CreditWithdrawal);
        assert!(e.owner_credit().is_zero());
        assert_eq!(e.held_balance(), amt(10));
    }

    #[test]
    fn withdraw_zero_rejected() {
        let mut e = engine(ExcessValuePolicy::Retain);
        let err = e.withdraw_credit(&owner(), amt(0), at(0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Cheque(ChequeError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn apply_dispatches_scripted_operations() {
        let mut e = engine(ExcessValuePolicy::Refund);
        let draw = Operation::DrawCheque {
            payee: payee(),
            amount: amt(20),
            validity_window_hours: 1,
        };
        e.apply(&owner(), &draw, amt(20), at(0)).unwrap();
        let reduce = Operation::ReduceChequeValue {
            payee: payee(),
            amount: amt(20),
        };
        let s = e.apply(&owner(), &reduce, amt(0), at(1)).unwrap();
        assert!(s.open_cheques.is_zero());
        assert_eq!(e.cheque_of(&payee()).status, ChequeStatus::Cleared);
    }

    #[test]
    fn prepare_leaves_engine_untouched() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(0))
            .unwrap();
        let prepared = e.prepare(&payee(), &Operation::Cashout, amt(0), at(10)).unwrap();
        assert_eq!(prepared.settlement().paid_to(&payee()), amt(30));
        assert!(prepared.settlement().open_cheques.is_zero());
        assert_eq!(prepared.timestamp(), at(10));
        assert_eq!(e.open_cheques(), amt(30));
        assert_eq!(e.last_applied(), Some(at(0)));

        let settlement = e.commit(prepared).unwrap();
        assert!(settlement.open_cheques.is_zero());
        assert_eq!(e.cheque_of(&payee()).status, ChequeStatus::CashedOut);
    }

    #[test]
    fn outdated_preparation_rejected() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(0))
            .unwrap();
        let cancel = Operation::CancelDrawnCheque { payee: payee() };
        let first = e.prepare(&owner(), &cancel, amt(0), at(1)).unwrap();
        let second = e.prepare(&owner(), &cancel, amt(0), at(1)).unwrap();
        e.commit(first).unwrap();

        let err = e.commit(second).unwrap_err();
        assert!(matches!(err, EngineError::OutdatedPreparation { .. }));
        assert!(e.held_balance().is_zero());
        assert_eq!(e.history_of(&payee()).len(), 2);
    }

    #[test]
    fn owner_only_operations_follow_operation_policy() {
        let e = engine(ExcessValuePolicy::Retain);
        let stranger = Account::new("0x00000000000000000000000000000000000000cc").unwrap();
        let operations = [
            Operation::DrawCheque {
                payee: payee(),
                amount: amt(1),
                validity_window_hours: 1,
            },
            Operation::IncreaseChequeValue {
                payee: payee(),
                amount: amt(1),
            },
            Operation::ReduceChequeValue {
                payee: payee(),
                amount: amt(1),
            },
            Operation::CancelDrawnCheque { payee: payee() },
            Operation::ReclaimExpired { payee: payee() },
            Operation::WithdrawCredit { amount: amt(1) },
            Operation::Cashout,
        ];
        for operation in &operations {
            let unauthorized = matches!(
                e.prepare(&stranger, operation, amt(0), at(0)),
                Err(EngineError::Unauthorized { .. })
            );
            assert_eq!(unauthorized, operation.is_owner_only(), "{operation}");

            let unexpected = matches!(
                e.prepare(&owner(), operation, amt(1), at(0)),
                Err(EngineError::UnexpectedAttachedValue { .. })
            );
            assert_eq!(unexpected, !operation.is_payable(), "{operation}");
        }
    }

    #[test]
    fn history_records_every_committed_transition() {
        let mut e = engine(ExcessValuePolicy::Refund);
        e.draw_cheque(&owner(), &payee(), amt(30), 1, amt(30), at(0))
            .unwrap();
        e.reduce_cheque_value(&owner(), &payee(), amt(10), at(1))
            .unwrap();
        assert!(e.cashout(&payee(), at(7200)).is_err());
        e.reclaim_expired(&owner(), &payee(), at(7200)).unwrap();

        let history = e.history_of(&payee());
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].balance_after, amt(20));
        assert_eq!(history[2].to_status, ChequeStatus::Reclaimed);
        assert_eq!(history[2].moved, amt(20));
    }

    #[test]
    fn zero_validity_window_rejected() {
        let mut e = engine(ExcessValuePolicy::Refund);
        let err = e
            .draw_cheque(&owner(), &payee(), amt(20), 0, amt(20), at(0))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Cheque(ChequeError::InvalidValidityWindow { hours: 0 })
        ));
    }
}
