//! # Escrow Ledger
//!
//! Aggregate escrow state: one cheque record per payee, the open cheque
//! total, retained owner credit, and the total value held. Transition
//! entries go to a per-payee history that is only ever appended to, so the
//! records themselves stay small. Mutators are
//! crate-private; the engine changes state only through [`EscrowLedger::commit`],
//! which applies a [`LedgerChange`], re-verifies the balance identities,
//! and restores the prior state if they no longer hold.
//!
//! Identities checked after every commit:
//!
//! - `open_cheques` equals the sum of amounts over active cheques.
//! - Records that are not active carry a zero amount.
//! - `held_balance == open_cheques + owner_credit`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cheque_core::{Account, Amount};
use cheque_state::{Cheque, ChequeTransitionRecord};

use crate::error::EngineError;

/// A signed change to one of the ledger's aggregate balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Add to the balance.
    Increase(Amount),
    /// Subtract from the balance.
    Decrease(Amount),
}

impl Adjustment {
    /// No change.
    pub const NONE: Adjustment = Adjustment::Increase(Amount::ZERO);

    fn apply(self, field: &str, base: Amount) -> Result<Amount, EngineError> {
        let result = match self {
            Self::Increase(delta) => base.checked_add(delta),
            Self::Decrease(delta) => base.checked_sub(delta),
        };
        result.map_err(|e| EngineError::InvariantViolation(format!("{field}: {e}")))
    }
}

/// One atomic ledger mutation: a replacement cheque record, the history
/// entry for it, and the balance adjustments that go with it.
#[derive(Debug, Clone)]
pub(crate) struct LedgerChange {
    pub cheque: Option<(Cheque, ChequeTransitionRecord)>,
    pub open_cheques: Adjustment,
    pub owner_credit: Adjustment,
    /// Value entering the contract with the submission.
    pub inflow: Amount,
    /// Value leaving the contract in the settlement.
    pub outflow: Amount,
}

struct Snapshot {
    payee: Option<Account>,
    previous: Option<Cheque>,
    open_cheques: Amount,
    owner_credit: Amount,
    held_balance: Amount,
}

/// Escrow state for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowLedger {
    cheques: BTreeMap<Account, Cheque>,
    history: BTreeMap<Account, Vec<ChequeTransitionRecord>>,
    open_cheques: Amount,
    owner_credit: Amount,
    held_balance: Amount,
}

impl EscrowLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `payee`. Payees never drawn for get a fresh record.
    pub fn get(&self, payee: &Account) -> Cheque {
        self.cheques
            .get(payee)
            .cloned()
            .unwrap_or_else(|| Cheque::new(payee.clone()))
    }

    /// Sum of amounts over active cheques.
    pub fn open_cheques(&self) -> Amount {
        self.open_cheques
    }

    /// Excess attached value retained for the owner.
    pub fn owner_credit(&self) -> Amount {
        self.owner_credit
    }

    /// Total value held by the contract.
    pub fn held_balance(&self) -> Amount {
        self.held_balance
    }

    /// Committed transitions of `payee`'s record, oldest first.
    pub fn history(&self, payee: &Account) -> &[ChequeTransitionRecord] {
        self.history.get(payee).map(Vec::as_slice).unwrap_or_default()
    }

    /// `open_cheques` and `owner_credit` as they would be after `change`.
    pub(crate) fn project(&self, change: &LedgerChange) -> Result<(Amount, Amount), EngineError> {
        let open_cheques = change.open_cheques.apply("open_cheques", self.open_cheques)?;
        let owner_credit = change.owner_credit.apply("owner_credit", self.owner_credit)?;
        Ok((open_cheques, owner_credit))
    }

    pub(crate) fn put(&mut self, cheque: Cheque) {
        self.cheques.insert(cheque.payee.clone(), cheque);
    }

    pub(crate) fn adjust_open_cheques(&mut self, delta: Adjustment) -> Result<(), EngineError> {
        self.open_cheques = delta.apply("open_cheques", self.open_cheques)?;
        Ok(())
    }

    pub(crate) fn adjust_owner_credit(&mut self, delta: Adjustment) -> Result<(), EngineError> {
        self.owner_credit = delta.apply("owner_credit", self.owner_credit)?;
        Ok(())
    }

    fn adjust_held_balance(&mut self, inflow: Amount, outflow: Amount) -> Result<(), EngineError> {
        let held = Adjustment::Increase(inflow).apply("held_balance", self.held_balance)?;
        self.held_balance = Adjustment::Decrease(outflow).apply("held_balance", held)?;
        Ok(())
    }

    /// Apply `change` atomically. On any error, including an identity that
    /// no longer holds afterwards, the ledger is restored to its prior state.
    pub(crate) fn commit(&mut self, mut change: LedgerChange) -> Result<(), EngineError> {
        let (record, entry) = change.cheque.take().unzip();
        let payee = record.as_ref().map(|c| c.payee.clone());
        let snapshot = Snapshot {
            previous: payee.as_ref().and_then(|p| self.cheques.get(p).cloned()),
            payee: payee.clone(),
            open_cheques: self.open_cheques,
            owner_credit: self.owner_credit,
            held_balance: self.held_balance,
        };
        if let Err(err) = self.apply_change(record, change) {
            self.restore(snapshot);
            return Err(err);
        }
        if let (Some(payee), Some(entry)) = (payee, entry) {
            self.history.entry(payee).or_default().push(entry);
        }
        Ok(())
    }

    fn apply_change(
        &mut self,
        record: Option<Cheque>,
        change: LedgerChange,
    ) -> Result<(), EngineError> {
        if let Some(cheque) = record {
            self.put(cheque);
        }
        self.adjust_open_cheques(change.open_cheques)?;
        self.adjust_owner_credit(change.owner_credit)?;
        self.adjust_held_balance(change.inflow, change.outflow)?;
        self.verify()
    }

    fn restore(&mut self, snapshot: Snapshot) {
        if let Some(payee) = snapshot.payee {
            match snapshot.previous {
                Some(previous) => {
                    self.cheques.insert(payee, previous);
                }
                None => {
                    self.cheques.remove(&payee);
                }
            }
        }
        self.open_cheques = snapshot.open_cheques;
        self.owner_credit = snapshot.owner_credit;
        self.held_balance = snapshot.held_balance;
    }

    /// Check the ledger's balance identities.
    pub fn verify(&self) -> Result<(), EngineError> {
        let mut active_total = Amount::ZERO;
        for cheque in self.cheques.values() {
            if cheque.status.is_active() {
                active_total = active_total
                    .checked_add(cheque.amount)
                    .map_err(|e| EngineError::InvariantViolation(e.to_string()))?;
            } else if !cheque.amount.is_zero() {
                return Err(EngineError::InvariantViolation(format!(
                    "{} cheque for {} carries {}",
                    cheque.status, cheque.payee, cheque.amount
                )));
            }
        }
        if active_total != self.open_cheques {
            return Err(EngineError::InvariantViolation(format!(
                "open_cheques is {} but active cheques total {}",
                self.open_cheques, active_total
            )));
        }
        let expected_held = self
            .open_cheques
            .checked_add(self.owner_credit)
            .map_err(|e| EngineError::InvariantViolation(e.to_string()))?;
        if expected_held != self.held_balance {
            return Err(EngineError::InvariantViolation(format!(
                "held_balance is {} but open_cheques + owner_credit is {}",
                self.held_balance, expected_held
            )));
        }
        Ok(())
    }
}
