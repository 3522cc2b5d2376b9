//! # Operations and Settlements
//!
//! [`Operation`] is the scriptable form of every state-changing call the
//! engine accepts. [`Settlement`] is what an accepted operation produces:
//! the value that leaves escrow and the aggregate balances afterwards.

use serde::{Deserialize, Serialize};

use cheque_core::{Account, Amount};

/// A state-changing request to the escrow engine.
///
/// Serialized with an `op` tag so scripts read as
/// `{"op": "draw_cheque", "payee": "0x…", "amount": "100", "validity_window_hours": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Escrow a fresh cheque for `payee`. Payable.
    DrawCheque {
        payee: Account,
        amount: Amount,
        validity_window_hours: u32,
    },
    /// Top up an active cheque. Payable.
    IncreaseChequeValue { payee: Account, amount: Amount },
    /// Refund part of an active cheque to the owner.
    ReduceChequeValue { payee: Account, amount: Amount },
    /// Cancel an active cheque inside the cancellation window.
    CancelDrawnCheque { payee: Account },
    /// Refund an expired, unclaimed cheque to the owner.
    ReclaimExpired { payee: Account },
    /// Pay retained owner credit back to the owner.
    WithdrawCredit { amount: Amount },
    /// Claim the caller's own active cheque.
    Cashout,
}

impl Operation {
    /// The canonical operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DrawCheque { .. } => "draw_cheque",
            Self::IncreaseChequeValue { .. } => "increase_cheque_value",
            Self::ReduceChequeValue { .. } => "reduce_cheque_value",
            Self::CancelDrawnCheque { .. } => "cancel_drawn_cheque",
            Self::ReclaimExpired { .. } => "reclaim_expired",
            Self::WithdrawCredit { .. } => "withdraw_credit",
            Self::Cashout => "cashout",
        }
    }

    /// Whether the operation accepts attached value.
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            Self::DrawCheque { .. } | Self::IncreaseChequeValue { .. }
        )
    }

    /// Whether only the owner may submit the operation.
    pub fn is_owner_only(&self) -> bool {
        !matches!(self, Self::Cashout)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why value left escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    /// Cheque paid to its payee.
    Payout,
    /// Escrow returned to the owner by reduce, cancel, or reclaim.
    Refund,
    /// Attached value beyond the operation amount returned to the owner.
    ExcessRefund,
    /// Retained owner credit withdrawn.
    CreditWithdrawal,
}

/// A single transfer out of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTransfer {
    pub to: Account,
    pub amount: Amount,
    pub reason: TransferReason,
}

/// The outcome of an accepted operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settlement {
    /// Transfers out of the contract, in order.
    pub transfers: Vec<ValueTransfer>,
    /// `open_cheques` after the operation.
    pub open_cheques: Amount,
    /// Owner credit after the operation.
    pub owner_credit: Amount,
}

impl Settlement {
    /// Total value paid to `account` by this settlement.
    pub fn paid_to(&self, account: &Account) -> Amount {
        self.transfers
            .iter()
            .filter(|t| &t.to == account)
            .map(|t| t.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payee() -> Account {
        Account::new("0x2222222222222222222222222222222222222222").unwrap()
    }

    #[test]
    fn draw_script_form() {
        let json = r#"{"op":"draw_cheque","payee":"0x2222222222222222222222222222222222222222","amount":"10000000000000000","validity_window_hours":1}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(
            op,
            Operation::DrawCheque {
                payee: payee(),
                amount: Amount::new(10_000_000_000_000_000),
                validity_window_hours: 1,
            }
        );
        assert!(op.is_payable());
        assert!(op.is_owner_only());
    }

    #[test]
    fn cashout_script_form() {
        let op: Operation = serde_json::from_str(r#"{"op":"cashout"}"#).unwrap();
        assert_eq!(op, Operation::Cashout);
        assert!(!op.is_payable());
        assert!(!op.is_owner_only());
        assert_eq!(op.to_string(), "cashout");
    }

    #[test]
    fn unknown_op_rejected() {
        assert!(serde_json::from_str::<Operation>(r#"{"op":"mint"}"#).is_err());
    }

    #[test]
    fn settlement_paid_to() {
        let owner = Account::new("0x1111111111111111111111111111111111111111").unwrap();
        let settlement = Settlement {
            transfers: vec![
                ValueTransfer {
                    to: owner.clone(),
                    amount: Amount::new(30),
                    reason: TransferReason::ExcessRefund,
                },
                ValueTransfer {
                    to: payee(),
                    amount: Amount::new(70),
                    reason: TransferReason::Payout,
                },
            ],
            open_cheques: Amount::ZERO,
            owner_credit: Amount::ZERO,
        };
        assert_eq!(settlement.paid_to(&owner), Amount::new(30));
        assert_eq!(settlement.paid_to(&payee()), Amount::new(70));
    }
}
