//! # Ledger Client Interface
//!
//! [`LedgerClient`] abstracts over where cheque operations are executed.
//! The in-memory ledger implements it for tests and local replay; a client
//! for a live chain would implement it against its submission API.

use serde::{Deserialize, Serialize};

use cheque_core::{sha256_digest, Account, Amount, CanonicalBytes, ContentDigest, Timestamp};
use cheque_engine::{Operation, Settlement};
use cheque_state::{Cheque, ChequeTransitionRecord};

use crate::error::ClientError;

/// An operation submitted by `caller` with `attached_value` sent along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub caller: Account,
    pub operation: Operation,
    #[serde(default)]
    pub attached_value: Amount,
}

impl Submission {
    /// A submission with no attached value.
    pub fn new(caller: Account, operation: Operation) -> Self {
        Self {
            caller,
            operation,
            attached_value: Amount::ZERO,
        }
    }

    /// Attach `value` to the submission.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.attached_value = value;
        self
    }
}

/// The ledger's record of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Position in the ledger's total order, starting at 1.
    pub sequence: u64,
    /// Ledger time the operation was applied at.
    pub timestamp: Timestamp,
    pub caller: Account,
    pub operation: Operation,
    pub attached_value: Amount,
    pub settlement: Settlement,
    /// SHA-256 over the canonical JSON of every field above.
    pub receipt_digest: ContentDigest,
}

/// The fields a receipt digest is taken over.
#[derive(Serialize)]
struct ReceiptBody<'a> {
    sequence: u64,
    timestamp: &'a Timestamp,
    caller: &'a Account,
    operation: &'a Operation,
    attached_value: &'a Amount,
    settlement: &'a Settlement,
}

impl Confirmation {
    /// Build a confirmation and compute its receipt digest.
    pub fn seal(
        sequence: u64,
        timestamp: Timestamp,
        submission: &Submission,
        settlement: Settlement,
    ) -> Result<Self, ClientError> {
        let receipt_digest = receipt_digest(&ReceiptBody {
            sequence,
            timestamp: &timestamp,
            caller: &submission.caller,
            operation: &submission.operation,
            attached_value: &submission.attached_value,
            settlement: &settlement,
        })?;
        Ok(Self {
            sequence,
            timestamp,
            caller: submission.caller.clone(),
            operation: submission.operation.clone(),
            attached_value: submission.attached_value,
            settlement,
            receipt_digest,
        })
    }

    /// Recompute the receipt digest and compare it with the stored one.
    pub fn verify_digest(&self) -> Result<bool, ClientError> {
        let recomputed = receipt_digest(&ReceiptBody {
            sequence: self.sequence,
            timestamp: &self.timestamp,
            caller: &self.caller,
            operation: &self.operation,
            attached_value: &self.attached_value,
            settlement: &self.settlement,
        })?;
        Ok(recomputed == self.receipt_digest)
    }
}

fn receipt_digest(body: &ReceiptBody<'_>) -> Result<ContentDigest, ClientError> {
    let canonical = CanonicalBytes::new(body)?;
    Ok(sha256_digest(&canonical))
}

/// A ledger that accepts cheque operations.
///
/// Implementations must be `Send + Sync` so one client can be shared across
/// threads behind an `Arc`.
pub trait LedgerClient: Send + Sync {
    /// Apply `submission` atomically. On rejection nothing changes.
    fn submit(&self, submission: &Submission) -> Result<Confirmation, ClientError>;

    /// Sum of amounts over active cheques.
    fn open_cheques(&self) -> Amount;

    /// The cheque record for `payee`.
    fn cheque_of(&self, payee: &Account) -> Cheque;

    /// Committed transitions of `payee`'s record, oldest first.
    fn history_of(&self, payee: &Account) -> Vec<ChequeTransitionRecord>;

    /// Human-readable name of the implementation.
    fn client_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheque_engine::{TransferReason, ValueTransfer};

    fn account(c: char) -> Account {
        Account::new(format!("0x{}", c.to_string().repeat(40))).unwrap()
    }

    fn confirmation() -> Confirmation {
        let submission = Submission::new(account('b'), Operation::Cashout);
        let settlement = Settlement {
            transfers: vec![ValueTransfer {
                to: account('b'),
                amount: Amount::new(30),
                reason: TransferReason::Payout,
            }],
            open_cheques: Amount::ZERO,
            owner_credit: Amount::ZERO,
        };
        Confirmation::seal(
            7,
            Timestamp::parse("2026-03-01T09:00:00Z").unwrap(),
            &submission,
            settlement,
        )
        .unwrap()
    }

    #[test]
    fn sealed_confirmation_verifies() {
        assert!(confirmation().verify_digest().unwrap());
    }

    #[test]
    fn tampered_confirmation_fails_verification() {
        let mut c = confirmation();
        c.settlement.transfers[0].amount = Amount::new(31);
        assert!(!c.verify_digest().unwrap());
    }

    #[test]
    fn digest_depends_on_sequence() {
        let a = confirmation();
        let mut b = a.clone();
        b.sequence = 8;
        assert!(!b.verify_digest().unwrap());
    }

    #[test]
    fn submission_defaults_to_no_value() {
        let json = r#"{"caller":"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb","operation":{"op":"cashout"}}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert!(submission.attached_value.is_zero());
        let paid = submission.with_value(Amount::new(5));
        assert_eq!(paid.attached_value, Amount::new(5));
    }
}
