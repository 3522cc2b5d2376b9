//! # In-Memory Ledger
//!
//! A single-process ledger around an [`EscrowEngine`]. Submissions are
//! serialized under a write lock; each accepted submission gets the next
//! sequence number and the next block time. Reads take the read lock and
//! see the latest confirmed state.
//!
//! A submission is checked against the caller's wallet, prepared by the
//! engine, and sealed into a confirmation before anything is written. Only
//! then is the prepared change committed and the touched wallets updated,
//! so a rejection at any step leaves the ledger exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::RwLock;
use tracing::{info, warn};

use cheque_core::{Account, Amount, Timestamp};
use cheque_engine::{EngineConfig, EscrowEngine, Settlement};
use cheque_state::{Cheque, ChequeTransitionRecord};

use crate::client::{Confirmation, LedgerClient, Submission};
use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug)]
struct LedgerState {
    engine: EscrowEngine,
    wallets: BTreeMap<Account, Amount>,
    sequence: u64,
    clock: Timestamp,
    confirmations: Vec<Confirmation>,
}

/// Thread-safe in-memory ledger. Clones share the same state.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    block_interval: Duration,
}

impl InMemoryLedger {
    /// A ledger for `owner` with empty wallets.
    pub fn new(owner: Account, engine_config: EngineConfig, config: ClientConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                engine: EscrowEngine::new(owner, engine_config),
                wallets: BTreeMap::new(),
                sequence: 0,
                clock: config.genesis_time,
                confirmations: Vec::new(),
            })),
            block_interval: Duration::seconds(i64::from(config.block_interval_secs)),
        }
    }

    /// Credit `amount` to `account`'s wallet outside of any operation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Balance`] if total supply would overflow.
    pub fn fund(&self, account: &Account, amount: Amount) -> Result<(), ClientError> {
        let mut state = self.state.write();
        total_supply(&state).checked_add(amount)?;
        let balance = state.wallets.entry(account.clone()).or_default();
        *balance = balance.checked_add(amount)?;
        Ok(())
    }

    /// Wallet balance of `account`.
    pub fn balance_of(&self, account: &Account) -> Amount {
        self.state
            .read()
            .wallets
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Sum of all wallet balances plus the value the contract holds.
    pub fn total_supply(&self) -> Amount {
        total_supply(&self.state.read())
    }

    /// Move the ledger clock forward by `by`. Negative durations are ignored.
    pub fn advance(&self, by: Duration) {
        if by <= Duration::zero() {
            return;
        }
        let mut state = self.state.write();
        if let Some(next) = state.clock.checked_add(by) {
            state.clock = next;
        }
    }

    /// Current ledger time.
    pub fn now(&self) -> Timestamp {
        self.state.read().clock
    }

    /// Number of accepted submissions.
    pub fn sequence(&self) -> u64 {
        self.state.read().sequence
    }

    /// The owner account.
    pub fn owner(&self) -> Account {
        self.state.read().engine.owner().clone()
    }

    /// Retained owner credit.
    pub fn owner_credit(&self) -> Amount {
        self.state.read().engine.owner_credit()
    }

    /// Total value held by the contract.
    pub fn held_balance(&self) -> Amount {
        self.state.read().engine.held_balance()
    }

    /// A copy of every confirmation so far, in sequence order.
    pub fn confirmations(&self) -> Vec<Confirmation> {
        self.state.read().confirmations.clone()
    }

    /// The confirmation with sequence number `sequence`.
    pub fn confirmation(&self, sequence: u64) -> Option<Confirmation> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.state.read().confirmations.get(index).cloned()
    }

    /// Run the engine's ledger identity check against the current state.
    pub fn verify(&self) -> Result<(), ClientError> {
        self.state
            .read()
            .engine
            .ledger()
            .verify()
            .map_err(ClientError::Invariant)
    }
}

impl LedgerClient for InMemoryLedger {
    fn submit(&self, submission: &Submission) -> Result<Confirmation, ClientError> {
        let mut state = self.state.write();
        match apply(&mut state, submission, self.block_interval) {
            Ok(confirmation) => {
                info!(
                    sequence = confirmation.sequence,
                    caller = %confirmation.caller,
                    operation = %confirmation.operation,
                    open_cheques = %confirmation.settlement.open_cheques,
                    receipt = %confirmation.receipt_digest,
                    "operation confirmed"
                );
                Ok(confirmation)
            }
            Err(err) => {
                warn!(
                    caller = %submission.caller,
                    operation = %submission.operation,
                    error = %err,
                    "operation rejected"
                );
                Err(err)
            }
        }
    }

    fn open_cheques(&self) -> Amount {
        self.state.read().engine.open_cheques()
    }

    fn cheque_of(&self, payee: &Account) -> Cheque {
        self.state.read().engine.cheque_of(payee)
    }

    fn history_of(&self, payee: &Account) -> Vec<ChequeTransitionRecord> {
        self.state.read().engine.history_of(payee).to_vec()
    }

    fn client_name(&self) -> &str {
        "in-memory"
    }
}

fn apply(
    state: &mut LedgerState,
    submission: &Submission,
    block_interval: Duration,
) -> Result<Confirmation, ClientError> {
    let caller = &submission.caller;
    let attached = submission.attached_value;
    let balance = state.wallets.get(caller).copied().unwrap_or_default();
    if balance < attached {
        return Err(ClientError::InsufficientFunds {
            account: caller.to_string(),
            balance: balance.to_string(),
            required: attached.to_string(),
        });
    }

    let now = state.clock.checked_add(block_interval).unwrap_or(state.clock);
    let prepared = state
        .engine
        .prepare(caller, &submission.operation, attached, now)?;
    let wallets = wallet_updates(
        &state.wallets,
        caller,
        balance.checked_sub(attached)?,
        prepared.settlement(),
    )?;
    let confirmation = Confirmation::seal(
        state.sequence + 1,
        now,
        submission,
        prepared.settlement().clone(),
    )?;

    state.engine.commit(prepared)?;
    state.wallets.extend(wallets);
    state.sequence = confirmation.sequence;
    state.clock = now;
    state.confirmations.push(confirmation.clone());
    Ok(confirmation)
}

/// New balances for the caller and every transfer recipient.
fn wallet_updates(
    wallets: &BTreeMap<Account, Amount>,
    caller: &Account,
    caller_balance: Amount,
    settlement: &Settlement,
) -> Result<BTreeMap<Account, Amount>, ClientError> {
    let mut updated = BTreeMap::from([(caller.clone(), caller_balance)]);
    for transfer in &settlement.transfers {
        let current = updated
            .get(&transfer.to)
            .or_else(|| wallets.get(&transfer.to))
            .copied()
            .unwrap_or_default();
        updated.insert(transfer.to.clone(), current.checked_add(transfer.amount)?);
    }
    Ok(updated)
}

fn total_supply(state: &LedgerState) -> Amount {
    let wallets: Amount = state.wallets.values().copied().sum();
    wallets
        .checked_add(state.engine.held_balance())
        .unwrap_or(Amount::new(u128::MAX))
}
