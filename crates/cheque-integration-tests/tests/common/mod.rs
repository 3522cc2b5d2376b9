//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chrono::Duration;

use cheque_client::{ClientConfig, InMemoryLedger};
use cheque_core::{Account, Amount, Timestamp};
use cheque_engine::{EngineConfig, EscrowEngine, ExcessValuePolicy, Operation};

pub const OWNER: &str = "0x5a0e4b0e1c8f3d2a6b7c9d0e1f2a3b4c5d6e7f80";
pub const PAYEE: &str = "0x9b1d2c3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b91";
pub const STRANGER: &str = "0x00000000000000000000000000000000000000cc";

/// One hundredth of a unit, in the smallest denomination.
pub const CENT: u128 = 10_000_000_000_000_000;

pub fn owner() -> Account {
    Account::new(OWNER).unwrap()
}

pub fn payee() -> Account {
    Account::new(PAYEE).unwrap()
}

pub fn stranger() -> Account {
    Account::new(STRANGER).unwrap()
}

pub fn genesis() -> Timestamp {
    Timestamp::parse("2026-03-01T09:00:00Z").unwrap()
}

pub fn at(secs: i64) -> Timestamp {
    genesis().checked_add(Duration::seconds(secs)).unwrap()
}

pub fn cents(n: u128) -> Amount {
    Amount::new(n * CENT)
}

pub fn engine() -> EscrowEngine {
    EscrowEngine::new(owner(), EngineConfig::default())
}

pub fn engine_with(policy: ExcessValuePolicy) -> EscrowEngine {
    EscrowEngine::new(
        owner(),
        EngineConfig::default().with_excess_value_policy(policy),
    )
}

/// A ledger with the owner funded with one whole unit.
pub fn funded_ledger(policy: ExcessValuePolicy) -> InMemoryLedger {
    let ledger = InMemoryLedger::new(
        owner(),
        EngineConfig::default().with_excess_value_policy(policy),
        ClientConfig::starting_at(genesis()),
    );
    ledger.fund(&owner(), cents(100)).unwrap();
    ledger
}

pub fn draw_op(payee: &Account, amount: Amount, hours: u32) -> Operation {
    Operation::DrawCheque {
        payee: payee.clone(),
        amount,
        validity_window_hours: hours,
    }
}
