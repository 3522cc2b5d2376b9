//! # Operation Scripts
//!
//! A script names the owner, seeds wallet balances, and lists the
//! submissions to apply in order. Both `cheque scenario` and `cheque replay`
//! run through [`run_script`].
//!
//! ```json
//! {
//!   "owner": "0x00000000000000000000000000000000000000aa",
//!   "balances": { "0x00000000000000000000000000000000000000aa": "1000000000000000000" },
//!   "steps": [
//!     { "name": "draw", "caller": "0x00000000000000000000000000000000000000aa",
//!       "operation": { "op": "draw_cheque", "payee": "0x00000000000000000000000000000000000000bb",
//!                      "amount": "10000000000000000", "validity_window_hours": 1 },
//!       "value": "100000000000000000" },
//!     { "caller": "0x00000000000000000000000000000000000000bb",
//!       "operation": { "op": "cashout" }, "advance_secs": 60 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use cheque_client::{ClientConfig, Confirmation, InMemoryLedger, LedgerClient, Submission};
use cheque_core::{Account, Amount};
use cheque_engine::{EngineConfig, Operation};

/// A replayable operation script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub owner: Account,
    #[serde(default)]
    pub balances: BTreeMap<Account, Amount>,
    pub steps: Vec<ScriptStep>,
}

/// One submission in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Label used in reports. Defaults to the operation name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub caller: Account,
    pub operation: Operation,
    /// Value attached to the submission.
    #[serde(default)]
    pub value: Amount,
    /// Seconds to advance the ledger clock before submitting.
    #[serde(default)]
    pub advance_secs: u32,
}

impl ScriptStep {
    /// The label shown in reports.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.operation.name().to_string())
    }
}

/// The outcome of one script step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub name: String,
    /// `open_cheques` polled after the step.
    pub open_cheques: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    /// Whether the step was confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.confirmation.is_some()
    }
}

/// The outcome of a whole script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRun {
    pub balances_before: BTreeMap<Account, Amount>,
    pub balances_after: BTreeMap<Account, Amount>,
    pub steps: Vec<StepReport>,
    pub open_cheques: Amount,
    pub owner_credit: Amount,
}

impl ScriptRun {
    /// Number of rejected steps.
    pub fn rejected(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_confirmed()).count()
    }
}

/// Load a script from a JSON file.
pub fn load_script(path: &Path) -> Result<Script> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse script: {}", path.display()))
}

/// Apply `script` to a fresh in-memory ledger.
///
/// Stops at the first rejected step unless `keep_going` is set.
pub fn run_script(
    script: &Script,
    engine_config: EngineConfig,
    client_config: ClientConfig,
    keep_going: bool,
) -> Result<ScriptRun> {
    let ledger = InMemoryLedger::new(script.owner.clone(), engine_config, client_config);
    for (account, amount) in &script.balances {
        ledger
            .fund(account, *amount)
            .with_context(|| format!("failed to fund {account}"))?;
    }
    let accounts = tracked_accounts(script);
    let balances_before = snapshot(&ledger, &accounts);

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        ledger.advance(Duration::seconds(i64::from(step.advance_secs)));
        let submission =
            Submission::new(step.caller.clone(), step.operation.clone()).with_value(step.value);
        let result = ledger.submit(&submission);
        let open_cheques = ledger.open_cheques();
        let name = step.label();
        tracing::info!(step = %name, open_cheques = %open_cheques, "open cheques polled");

        let rejected = result.is_err();
        steps.push(match result {
            Ok(confirmation) => StepReport {
                index,
                name,
                open_cheques,
                confirmation: Some(confirmation),
                error: None,
            },
            Err(err) => StepReport {
                index,
                name,
                open_cheques,
                confirmation: None,
                error: Some(err.to_string()),
            },
        });
        if rejected && !keep_going {
            break;
        }
    }

    Ok(ScriptRun {
        balances_after: snapshot(&ledger, &accounts),
        balances_before,
        steps,
        open_cheques: ledger.open_cheques(),
        owner_credit: ledger.owner_credit(),
    })
}

/// Render a run as human-readable text.
pub fn render_text(run: &ScriptRun) -> String {
    let mut out = String::new();
    for step in &run.steps {
        match (&step.confirmation, &step.error) {
            (Some(c), _) => out.push_str(&format!(
                "#{:<3} {:<24} confirmed  seq={} open_cheques={} receipt={}\n",
                step.index, step.name, c.sequence, step.open_cheques, c.receipt_digest
            )),
            (None, Some(err)) => out.push_str(&format!(
                "#{:<3} {:<24} REJECTED   {}\n",
                step.index, step.name, err
            )),
            (None, None) => {}
        }
    }
    out.push_str("\nbalances:\n");
    for (account, after) in &run.balances_after {
        let before = run.balances_before.get(account).copied().unwrap_or_default();
        out.push_str(&format!(
            "  {account}  {} -> {}\n",
            before.to_units_string(),
            after.to_units_string()
        ));
    }
    out.push_str(&format!(
        "open_cheques: {}\nowner_credit: {}\n",
        run.open_cheques.to_units_string(),
        run.owner_credit.to_units_string()
    ));
    out
}

fn tracked_accounts(script: &Script) -> Vec<Account> {
    let mut accounts: Vec<Account> = std::iter::once(script.owner.clone())
        .chain(script.balances.keys().cloned())
        .chain(script.steps.iter().map(|s| s.caller.clone()))
        .collect();
    accounts.sort();
    accounts.dedup();
    accounts
}

fn snapshot(ledger: &InMemoryLedger, accounts: &[Account]) -> BTreeMap<Account, Amount> {
    accounts
        .iter()
        .map(|a| (a.clone(), ledger.balance_of(a)))
        .collect()
}
