//! # Scenario Subcommand
//!
//! Replays the deployment driver against a fresh in-memory ledger: draw,
//! cancel, draw again, top up, reduce, and let the payee cash out, polling
//! `open_cheques` after every confirmed step.

use anyhow::{Context, Result};
use clap::Args;

use cheque_client::ClientConfig;
use cheque_core::{Account, Amount};
use cheque_engine::{EngineConfig, Operation};

use crate::script::{render_text, run_script, Script, ScriptStep};

/// Default owner account for the scenario.
pub const DEFAULT_OWNER: &str = "0x5a0e4b0e1c8f3d2a6b7c9d0e1f2a3b4c5d6e7f80";

/// Default payee account for the scenario.
pub const DEFAULT_PAYEE: &str = "0x9b1d2c3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b91";

/// Hours each scenario cheque stays claimable.
pub const VALIDITY_WINDOW_HOURS: u32 = 1;

const FIRST_DRAW: u128 = 10_000_000_000_000_000;
const SECOND_DRAW: u128 = 20_000_000_000_000_000;
const INCREASE: u128 = 50_000_000_000_000_000;
const REDUCE: u128 = 40_000_000_000_000_000;
const ATTACHED: u128 = 100_000_000_000_000_000;

/// Arguments for the `cheque scenario` subcommand.
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Owner wallet funding, in whole units (18 decimals).
    #[arg(long, default_value = "1")]
    pub owner_funds: String,

    /// Owner account.
    #[arg(long, default_value = DEFAULT_OWNER)]
    pub owner: String,

    /// Payee account.
    #[arg(long, default_value = DEFAULT_PAYEE)]
    pub payee: String,

    /// Print the run as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Build the driver scenario as a script.
pub fn driver_script(owner: Account, payee: Account, owner_funds: Amount) -> Script {
    let step = |name: &str, caller: &Account, operation: Operation, value: u128| ScriptStep {
        name: Some(name.to_string()),
        caller: caller.clone(),
        operation,
        value: Amount::new(value),
        advance_secs: 0,
    };
    let steps = vec![
        step(
            "draw cheque",
            &owner,
            Operation::DrawCheque {
                payee: payee.clone(),
                amount: Amount::new(FIRST_DRAW),
                validity_window_hours: VALIDITY_WINDOW_HOURS,
            },
            ATTACHED,
        ),
        step(
            "cancel drawn cheque",
            &owner,
            Operation::CancelDrawnCheque {
                payee: payee.clone(),
            },
            0,
        ),
        step(
            "redraw cheque",
            &owner,
            Operation::DrawCheque {
                payee: payee.clone(),
                amount: Amount::new(SECOND_DRAW),
                validity_window_hours: VALIDITY_WINDOW_HOURS,
            },
            ATTACHED,
        ),
        step(
            "increase cheque value",
            &owner,
            Operation::IncreaseChequeValue {
                payee: payee.clone(),
                amount: Amount::new(INCREASE),
            },
            ATTACHED,
        ),
        step(
            "reduce cheque value",
            &owner,
            Operation::ReduceChequeValue {
                payee: payee.clone(),
                amount: Amount::new(REDUCE),
            },
            0,
        ),
        step("cashout", &payee, Operation::Cashout, 0),
    ];
    Script {
        balances: [(owner.clone(), owner_funds)].into_iter().collect(),
        owner,
        steps,
    }
}

/// Execute the scenario subcommand.
///
/// Returns exit code: 0 when every step is confirmed, 1 otherwise.
pub fn run_scenario(
    args: &ScenarioArgs,
    engine_config: EngineConfig,
    client_config: ClientConfig,
) -> Result<u8> {
    let owner = Account::new(&args.owner).context("invalid --owner")?;
    let payee = Account::new(&args.payee).context("invalid --payee")?;
    let funds = Amount::parse_units(&args.owner_funds).context("invalid --owner-funds")?;

    let script = driver_script(owner, payee, funds);
    let run = run_script(&script, engine_config, client_config, false)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print!("{}", render_text(&run));
    }
    Ok(if run.rejected() == 0 { 0 } else { 1 })
}
