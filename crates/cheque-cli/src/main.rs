//! # cheque CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cheque_cli::engine_config;
use cheque_cli::replay::{run_replay, ReplayArgs};
use cheque_cli::scenario::{run_scenario, ScenarioArgs};
use cheque_client::ClientConfig;
use cheque_engine::ExcessValuePolicy;

/// Cheque ledger CLI
///
/// Drives the cheque escrow engine through an in-memory ledger: replays the
/// deployment scenario or an operation script and reports every
/// confirmation.
#[derive(Parser, Debug)]
#[command(name = "cheque", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Seconds after a draw during which the owner may cancel.
    #[arg(long, global = true)]
    cancellation_window_secs: Option<u32>,

    /// What to do with attached value beyond the amount (refund or retain).
    #[arg(long, global = true)]
    excess_policy: Option<ExcessValuePolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay the deployment driver scenario.
    Scenario(ScenarioArgs),

    /// Apply a JSON operation script.
    Replay(ReplayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = engine_config(cli.cancellation_window_secs, cli.excess_policy).and_then(
        |engine| {
            let client = ClientConfig::from_env()?;
            tracing::debug!(
                cancellation_window_secs = engine.cancellation_window.num_seconds(),
                excess_policy = %engine.excess_value_policy,
                block_interval_secs = client.block_interval_secs,
                genesis_time = %client.genesis_time,
                "configuration resolved"
            );
            match &cli.command {
                Commands::Scenario(args) => run_scenario(args, engine, client),
                Commands::Replay(args) => run_replay(args, engine, client),
            }
        },
    );

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
