//! # Replay Subcommand
//!
//! Applies a JSON operation script (see [`crate::script`]) to a fresh
//! in-memory ledger and prints each confirmation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use cheque_client::ClientConfig;
use cheque_engine::EngineConfig;

use crate::script::{load_script, render_text, run_script};

/// Arguments for the `cheque replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the script file.
    #[arg(value_name = "SCRIPT_JSON")]
    pub script: PathBuf,

    /// Print the run as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Continue past rejected steps.
    #[arg(long)]
    pub keep_going: bool,
}

/// Execute the replay subcommand.
///
/// Returns exit code: 0 when every step is confirmed, 1 otherwise.
pub fn run_replay(
    args: &ReplayArgs,
    engine_config: EngineConfig,
    client_config: ClientConfig,
) -> Result<u8> {
    let script = load_script(&args.script)?;
    tracing::debug!(
        path = %args.script.display(),
        steps = script.steps.len(),
        "loaded script"
    );
    let run = run_script(&script, engine_config, client_config, args.keep_going)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print!("{}", render_text(&run));
    }
    Ok(if run.rejected() == 0 { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheque_core::Timestamp;
    use std::io::Write;

    #[test]
    fn rejected_step_yields_exit_code_one() {
        let owner = "0x00000000000000000000000000000000000000aa";
        let json = format!(
            r#"{{ "owner": "{owner}", "steps": [ {{ "caller": "{owner}", "operation": {{ "op": "cashout" }} }} ] }}"#
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let args = ReplayArgs {
            script: file.path().to_path_buf(),
            json: true,
            keep_going: false,
        };
        let client = ClientConfig::starting_at(Timestamp::parse("2026-03-01T09:00:00Z").unwrap());
        let code = run_replay(&args, EngineConfig::default(), client).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = ReplayArgs {
            script: PathBuf::from("/nonexistent/script.json"),
            json: false,
            keep_going: false,
        };
        assert!(run_replay(&args, EngineConfig::default(), ClientConfig::default()).is_err());
    }
}
