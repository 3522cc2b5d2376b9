//! # cheque-cli — CLI for the Cheque Ledger
//!
//! Provides the `cheque` command-line interface.
//!
//! ## Subcommands
//!
//! - `cheque scenario` — Replay the deployment driver sequence.
//! - `cheque replay` — Apply a JSON operation script.
//!
//! ```bash
//! cheque scenario --owner-funds 2 -v
//! cheque --excess-policy retain replay steps.json --keep-going --json
//! ```

pub mod replay;
pub mod scenario;
pub mod script;

use anyhow::{Context, Result};

use cheque_engine::{EngineConfig, ExcessValuePolicy};

/// Build the engine configuration from the environment, then apply any
/// command-line overrides.
pub fn engine_config(
    cancellation_window_secs: Option<u32>,
    excess_policy: Option<ExcessValuePolicy>,
) -> Result<EngineConfig> {
    engine_config_with(
        |var| std::env::var(var).ok(),
        cancellation_window_secs,
        excess_policy,
    )
}

/// [`engine_config`] with variables resolved through `lookup`.
pub fn engine_config_with(
    lookup: impl Fn(&str) -> Option<String>,
    cancellation_window_secs: Option<u32>,
    excess_policy: Option<ExcessValuePolicy>,
) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_lookup(lookup).context("invalid engine configuration")?;
    if let Some(secs) = cancellation_window_secs {
        config = config.with_cancellation_window_secs(secs);
    }
    if let Some(policy) = excess_policy {
        config = config.with_excess_value_policy(policy);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn vars(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let pairs = pairs.to_vec();
        move |var| {
            pairs
                .iter()
                .find(|(k, _)| *k == var)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn overrides_replace_environment_values() {
        let lookup = vars(&[
            ("CHEQUE_CANCELLATION_WINDOW_SECS", "30"),
            ("CHEQUE_EXCESS_VALUE_POLICY", "refund"),
        ]);
        let config =
            engine_config_with(lookup, Some(120), Some(ExcessValuePolicy::Retain)).unwrap();
        assert_eq!(config.cancellation_window, Duration::minutes(2));
        assert_eq!(config.excess_value_policy, ExcessValuePolicy::Retain);
    }

    #[test]
    fn environment_values_apply_without_overrides() {
        let lookup = vars(&[("CHEQUE_CANCELLATION_WINDOW_SECS", "30")]);
        let config = engine_config_with(lookup, None, None).unwrap();
        assert_eq!(config.cancellation_window, Duration::seconds(30));
        assert_eq!(config.excess_value_policy, ExcessValuePolicy::Refund);
    }

    #[test]
    fn malformed_environment_value_reported() {
        let lookup = vars(&[("CHEQUE_EXCESS_VALUE_POLICY", "hoard")]);
        let err = engine_config_with(lookup, None, Some(ExcessValuePolicy::Retain)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid engine configuration"));
    }
}
