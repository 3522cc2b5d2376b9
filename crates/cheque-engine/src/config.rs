//! Engine configuration.
//!
//! Defaults follow the deployed contract: a one-hour cancellation window and
//! excess attached value refunded to the owner. Override via environment
//! variables or explicit construction.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Environment variable for the cancellation window, in seconds.
pub const ENV_CANCELLATION_WINDOW_SECS: &str = "CHEQUE_CANCELLATION_WINDOW_SECS";

/// Environment variable for the excess value policy (`refund` or `retain`).
pub const ENV_EXCESS_VALUE_POLICY: &str = "CHEQUE_EXCESS_VALUE_POLICY";

const DEFAULT_CANCELLATION_WINDOW_SECS: u32 = 3600;

/// What happens to attached value beyond what an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcessValuePolicy {
    /// Return the excess to the owner in the same operation. A shortfall is
    /// always rejected.
    #[default]
    Refund,
    /// Keep the excess as owner credit. Credit covers later shortfalls and
    /// can be withdrawn.
    Retain,
}

impl ExcessValuePolicy {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Retain => "retain",
        }
    }
}

impl std::fmt::Display for ExcessValuePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExcessValuePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refund" => Ok(Self::Refund),
            "retain" => Ok(Self::Retain),
            _ => Err(ConfigError::InvalidValue {
                var: ENV_EXCESS_VALUE_POLICY.to_string(),
                value: s.to_string(),
                reason: "expected \"refund\" or \"retain\"".to_string(),
            }),
        }
    }
}

/// Configuration for an [`EscrowEngine`](crate::EscrowEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long after a draw the owner may still cancel. Inclusive.
    pub cancellation_window: Duration,
    /// Handling of attached value beyond the drawn amount.
    pub excess_value_policy: ExcessValuePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cancellation_window: Duration::seconds(i64::from(DEFAULT_CANCELLATION_WINDOW_SECS)),
            excess_value_policy: ExcessValuePolicy::Refund,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CHEQUE_CANCELLATION_WINDOW_SECS` (default: 3600)
    /// - `CHEQUE_EXCESS_VALUE_POLICY` (default: `refund`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_CANCELLATION_WINDOW_SECS) {
            config.cancellation_window = Duration::seconds(parse_secs(
                ENV_CANCELLATION_WINDOW_SECS,
                &raw,
            )?);
        }
        if let Some(raw) = lookup(ENV_EXCESS_VALUE_POLICY) {
            config.excess_value_policy = raw.parse()?;
        }
        Ok(config)
    }

    /// Replace the cancellation window, in seconds.
    pub fn with_cancellation_window_secs(mut self, secs: u32) -> Self {
        self.cancellation_window = Duration::seconds(i64::from(secs));
        self
    }

    /// Replace the excess value policy.
    pub fn with_excess_value_policy(mut self, policy: ExcessValuePolicy) -> Self {
        self.excess_value_policy = policy;
        self
    }
}

fn parse_secs(var: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .map(i64::from)
        .map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}
