//! In-memory ledger configuration.
//!
//! Each accepted submission lands in its own block, `block_interval_secs`
//! after the previous one. Explicit clock advances move time further.

use cheque_core::Timestamp;
use cheque_engine::ConfigError;

/// Environment variable for the block interval, in seconds.
pub const ENV_BLOCK_INTERVAL_SECS: &str = "CHEQUE_BLOCK_INTERVAL_SECS";

/// Environment variable for the genesis time (RFC 3339, `Z` suffix).
pub const ENV_GENESIS_TIME: &str = "CHEQUE_GENESIS_TIME";

const DEFAULT_BLOCK_INTERVAL_SECS: u32 = 5;

/// Configuration for an [`InMemoryLedger`](crate::InMemoryLedger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Seconds between consecutive blocks.
    pub block_interval_secs: u32,
    /// Ledger time before the first block.
    pub genesis_time: Timestamp,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::starting_at(Timestamp::now())
    }
}

impl ClientConfig {
    /// Default block interval with an explicit genesis time.
    pub fn starting_at(genesis_time: Timestamp) -> Self {
        Self {
            block_interval_secs: DEFAULT_BLOCK_INTERVAL_SECS,
            genesis_time,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CHEQUE_BLOCK_INTERVAL_SECS` (default: 5)
    /// - `CHEQUE_GENESIS_TIME` (default: now)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_BLOCK_INTERVAL_SECS) {
            config.block_interval_secs =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        var: ENV_BLOCK_INTERVAL_SECS.to_string(),
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }
        if let Some(raw) = lookup(ENV_GENESIS_TIME) {
            config.genesis_time =
                Timestamp::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
                    var: ENV_GENESIS_TIME.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(config)
    }

    /// Replace the block interval.
    pub fn with_block_interval_secs(mut self, secs: u32) -> Self {
        self.block_interval_secs = secs;
        self
    }
}
