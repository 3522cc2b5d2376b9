//! # Account Addresses
//!
//! `Account` identifies the owner or a payee. Addresses are `0x` followed by
//! 40 hex digits and are normalized to lowercase at construction, so two
//! spellings of the same address compare equal.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of hex digits in an address body.
const ADDRESS_HEX_LEN: usize = 40;

/// A validated, lowercase account address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    /// Parse and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAccount`] if the input lacks the `0x`
    /// prefix, has the wrong length, or contains non-hex characters.
    pub fn new(input: impl AsRef<str>) -> Result<Self, CoreError> {
        let raw = input.as_ref().trim();
        let body = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidAccount {
                input: raw.to_string(),
                reason: "missing 0x prefix".to_string(),
            })?;
        if body.len() != ADDRESS_HEX_LEN {
            return Err(CoreError::InvalidAccount {
                input: raw.to_string(),
                reason: format!("expected {ADDRESS_HEX_LEN} hex digits, got {}", body.len()),
            });
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAccount {
                input: raw.to_string(),
                reason: "contains non-hex characters".to_string(),
            });
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// The normalized address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Account {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

impl std::str::FromStr for Account {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
