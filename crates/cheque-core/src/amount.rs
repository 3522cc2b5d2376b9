//! # Amounts
//!
//! `Amount` is a non-negative quantity of value in the smallest ledger unit.
//! The type is unsigned, so a negative balance is unrepresentable, and every
//! arithmetic path is checked.
//!
//! Amounts serialize as decimal strings. JSON numbers above 2^53 lose
//! precision in most consumers, and the canonicalizer rejects floats.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Decimal places between the display unit and the smallest unit.
pub const UNIT_DECIMALS: u32 = 18;

/// A non-negative amount in the smallest ledger unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Wrap a raw smallest-unit value.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw smallest-unit value.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// Whether this amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AmountOutOfRange`] on overflow.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, CoreError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or_else(|| out_of_range(self, "+", rhs))
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AmountOutOfRange`] if `rhs > self`.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, CoreError> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount)
            .ok_or_else(|| out_of_range(self, "-", rhs))
    }

    /// `self - rhs`, or zero when `rhs` exceeds `self`.
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }

    /// Parse a raw smallest-unit decimal string (e.g. `"10000000000000000"`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] for empty input, signs,
    /// fractional parts, or values above `u128::MAX`.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let s = input.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidAmount {
                input: input.to_string(),
                reason: "expected an unsigned integer".to_string(),
            });
        }
        s.parse::<u128>().map(Amount).map_err(|e| CoreError::InvalidAmount {
            input: input.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a display-unit decimal string with [`UNIT_DECIMALS`] places
    /// (`"0.01"` becomes `10^16`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAmount`] for malformed input or more than
    /// [`UNIT_DECIMALS`] fractional digits.
    pub fn parse_units(input: &str) -> Result<Self, CoreError> {
        let s = input.trim();
        let invalid = |reason: &str| CoreError::InvalidAmount {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty amount"));
        }
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !digits_only(whole) || !digits_only(frac) {
            return Err(invalid("expected a decimal number"));
        }
        if frac.len() > UNIT_DECIMALS as usize {
            return Err(invalid("too many fractional digits"));
        }
        let scale = 10u128.pow(UNIT_DECIMALS);
        let whole_value = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| invalid("whole part out of range"))?
        };
        let frac_value = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = UNIT_DECIMALS as usize);
            padded.parse::<u128>().map_err(|_| invalid("fractional part out of range"))?
        };
        whole_value
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac_value))
            .map(Amount)
            .ok_or_else(|| invalid("value out of range"))
    }

    /// Render in display units with trailing zeros trimmed (`10^16` → `"0.01"`).
    pub fn to_units_string(&self) -> String {
        let scale = 10u128.pow(UNIT_DECIMALS);
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0>width$}", width = UNIT_DECIMALS as usize);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

fn out_of_range(lhs: Amount, op: &'static str, rhs: Amount) -> CoreError {
    CoreError::AmountOutOfRange {
        lhs: lhs.to_string(),
        op,
        rhs: rhs.to_string(),
    }
}

impl TryFrom<String> for Amount {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl std::str::FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::iter::Sum for Amount {
    /// Saturates at `u128::MAX`; callers comparing sums against tracked
    /// totals treat saturation as a mismatch.
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.fold(0u128, |acc, a| acc.saturating_add(a.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_and_sub() {
        let a = Amount::new(20);
        let b = Amount::new(5);
        assert_eq!(a.checked_add(b).unwrap(), Amount::new(25));
        assert_eq!(a.checked_sub(b).unwrap(), Amount::new(15));
    }

    #[test]
    fn checked_sub_underflow_is_error() {
        let err = Amount::new(1).checked_sub(Amount::new(2)).unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange { op: "-", .. }));
    }

    #[test]
    fn checked_add_overflow_is_error() {
        assert!(Amount::new(u128::MAX).checked_add(Amount::new(1)).is_err());
    }

    #[test]
    fn parse_raw() {
        assert_eq!(Amount::parse("10000000000000000").unwrap().raw(), 10u128.pow(16));
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("-5").is_err());
        assert!(Amount::parse("1.5").is_err());
        assert!(Amount::parse("+5").is_err());
    }

    #[test]
    fn parse_units_matches_driver_constants() {
        assert_eq!(Amount::parse_units("0.01").unwrap().raw(), 10_000_000_000_000_000);
        assert_eq!(Amount::parse_units("0.1").unwrap().raw(), 100_000_000_000_000_000);
        assert_eq!(Amount::parse_units("1").unwrap().raw(), 10u128.pow(18));
        assert_eq!(Amount::parse_units(".5").unwrap().raw(), 5 * 10u128.pow(17));
    }

    #[test]
    fn parse_units_rejects_malformed() {
        assert!(Amount::parse_units("").is_err());
        assert!(Amount::parse_units(".").is_err());
        assert!(Amount::parse_units("1.2.3").is_err());
        assert!(Amount::parse_units("abc").is_err());
        assert!(Amount::parse_units("0.0000000000000000001").is_err());
    }

    #[test]
    fn units_string_trims_zeros() {
        assert_eq!(Amount::new(3 * 10u128.pow(16)).to_units_string(), "0.03");
        assert_eq!(Amount::new(2 * 10u128.pow(18)).to_units_string(), "2");
        assert_eq!(Amount::ZERO.to_units_string(), "0");
        assert_eq!(Amount::new(1).to_units_string(), "0.000000000000000001");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Amount::new(u128::MAX)).unwrap();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.raw(), u128::MAX);
    }

    #[test]
    fn sum_of_amounts() {
        let total: Amount = [1u128, 2, 3].into_iter().map(Amount::new).sum();
        assert_eq!(total, Amount::new(6));
    }
}
