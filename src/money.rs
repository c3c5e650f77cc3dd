//! Money representation.
//!
//! Balances and transfer amounts are integer minor units (cents). Nothing in
//! the ledger ever touches a float: client strings are parsed through
//! `rust_decimal::Decimal` and rejected if they carry more precision than
//! [`Amount::DECIMALS`].
//!
//! ## Wire format
//! Amounts travel as decimal strings with exactly two fractional digits
//! (`"50.00"`), so no JSON number ever has to be interpreted as a float.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Non-negative money value in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Fractional digits carried by every amount.
    pub const DECIMALS: u32 = 2;
    const SCALE: u64 = 100;

    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Whole currency units (`Amount::from_major(50)` is `50.00`).
    pub fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(Self::SCALE))
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Parse a client-supplied string. Zero is accepted (seed balances);
    /// use [`Amount::parse_positive`] for transfer amounts.
    pub fn parse(amount_str: &str) -> Result<Amount, MoneyError> {
        let amount_str = amount_str.trim();
        if amount_str.is_empty() {
            return Err(MoneyError::InvalidFormat("empty string".into()));
        }
        if amount_str.starts_with('-') || amount_str.starts_with('+') {
            return Err(MoneyError::InvalidAmount);
        }
        if amount_str.starts_with('.') || amount_str.ends_with('.') {
            return Err(MoneyError::InvalidFormat(
                "use a leading and trailing digit (e.g. 0.5, 5.0)".into(),
            ));
        }

        let decimal = Decimal::from_str(amount_str)
            .map_err(|e| MoneyError::InvalidFormat(format!("{}: {}", amount_str, e)))?;
        Self::from_decimal(decimal)
    }

    /// Parse a transfer amount: must be strictly positive.
    pub fn parse_positive(amount_str: &str) -> Result<Amount, MoneyError> {
        let amount = Self::parse(amount_str)?;
        if amount.is_zero() {
            return Err(MoneyError::InvalidAmount);
        }
        Ok(amount)
    }

    /// Convert a validated decimal; rejects negatives and excess precision.
    pub fn from_decimal(decimal: Decimal) -> Result<Amount, MoneyError> {
        if decimal.is_sign_negative() && !decimal.is_zero() {
            return Err(MoneyError::InvalidAmount);
        }

        let decimal = decimal.normalize();
        if decimal.scale() > Self::DECIMALS {
            return Err(MoneyError::PrecisionOverflow {
                provided: decimal.scale(),
                max: Self::DECIMALS,
            });
        }

        let scaled = decimal
            .checked_mul(Decimal::from(Self::SCALE))
            .ok_or(MoneyError::Overflow)?;
        scaled.to_u64().map(Amount).ok_or(MoneyError::Overflow)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, Self::DECIMALS)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0>width$}",
            self.0 / Self::SCALE,
            self.0 % Self::SCALE,
            width = Self::DECIMALS as usize
        )
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(Amount::parse("50").unwrap(), Amount::from_minor(5_000));
        assert_eq!(Amount::parse("50.5").unwrap(), Amount::from_minor(5_050));
        assert_eq!(Amount::parse("0.01").unwrap(), Amount::from_minor(1));
        assert_eq!(Amount::parse("100.00").unwrap(), Amount::from_major(100));
        assert_eq!(Amount::parse("0").unwrap(), Amount::ZERO);
        // trailing zeros beyond two places carry no extra precision
        assert_eq!(Amount::parse("1.500").unwrap(), Amount::from_minor(150));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Amount::parse("-1"), Err(MoneyError::InvalidAmount));
        assert_eq!(Amount::parse("+1"), Err(MoneyError::InvalidAmount));
        assert!(matches!(
            Amount::parse("0.001"),
            Err(MoneyError::PrecisionOverflow { provided: 3, max: 2 })
        ));
        assert!(matches!(Amount::parse(""), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse(".5"), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse("5."), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse("abc"), Err(MoneyError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_positive_rejects_zero() {
        assert_eq!(Amount::parse_positive("0.00"), Err(MoneyError::InvalidAmount));
        assert!(Amount::parse_positive("0.01").is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_minor(5_000).to_string(), "50.00");
        assert_eq!(Amount::from_minor(5).to_string(), "0.05");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_major(100);
        let b = Amount::from_major(50);
        assert_eq!(a.checked_sub(b), Some(Amount::from_major(50)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::from_minor(u64::MAX).checked_add(Amount::from_minor(1)), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Amount::from_minor(12_345)).unwrap();
        assert_eq!(json, "\"123.45\"");
        let back: Amount = serde_json::from_str("\"123.45\"").unwrap();
        assert_eq!(back, Amount::from_minor(12_345));
        assert!(serde_json::from_str::<Amount>("\"1.234\"").is_err());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(
            Amount::from_minor(12_345).to_decimal(),
            Decimal::from_str("123.45").unwrap()
        );
    }
}
