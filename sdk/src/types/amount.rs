//! Monetary amounts.
//!
//! Prices and bids travel over the wire as JSON numbers, numeric strings, or
//! garbage. [`Amount`] keeps the view renderable by coercing anything it
//! cannot read to zero instead of failing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::SdkError;

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a decimal, clamping negatives to zero.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        if value.is_sign_negative() {
            Self::ZERO
        } else {
            Self(value.normalize())
        }
    }

    /// Creates an amount from whole units.
    #[must_use]
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns the raw decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Strictly parses a user-entered amount.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::InvalidAmount` if the input is not a number or is
    /// negative.
    pub fn parse(input: &str) -> Result<Self, SdkError> {
        let value = parse_decimal(input).ok_or_else(|| SdkError::InvalidAmount(input.to_string()))?;
        if value.is_sign_negative() {
            return Err(SdkError::InvalidAmount(input.to_string()));
        }
        Ok(Self::new(value))
    }

    /// Best-effort conversion of a JSON value.
    ///
    /// Numbers and numeric strings are read; null, booleans, objects,
    /// unparseable strings and negatives all become zero.
    #[must_use]
    pub fn coerce(value: &Value) -> Self {
        Self::try_coerce(value).unwrap_or(Self::ZERO)
    }

    /// Like [`Amount::coerce`], but reports whether the value was readable.
    ///
    /// Used where a caller walks a preference list of fields and needs to
    /// know which one actually held a number.
    #[must_use]
    pub fn try_coerce(value: &Value) -> Option<Self> {
        let decimal = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }?;
        Some(Self::new(decimal))
    }

    /// Returns the smallest amount a follow-up bid should offer.
    #[must_use]
    pub fn next_bid(&self) -> Self {
        Self(self.0.checked_add(Decimal::ONE).unwrap_or(Decimal::MAX))
    }
}

fn parse_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self::from_units(value)
    }
}

impl FromStr for Amount {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero() {
            if let Some(units) = self.0.to_u64() {
                return serializer.serialize_u64(units);
            }
        }
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::coerce(&value))
    }
}
