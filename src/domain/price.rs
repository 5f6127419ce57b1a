//! Fixed two-decimal dish prices stored as integer cents.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest amount accepted, matching a `NUMERIC(10, 2)` column.
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must not be empty")]
    Empty,
    #[error("price `{0}` is not a decimal number")]
    Malformed(String),
    #[error("price `{0}` has more than two decimal places")]
    Precision(String),
    #[error("price must not be negative")]
    Negative,
    #[error("price exceeds the supported maximum")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            return Err(PriceError::Negative);
        }
        if cents > MAX_PRICE_CENTS {
            return Err(PriceError::OutOfRange);
        }
        Ok(Self(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// JSON numbers go through the decimal parser so they obey the same
    /// precision rule as strings. `f64` display never uses exponent notation.
    fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::Malformed(value.to_string()));
        }
        value.to_string().parse()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(PriceError::Negative);
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(PriceError::Malformed(trimmed.to_string()));
        }
        if fraction.len() > 2 {
            return Err(PriceError::Precision(trimmed.to_string()));
        }

        let whole: i64 = whole.parse().map_err(|_| PriceError::OutOfRange)?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map(|v| v * 10).unwrap_or(0),
            _ => fraction.parse().unwrap_or(0),
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(fraction))
            .ok_or(PriceError::OutOfRange)?;
        Self::from_cents(cents)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal price as a string or number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Price, E> {
        value.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Price, E> {
        let cents = i64::try_from(value)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .ok_or_else(|| E::custom(PriceError::OutOfRange))?;
        Price::from_cents(cents).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Price, E> {
        if value < 0 {
            return Err(E::custom(PriceError::Negative));
        }
        self.visit_u64(value as u64)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Price, E> {
        Price::from_f64(value).map_err(E::custom)
    }
}
