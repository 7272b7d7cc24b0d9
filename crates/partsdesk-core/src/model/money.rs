//! Integer money.
//!
//! All amounts are pence in an `i64`. Parsing accepts at most two decimal
//! places and never goes through a float.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use thiserror::Error;

/// Why a text amount was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("'{0}' is not an amount")]
    Malformed(String),
    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("amount out of range")]
    Overflow,
}

/// An amount of money in pence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn from_pence(pence: i64) -> Self {
        Self(pence)
    }

    /// Whole pounds; `None` on overflow.
    #[must_use]
    pub fn from_pounds(pounds: i64) -> Option<Self> {
        pounds.checked_mul(100).map(Self)
    }

    #[must_use]
    pub const fn pence(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Unit price times a quantity, saturating.
    #[must_use]
    pub fn times(self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    /// Integer division for averages; zero when `count` is zero.
    #[must_use]
    pub fn divided_by(self, count: u64) -> Self {
        match i64::try_from(count) {
            Ok(n) if n > 0 => Self(self.0 / n),
            _ => Self::ZERO,
        }
    }

    /// Parse `12`, `12.5`, `12.50`, `-3.10` or `£4.99`.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        let malformed = || MoneyError::Malformed(input.to_string());

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let unsigned = unsigned.strip_prefix('£').unwrap_or(unsigned);

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (unsigned, None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let fraction_pence = match fraction {
            None => 0,
            Some(digits) if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(malformed());
            }
            Some(digits) if digits.len() > 2 => {
                return Err(MoneyError::TooPrecise(input.to_string()));
            }
            Some(digits) => {
                let value: i64 = digits.parse().map_err(|_| malformed())?;
                if digits.len() == 1 { value * 10 } else { value }
            }
        };

        let whole_value: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let pence = whole_value
            .checked_mul(100)
            .and_then(|p| p.checked_add(fraction_pence))
            .ok_or(MoneyError::Overflow)?;

        Ok(Self(if negative { -pence } else { pence }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

// JSON carries "12.50"; the binary record format carries raw pence.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_i64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(MoneyVisitor)
        } else {
            i64::deserialize(deserializer).map(Money)
        }
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount such as 12.50")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Money, E> {
        Money::from_pounds(v).ok_or_else(|| E::custom(MoneyError::Overflow))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(Money::from_pounds)
            .ok_or_else(|| E::custom(MoneyError::Overflow))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Money, E> {
        Money::parse(&v.to_string()).map_err(E::custom)
    }
}
