//! Monetary amounts held as integer cents.
//!
//! Amounts cross the wire as JSON numbers in currency units (`330`,
//! `19670.5`) and are rounded to the nearest cent when parsed.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CENTS_PER_UNIT: i64 = 100;

/// Amount of money in cents.
///
/// # Examples
/// ```
/// use loan_backend::domain::Money;
///
/// let installment = Money::from_units(330);
/// assert_eq!(installment.cents(), 33_000);
/// assert_eq!(installment.to_string(), "330.00");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build from a cent count.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Build from whole currency units.
    pub const fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(CENTS_PER_UNIT))
    }

    /// Parse a currency-unit float, rounding to the nearest cent.
    ///
    /// Returns `None` for non-finite input or values that do not fit.
    pub fn from_units_f64(units: f64) -> Option<Self> {
        if !units.is_finite() {
            return None;
        }
        let cents = (units * CENTS_PER_UNIT as f64).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }
        // Range checked above and already rounded.
        Some(Self(cents as i64))
    }

    /// Cent count.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Value in currency units.
    pub fn as_units(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    /// `self - other`, floored at zero.
    pub fn saturating_sub_floor(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }

    /// Whether the amount is strictly positive.
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = CENTS_PER_UNIT.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        Self::from_units_f64(units)
            .ok_or_else(|| serde::de::Error::custom("amount must be a finite number"))
    }
}
