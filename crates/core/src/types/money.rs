//! Exact monetary amounts in integer minor units.
//!
//! Totals must be reproducible from the same line items regardless of
//! summation order, so amounts are held as whole cents (`i64`) and every
//! conversion from a decimal representation is checked. `rust_decimal` is used
//! at the boundaries (parsing, display, wire format); arithmetic never touches
//! floating point.
//!
//! # Wire format
//!
//! A [`Money`] serializes as a JSON number in major units (`50`, `12.5`) and
//! deserializes from an integer, a float, or a decimal string. Inputs with more
//! than two fractional digits are rejected rather than rounded.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minor units per major unit.
const CENTS_PER_UNIT: i64 = 100;

/// Errors that can occur when building a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount has more precision than one cent.
    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),
    /// The amount does not fit in the minor-unit range.
    #[error("amount out of range")]
    Overflow,
    /// The input is not a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// A monetary amount, stored as whole cents.
///
/// QKart is single-currency; there is no currency code attached.
///
/// ```
/// use qkart_core::Money;
///
/// let cost = Money::from_major(50).unwrap();
/// let line = cost.checked_mul(2).unwrap();
/// assert_eq!(line, Money::from_cents(10_000));
/// assert_eq!(line.to_string(), "100.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Largest representable amount.
    pub const MAX: Self = Self(i64::MAX);

    /// Create an amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create an amount from whole major units.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the amount does not fit in cents.
    pub const fn from_major(units: i64) -> Result<Self, MoneyError> {
        match units.checked_mul(CENTS_PER_UNIT) {
            Some(cents) => Ok(Self(cents)),
            None => Err(MoneyError::Overflow),
        }
    }

    /// Create an amount from a decimal number of major units.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::TooPrecise` for sub-cent amounts and
    /// `MoneyError::Overflow` if the amount does not fit in cents.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?;
        if !scaled.fract().is_zero() {
            return Err(MoneyError::TooPrecise(amount));
        }
        scaled.to_i64().map(Self).ok_or(MoneyError::Overflow)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount as a decimal number of major units (two decimal places).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Checked multiplication by a quantity.
    #[must_use]
    pub fn checked_mul(self, qty: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(qty)).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::from_decimal(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % CENTS_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / CENTS_PER_UNIT)
        } else {
            let amount = self
                .to_decimal()
                .to_f64()
                .ok_or_else(|| serde::ser::Error::custom("amount not representable"))?;
            serializer.serialize_f64(amount)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount with at most two fractional digits")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Money::from_major(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let units = i64::try_from(v).map_err(|_| E::custom(MoneyError::Overflow))?;
        Money::from_major(units).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // `f64`'s Display is the shortest round-trip form, so 49.99 stays 49.99.
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let cents = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(cents))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_exact() {
        let m = Money::from_decimal(Decimal::new(4999, 2)).unwrap();
        assert_eq!(m.cents(), 4999);
    }

    #[test]
    fn test_from_decimal_rejects_sub_cent() {
        let err = Money::from_decimal(Decimal::new(10_001, 3)).unwrap_err();
        assert!(matches!(err, MoneyError::TooPrecise(_)));
    }

    #[test]
    fn test_from_major_overflow() {
        assert_eq!(Money::from_major(i64::MAX), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_parse_str() {
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert_eq!(" 7 ".parse::<Money>().unwrap(), Money::from_cents(700));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(10_000).to_string(), "100.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_serialize_whole_amount_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(5000)).unwrap();
        assert_eq!(json, "50");
    }

    #[test]
    fn test_serialize_fractional_amount() {
        let json = serde_json::to_string(&Money::from_cents(4999)).unwrap();
        assert_eq!(json, "49.99");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Money = serde_json::from_str("50").unwrap();
        let b: Money = serde_json::from_str("49.99").unwrap();
        let c: Money = serde_json::from_str("\"0.10\"").unwrap();
        assert_eq!(a.cents(), 5000);
        assert_eq!(b.cents(), 4999);
        assert_eq!(c.cents(), 10);
    }

    #[test]
    fn test_deserialize_rejects_sub_cent() {
        assert!(serde_json::from_str::<Money>("1.001").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(150);
        assert_eq!(a.checked_mul(3), Some(Money::from_cents(450)));
        assert_eq!(a.checked_sub(Money::from_cents(200)), Some(Money::from_cents(-50)));
        assert_eq!(Money::MAX.checked_add(a), None);
        assert_eq!(Money::MAX.checked_mul(2), None);
    }
}
