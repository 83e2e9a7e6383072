//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)`. Catalog and cart views expose them as
//! plain JSON numbers via [`Price::as_f64`]; raw product rows keep the exact
//! decimal string.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("must not be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum number of decimal places.
        max: u32,
    },
    /// The amount does not fit `NUMERIC(12, 2)`.
    #[error("must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: i64,
    },
}

/// A non-negative price with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of decimal places.
    pub const SCALE: u32 = 2;

    /// Exclusive upper bound imposed by `NUMERIC(12, 2)`.
    pub const MAX_WHOLE: i64 = 10_000_000_000;

    /// Create a price from a decimal amount.
    ///
    /// Trailing zeros do not count toward the scale limit, so `19.900` is
    /// accepted and stored as `19.90`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the amount is negative, too precise, or too large.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise { max: Self::SCALE });
        }

        if normalized >= Decimal::from(Self::MAX_WHOLE) {
            return Err(PriceError::TooLarge {
                max: Self::MAX_WHOLE,
            });
        }

        let mut stored = normalized;
        stored.rescale(Self::SCALE);
        Ok(Self(stored))
    }

    /// Create a price from an integer number of cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the amount is negative or too large.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::SCALE))
    }

    /// The exact decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount as a JSON-friendly float.
    ///
    /// `NUMERIC(12, 2)` values are always representable, so the fallback of
    /// `0.0` is never hit for stored prices.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_new_accepts_two_places() {
        let price = Price::new(Decimal::from_str("19.99").unwrap()).unwrap();
        assert_eq!(price.to_string(), "19.99");
        assert!((price.as_f64() - 19.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_ignores_trailing_zeros() {
        let price = Price::new(Decimal::from_str("5.500").unwrap()).unwrap();
        assert_eq!(price.to_string(), "5.50");
    }

    #[test]
    fn test_new_rejects_negative() {
        let result = Price::new(Decimal::from_str("-0.01").unwrap());
        assert_eq!(result, Err(PriceError::Negative));
    }

    #[test]
    fn test_new_rejects_sub_cent() {
        let result = Price::new(Decimal::from_str("1.005").unwrap());
        assert_eq!(result, Err(PriceError::TooPrecise { max: 2 }));
    }

    #[test]
    fn test_new_rejects_too_large() {
        let result = Price::new(Decimal::from(Price::MAX_WHOLE));
        assert!(matches!(result, Err(PriceError::TooLarge { .. })));
    }

    #[test]
    fn test_from_cents() {
        let price = Price::from_cents(12_950).unwrap();
        assert_eq!(price.to_string(), "129.50");
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Price = serde_json::from_str("89.5").unwrap();
        let from_string: Price = serde_json::from_str("\"89.50\"").unwrap();
        assert_eq!(from_number, from_string);

        assert!(serde_json::from_str::<Price>("-3").is_err());
    }
}
