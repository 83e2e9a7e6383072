//! Cart line quantities.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is zero or negative.
    #[error("quantity must be at least {min}")]
    TooSmall {
        /// Minimum allowed quantity.
        min: i32,
    },
    /// The value exceeds the per-line limit.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
    },
}

/// A cart line quantity: an integer in `1..=Quantity::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Smallest quantity a cart line can hold.
    pub const MIN: i32 = 1;

    /// Largest quantity accepted in a single request.
    pub const MAX: i32 = 10_000;

    /// The implicit quantity when a request omits it.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError` if the value is outside `1..=Quantity::MAX`.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < Self::MIN {
            return Err(QuantityError::TooSmall { min: Self::MIN });
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(Quantity::MAX).unwrap().get(), Quantity::MAX);
        assert_eq!(Quantity::new(0), Err(QuantityError::TooSmall { min: 1 }));
        assert_eq!(
            Quantity::new(Quantity::MAX + 1),
            Err(QuantityError::TooLarge { max: Quantity::MAX })
        );
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(Quantity::default(), Quantity::ONE);
    }

    #[test]
    fn test_deserialize_rejects_non_integers() {
        assert!(serde_json::from_str::<Quantity>("\"3\"").is_err());
        assert!(serde_json::from_str::<Quantity>("2.5").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("3").unwrap().get(), 3);
    }
}
