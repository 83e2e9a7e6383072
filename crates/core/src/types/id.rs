//! Newtype IDs for type-safe entity references.
//!
//! Every table in the `shop` schema uses a `SERIAL` primary key. The
//! `define_id!` macro wraps those `i32` keys so a `CartItemId` can never be
//! passed where a `ProductId` is expected.

/// Error returned when an ID cannot be parsed from text (path or query string).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// The input was not an integer.
    #[error("id must be an integer")]
    NotAnInteger,
    /// The input was zero or negative.
    #[error("id must be positive")]
    NotPositive,
}

/// Parse a positive `i32` key from text.
///
/// # Errors
///
/// Returns `IdParseError` if the text is not a positive integer.
pub fn parse_positive_id(s: &str) -> Result<i32, IdParseError> {
    let value = s
        .trim()
        .parse::<i32>()
        .map_err(|_| IdParseError::NotAnInteger)?;
    if value <= 0 {
        return Err(IdParseError::NotPositive);
    }
    Ok(value)
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `FromStr` accepting only positive integers
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use solemart_core::define_id;
/// define_id!(WishlistId);
///
/// let id: WishlistId = "42".parse().unwrap();
/// assert_eq!(id.as_i32(), 42);
/// assert!("0".parse::<WishlistId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                $crate::types::id::parse_positive_id(s).map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CartId);
define_id!(CartItemId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_str() {
        let id: ProductId = "17".parse().unwrap();
        assert_eq!(id, ProductId::new(17));

        let id: CartItemId = " 3 ".parse().unwrap();
        assert_eq!(id.as_i32(), 3);
    }

    #[test]
    fn test_parse_rejects_non_integers() {
        assert_eq!(
            "abc".parse::<CartItemId>(),
            Err(IdParseError::NotAnInteger)
        );
        assert_eq!("1.5".parse::<ProductId>(), Err(IdParseError::NotAnInteger));
        assert_eq!("".parse::<UserId>(), Err(IdParseError::NotAnInteger));
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!("0".parse::<CartId>(), Err(IdParseError::NotPositive));
        assert_eq!("-4".parse::<CartId>(), Err(IdParseError::NotPositive));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&UserId::new(9)).unwrap();
        assert_eq!(json, "9");

        let id: ProductId = serde_json::from_str("12").unwrap();
        assert_eq!(id.as_i32(), 12);
    }

    #[test]
    fn test_display() {
        assert_eq!(CartItemId::new(5).to_string(), "5");
    }
}
