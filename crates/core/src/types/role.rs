//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid user role: {0}")]
pub struct RoleParseError(pub String);

/// Role carried in the session token and stored on `shop.user.role`.
///
/// Every user starts as [`UserRole::User`]; elevated roles are granted out of
/// band (e.g. `solemart-cli user set-role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    User,
    /// Can manage catalog entries.
    Seller,
    /// Full access.
    Admin,
}

impl UserRole {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Seller => "SELLER",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether this role is above the default `USER`.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        !matches!(self, Self::User)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "SELLER" => Ok(Self::Seller),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

// Stored as TEXT with a CHECK constraint rather than a Postgres enum.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UserRole {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UserRole {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UserRole {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_user() {
        assert_eq!(UserRole::default(), UserRole::User);
        assert!(!UserRole::User.is_elevated());
        assert!(UserRole::Seller.is_elevated());
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("seller".parse::<UserRole>().unwrap(), UserRole::Seller);
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        assert_eq!(serde_json::to_string(&UserRole::User).unwrap(), "\"USER\"");
        let role: UserRole = serde_json::from_str("\"SELLER\"").unwrap();
        assert_eq!(role, UserRole::Seller);
    }
}
