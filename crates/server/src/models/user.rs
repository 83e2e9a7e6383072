//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use solemart_core::{Email, UserId, UserRole};

/// A Solemart user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address.
    pub email: Email,
    /// Display name, if known.
    pub name: Option<String>,
    /// Authorization role.
    pub role: UserRole,
    /// When the email was verified (OAuth sign-in marks it verified).
    pub email_verified_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Public user shape returned by the auth endpoints.
///
/// `first_name` and `last_name` are present only once a profile exists.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserResponse {
    /// Attach profile name parts.
    #[must_use]
    pub fn with_profile(mut self, profile: Option<&UserProfile>) -> Self {
        if let Some(profile) = profile {
            self.first_name = Some(profile.first_name.clone());
            self.last_name.clone_from(&profile.last_name);
        }
        self
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            first_name: None,
            last_name: None,
        }
    }
}

/// Profile attached to a user on first OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            email: Email::parse("ada@example.com").unwrap(),
            name: Some("Ada".to_string()),
            role: UserRole::User,
            email_verified_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_response_omits_name_parts_without_profile() {
        let value = serde_json::to_value(UserResponse::from(&user()).with_profile(None)).unwrap();
        assert_eq!(
            value,
            json!({"id": 7, "email": "ada@example.com", "name": "Ada", "role": "USER"})
        );
    }

    #[test]
    fn test_response_includes_profile_name_parts() {
        let profile = UserProfile {
            user_id: UserId::new(7),
            first_name: "Ada".to_string(),
            last_name: Some("King Lovelace".to_string()),
        };
        let value =
            serde_json::to_value(UserResponse::from(&user()).with_profile(Some(&profile))).unwrap();
        assert_eq!(value["first_name"], "Ada");
        assert_eq!(value["last_name"], "King Lovelace");
    }
}
