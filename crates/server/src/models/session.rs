//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solemart_core::{Email, UserId, UserRole};

use super::user::User;

/// Seconds after which the session token is re-issued with a fresh role.
pub const SESSION_TOKEN_REFRESH_SECS: i64 = 300;

/// Session-stored user identity (the session token).
///
/// Carries the role so authorization does not need a query per request; the
/// role is re-read from the database whenever the token is re-issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Role as of `issued_at`.
    pub role: UserRole,
    /// When this token was issued.
    pub issued_at: DateTime<Utc>,
}

impl SessionUser {
    /// Issue a token for `user` at `now`.
    #[must_use]
    pub fn issue(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            issued_at: now,
        }
    }

    /// Whether the token is old enough to be re-issued.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        (now - self.issued_at).num_seconds() >= SESSION_TOKEN_REFRESH_SECS
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the OAuth `state` parameter (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";
}
