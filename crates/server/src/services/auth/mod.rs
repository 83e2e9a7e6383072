//! Authentication service.
//!
//! Provides credential (email + password) and OAuth sign-in, plus the role
//! refresh used when a session token is re-issued.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use solemart_core::{DisplayName, Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::session::SessionUser;
use crate::models::user::{User, UserProfile};
use crate::services::oauth::OAuthProfile;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new `USER` with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        self.create_user(email, password, name, UserRole::User)
            .await
    }

    /// Create a credential user with an explicit role.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register_with_password`].
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let user = self
            .users
            .create_with_password(&email, name, role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Unknown emails, OAuth-only users, and wrong passwords are
    /// indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Resolve the local user for a provider profile.
    ///
    /// Looks the user up by linked account, then by email; creates a verified
    /// user when neither matches. The provider account is linked if it was not
    /// already. On the first link the display name is split into a profile
    /// (when the user has none), and the user's name and email verification
    /// are filled in where missing.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the provider email is malformed.
    /// Returns `AuthError::Repository` if a database operation fails.
    pub async fn sign_in_with_oauth(&self, profile: &OAuthProfile) -> Result<User, AuthError> {
        let email = Email::parse(&profile.email)?;
        let provider = profile.provider.as_str();
        let name = profile.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

        let user = if let Some(user) = self
            .users
            .get_by_oauth_account(provider, &profile.provider_account_id)
            .await?
        {
            user
        } else {
            self.find_or_create_by_email(&email, name).await?
        };

        let newly_linked = self
            .users
            .link_oauth_account(user.id, provider, &profile.provider_account_id)
            .await?;

        if !newly_linked {
            return Ok(user);
        }

        tracing::info!(user_id = %user.id, provider, "Linked OAuth account");

        if let Some(parts) = name.and_then(DisplayName::split) {
            self.users
                .create_profile_if_absent(user.id, &parts.first_name, parts.last_name.as_deref())
                .await?;
        }

        Ok(self.users.fill_oauth_defaults(user.id, name).await?)
    }

    async fn find_or_create_by_email(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        if let Some(user) = self.users.get_by_email(email).await? {
            return Ok(user);
        }

        match self.users.create_verified(email, name).await {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent sign-in for the same email.
            Err(RepositoryError::Conflict(_)) => self
                .users
                .get_by_email(email)
                .await?
                .ok_or(AuthError::Repository(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Session Tokens
    // =========================================================================

    /// Re-issue a session token with the role currently stored for the user.
    ///
    /// Returns `None` if the user no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn refresh_session(
        &self,
        token: &SessionUser,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionUser>, AuthError> {
        let user = self.users.get_by_id(token.id).await?;

        Ok(user.map(|user| {
            if user.role != token.role {
                tracing::info!(
                    user_id = %user.id,
                    from = %token.role,
                    to = %user.role,
                    "Role changed; session token updated"
                );
            }
            SessionUser::issue(&user, now)
        }))
    }

    /// Load the user behind a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn current_user(&self, token: &SessionUser) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_id(token.id).await?)
    }

    /// Profile name parts attached on first OAuth sign-in, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn profile(&self, user: &User) -> Result<Option<UserProfile>, AuthError> {
        Ok(self.users.get_profile(user.id).await?)
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
