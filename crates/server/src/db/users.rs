//! User repository for database operations.
//!
//! Covers credential users, linked OAuth accounts, and profiles. Queries are
//! checked at runtime (`query_as` + `FromRow`) and rows are converted into
//! domain types, so malformed stored data surfaces as `DataCorruption`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use solemart_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::{User, UserProfile};

const USER_COLUMNS: &str = "id, email, name, role, email_verified_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: Option<String>,
    role: UserRole,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            email_verified_at: row.email_verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: i32,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash.
    ///
    /// Returns `None` both for unknown emails and for OAuth-only users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT u.id, u.email, u.name, u.role, u.email_verified_at,
                   u.created_at, u.updated_at, p.password_hash
            FROM shop.user u
            JOIN shop.user_password p ON p.user_id = u.id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a new user with email and password in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: Option<&str>,
        role: UserRole,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO shop.user (email, name, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(name)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email already exists"))?;

        let user = User::try_from(row)?;

        sqlx::query("INSERT INTO shop.user_password (user_id, password_hash) VALUES ($1, $2)")
            .bind(user.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Create a user from an OAuth profile. The email counts as verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_verified(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO shop.user (email, name, email_verified_at)
            VALUES ($1, $2, NOW())
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email already exists"))?;

        User::try_from(row)
    }

    /// Find the user linked to a provider account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_oauth_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT u.id, u.email, u.name, u.role, u.email_verified_at,
                   u.created_at, u.updated_at
            FROM shop.user u
            JOIN shop.oauth_account a ON a.user_id = u.id
            WHERE a.provider = $1 AND a.provider_account_id = $2
            ",
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Link a provider account to a user. Linking an already-linked account
    /// is a no-op.
    ///
    /// Returns `true` when a new link was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn link_oauth_account(
        &self,
        user_id: UserId,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO shop.oauth_account (user_id, provider, provider_account_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, provider_account_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(provider)
        .bind(provider_account_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, first_name, last_name FROM shop.user_profile WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| UserProfile {
            user_id: UserId::new(r.user_id),
            first_name: r.first_name.unwrap_or_default(),
            last_name: r.last_name,
        }))
    }

    /// Attach a profile unless one already exists.
    ///
    /// Returns `true` when the profile was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_profile_if_absent(
        &self,
        user_id: UserId,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO shop.user_profile (user_id, first_name, last_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fill in the display name and email verification time, keeping any
    /// values that are already set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user no longer exists.
    pub async fn fill_oauth_defaults(
        &self,
        user_id: UserId,
        name: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.user
            SET name = COALESCE(name, $2),
                email_verified_at = COALESCE(email_verified_at, NOW())
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE shop.user SET role = $2 WHERE email = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }
}
