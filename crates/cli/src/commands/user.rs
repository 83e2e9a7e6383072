//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a credential user (role defaults to user)
//! solemart-cli user create -e seller@example.com -p 'long-password' -n "Shop Owner" -r seller
//!
//! # Change an existing user's role
//! solemart-cli user set-role -e buyer@example.com -r admin
//! ```
//!
//! Role changes reach signed-in users the next time their session token is
//! refreshed.

use solemart_core::{Email, UserId, UserRole};
use solemart_server::db::{RepositoryError, UserRepository};
use solemart_server::services::auth::AuthService;

use super::{CommandError, connect};

fn parse_role(role: &str) -> Result<UserRole, CommandError> {
    role.parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))
}

/// Create a credential user with the given role.
///
/// # Errors
///
/// Returns an error if the role or email is invalid, the password is too
/// short, the email is taken, or the database is unreachable.
pub async fn create(
    email: &str,
    password: &str,
    name: Option<&str>,
    role: &str,
) -> Result<UserId, CommandError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .create_user(email, password, name, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id)
}

/// Change the role of an existing user.
///
/// # Errors
///
/// Returns an error if the role or email is invalid or no such user exists.
pub async fn set_role(email: &str, role: &str) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let email = Email::parse(email).map_err(|_| CommandError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::UserNotFound(email.to_string()),
            other => CommandError::Repository(other),
        })?;

    tracing::info!("Role for {} is now {}", user.email, user.role);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_is_case_insensitive() {
        assert!(matches!(parse_role("seller"), Ok(UserRole::Seller)));
        assert!(matches!(parse_role("ADMIN"), Ok(UserRole::Admin)));
    }

    #[test]
    fn test_parse_role_rejects_unknown() {
        assert!(matches!(
            parse_role("super_admin"),
            Err(CommandError::InvalidRole(r)) if r == "super_admin"
        ));
    }
}
