//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use solemart_server::db::{self, RepositoryError};
use solemart_server::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Account creation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, seller, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user with the given email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    /// Seed file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A seed entry failed validation.
    #[error("Invalid product {name:?}: {reason}")]
    InvalidProduct { name: String, reason: String },
}

/// Database URL from `SOLEMART_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    std::env::var("SOLEMART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SOLEMART_DATABASE_URL"))
}

/// Load `.env` and open a pool against the configured database.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
