//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! solemart-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SOLEMART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Applies the `shop` schema migrations from `crates/server/migrations/`, then
//! creates the session table used by the server's session store.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
