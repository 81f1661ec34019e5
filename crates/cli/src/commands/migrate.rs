//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! gurus-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FORUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Forum migrations live in `crates/forum/migrations/` and are embedded at
//! compile time:
//! ```text
//! migrations/
//! ├── 20241019000001_create_forum_schema.sql
//! └── 20241019000002_create_sessions.sql
//! ```

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Errors from running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Read the forum database URL from the environment.
fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("FORUM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("FORUM_DATABASE_URL"))
}

/// Run forum database migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable, or
/// a migration fails.
pub async fn forum() -> Result<(), MigrationError> {
    let _ = dotenvy::dotenv();

    let database_url = database_url()?;

    tracing::info!("Connecting to forum database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running forum migrations...");
    sqlx::migrate!("../forum/migrations").run(&pool).await?;

    tracing::info!("Forum migrations complete!");
    Ok(())
}
