//! Database migration command.
//!
//! Applies the migrations embedded in `fanatik-api` (`crates/api/migrations/`).
//! Already-applied migrations are skipped, so running it twice is harmless.

use fanatik_api::db::MIGRATOR;
use sqlx::PgPool;

use super::CommandError;

/// Run pending migrations.
///
/// # Errors
///
/// Returns `CommandError::Migration` if a migration fails or the recorded
/// checksums no longer match the embedded files.
pub async fn run(pool: &PgPool) -> Result<(), CommandError> {
    tracing::info!("Running migrations...");
    MIGRATOR.run(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
