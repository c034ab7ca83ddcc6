use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::config::ConfigError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations over a dedicated blocking connection.
pub fn apply_migrations(database_url: &str) -> Result<(), ConfigError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|e| ConfigError::Migration(e.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| ConfigError::Migration(e.to_string()))?;
    tracing::info!(count = applied.len(), "applied migrations");
    Ok(())
}

pub fn revert_migrations(database_url: &str) -> Result<(), ConfigError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|e| ConfigError::Migration(e.to_string()))?;
    let reverted = conn
        .revert_all_migrations(MIGRATIONS)
        .map_err(|e| ConfigError::Migration(e.to_string()))?;
    tracing::info!(count = reverted.len(), "reverted migrations");
    Ok(())
}

/// [`apply_migrations`] off the async executor.
pub async fn run_migrations(database_url: &str) -> Result<(), ConfigError> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || apply_migrations(&database_url))
        .await
        .map_err(|e| ConfigError::Migration(e.to_string()))?
}
