//! `sf-cli migrate`: apply `crates/server/migrations`.

use section_forge_server::db::{MIGRATOR, create_pool};

use super::{CommandError, database_url};

/// Run pending server migrations.
///
/// # Errors
///
/// Returns `CommandError` if `DATABASE_URL` is unset, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
