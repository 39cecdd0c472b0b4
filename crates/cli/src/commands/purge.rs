//! `sf-cli purge-expired`: one-off sweep of expired handoff records.

use section_forge_server::db::Database;
use section_forge_server::services::HandoffService;

use super::{CommandError, database_url};

/// Delete every handoff record past its expiry and return how many went.
///
/// # Errors
///
/// Returns `CommandError` if `DATABASE_URL` is unset or the delete fails.
pub async fn run() -> Result<u64, CommandError> {
    let db = Database::new(database_url()?);

    let deleted = HandoffService::new(&db).purge_expired().await?;
    tracing::info!(deleted, "Purged expired handoff records");
    Ok(deleted)
}
