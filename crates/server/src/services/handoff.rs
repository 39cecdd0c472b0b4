//! Data handoff store.
//!
//! A generated section is stored under a random 256-bit key before the
//! browser leaves for Shopify's OAuth screen. The key rides along in the
//! signed OAuth state, and the finish page collects the section with it once.
//!
//! ```text
//! store ─► pending ─► oauth_complete ─► retrieved
//!             └──────────────────────────┘
//! ```
//!
//! Records expire 30 minutes after creation whatever their status.

use std::time::Duration;

use section_forge_core::{DataKey, SessionId, ShopDomain};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::db::{Database, HandoffRepository, NewHandoff, RepositoryError, RetrievedHandoff};
use crate::error::AppError;

/// Lifetime of a handoff record.
pub const HANDOFF_TTL: chrono::Duration = chrono::Duration::minutes(30);

const NOT_FOUND_HINT: &str = "The section may have expired (30 minutes), already been \
     retrieved, or belong to another shop. Generate it again and restart the install.";

/// Keys returned by [`HandoffService::store`].
#[derive(Debug, Clone)]
pub struct StoredHandoff {
    pub data_key: DataKey,
    pub session_id: SessionId,
}

/// Accept a schema sent either as a JSON value or as a string holding JSON.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the schema is null or a string that is
/// not valid JSON.
pub fn normalize_schema(schema: serde_json::Value) -> Result<serde_json::Value, AppError> {
    match schema {
        serde_json::Value::Null => Err(AppError::BadRequest("Missing schema".to_string())),
        serde_json::Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| AppError::BadRequest(format!("Schema is not valid JSON: {e}"))),
        other => Ok(other),
    }
}

/// Handoff store operations over the shared database.
pub struct HandoffService<'a> {
    db: &'a Database,
}

impl<'a> HandoffService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Persist a generated section as a `pending` record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the database is unreachable or the
    /// insert fails.
    #[instrument(skip(self, liquid_code, schema), fields(shop = %shop))]
    pub async fn store(
        &self,
        shop: &ShopDomain,
        liquid_code: String,
        schema: serde_json::Value,
    ) -> Result<StoredHandoff, AppError> {
        let pool = self.db.acquire().await?;

        let record = HandoffRepository::new(pool)
            .insert(NewHandoff {
                data_key: DataKey::generate(),
                session_id: SessionId::generate(),
                shop: shop.clone(),
                liquid_code,
                schema,
                ttl: HANDOFF_TTL,
            })
            .await?;

        info!(data_key = ?record.data_key, expires_at = %record.expires_at, "Stored handoff");

        Ok(StoredHandoff {
            data_key: record.data_key,
            session_id: record.session_id,
        })
    }

    /// Release a stored section exactly once.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no live, unretrieved record matches
    /// the key and shop, and `AppError::Database` on database failure.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn retrieve(
        &self,
        data_key: &DataKey,
        shop: &ShopDomain,
    ) -> Result<RetrievedHandoff, AppError> {
        let pool = self.db.acquire().await?;

        HandoffRepository::new(pool)
            .take(data_key, shop)
            .await?
            .ok_or_else(|| AppError::not_found("Data not found or expired", NOT_FOUND_HINT))
    }

    /// Record that OAuth finished for the record's shop.
    ///
    /// Missing or non-pending records are not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn mark_oauth_complete(
        &self,
        data_key: &DataKey,
        shop: &ShopDomain,
    ) -> Result<bool, RepositoryError> {
        let pool = self.db.acquire().await?;
        let updated = HandoffRepository::new(pool)
            .mark_oauth_complete(data_key, shop)
            .await?;

        if updated {
            debug!(?data_key, "Handoff marked oauth_complete");
        } else {
            debug!(?data_key, "No pending handoff to mark");
        }
        Ok(updated)
    }

    /// Delete expired records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let pool = self.db.acquire().await?;
        HandoffRepository::new(pool).delete_expired().await
    }
}

/// Periodically delete expired handoff records.
///
/// Failures are logged and retried on the next tick. The task runs until
/// aborted.
pub fn spawn_expiry_sweeper(db: Database, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match HandoffService::new(&db).purge_expired().await {
                Ok(0) => {}
                Ok(deleted) => info!(deleted, "Purged expired handoff records"),
                Err(e) => warn!(error = %e, "Handoff sweep failed"),
            }
        }
    })
}
