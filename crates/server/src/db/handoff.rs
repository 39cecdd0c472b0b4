//! Ephemeral handoff records (`temp_sections`).
//!
//! A record holds one generated Liquid section between the moment the
//! client stores it and the moment the finish page collects it after
//! OAuth. Every query filters on `expires_at`, so an expired row is
//! invisible even before the sweeper deletes it.

use chrono::{DateTime, Duration, Utc};
use section_forge_core::{DataKey, HandoffStatus, SessionId, ShopDomain};
use sqlx::PgPool;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// Parameters for inserting a handoff record.
#[derive(Debug, Clone)]
pub struct NewHandoff {
    pub data_key: DataKey,
    pub session_id: SessionId,
    pub shop: ShopDomain,
    pub liquid_code: String,
    pub schema: serde_json::Value,
    /// Lifetime from creation.
    pub ttl: Duration,
}

/// A stored handoff record.
#[derive(Debug, Clone)]
pub struct HandoffRecord {
    pub data_key: DataKey,
    pub session_id: SessionId,
    pub shop: ShopDomain,
    pub liquid_code: String,
    pub schema: serde_json::Value,
    pub status: HandoffStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub oauth_completed_at: Option<DateTime<Utc>>,
    pub retrieved_at: Option<DateTime<Utc>>,
}

/// Content released by a successful retrieval.
#[derive(Debug, Clone)]
pub struct RetrievedHandoff {
    pub liquid_code: String,
    pub schema: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct HandoffRow {
    data_key: String,
    session_id: String,
    shop: String,
    liquid_code: String,
    schema: serde_json::Value,
    status: HandoffStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    oauth_completed_at: Option<DateTime<Utc>>,
    retrieved_at: Option<DateTime<Utc>>,
}

impl TryFrom<HandoffRow> for HandoffRecord {
    type Error = RepositoryError;

    fn try_from(row: HandoffRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("temp_sections.{field}: {e}"))
        };

        Ok(Self {
            data_key: DataKey::parse(&row.data_key).map_err(|e| corrupt("data_key", &e))?,
            session_id: SessionId::parse(&row.session_id)
                .map_err(|e| corrupt("session_id", &e))?,
            shop: ShopDomain::parse(&row.shop).map_err(|e| corrupt("shop", &e))?,
            liquid_code: row.liquid_code,
            schema: row.schema,
            status: row.status,
            created_at: row.created_at,
            expires_at: row.expires_at,
            oauth_completed_at: row.oauth_completed_at,
            retrieved_at: row.retrieved_at,
        })
    }
}

// `retrieved_at` is non-null here: RETURNING sees the row after the SET.
#[derive(Debug, sqlx::FromRow)]
struct RetrievedRow {
    liquid_code: String,
    schema: serde_json::Value,
    created_at: DateTime<Utc>,
    retrieved_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for handoff record database operations.
pub struct HandoffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HandoffRepository<'a> {
    /// Create a new handoff repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new record in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// data key collision).
    pub async fn insert(&self, new: NewHandoff) -> Result<HandoffRecord, RepositoryError> {
        let created_at = Utc::now();
        let expires_at = created_at + new.ttl;

        let row = sqlx::query_as::<_, HandoffRow>(
            r"
            INSERT INTO temp_sections (
                data_key, session_id, shop, liquid_code, schema,
                status, created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                data_key, session_id, shop, liquid_code, schema, status,
                created_at, expires_at, oauth_completed_at, retrieved_at
            ",
        )
        .bind(new.data_key.as_str())
        .bind(new.session_id.as_str())
        .bind(new.shop.as_str())
        .bind(&new.liquid_code)
        .bind(&new.schema)
        .bind(HandoffStatus::Pending)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        HandoffRecord::try_from(row)
    }

    /// Look up a live (unexpired) record without changing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails or the row is corrupt.
    pub async fn get(&self, data_key: &DataKey) -> Result<Option<HandoffRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, HandoffRow>(
            r"
            SELECT
                data_key, session_id, shop, liquid_code, schema, status,
                created_at, expires_at, oauth_completed_at, retrieved_at
            FROM temp_sections
            WHERE data_key = $1 AND expires_at > NOW()
            ",
        )
        .bind(data_key.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(HandoffRecord::try_from).transpose()
    }

    /// Atomically release a record's content and mark it `retrieved`.
    ///
    /// Matches only an unexpired record for this key and shop whose status
    /// may move to `retrieved`. The status check and the update are one
    /// statement, so two concurrent callers cannot both receive the content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn take(
        &self,
        data_key: &DataKey,
        shop: &ShopDomain,
    ) -> Result<Option<RetrievedHandoff>, RepositoryError> {
        let row = sqlx::query_as::<_, RetrievedRow>(
            r"
            UPDATE temp_sections
            SET status = $3, retrieved_at = NOW()
            WHERE data_key = $1
              AND shop = $2
              AND status::text = ANY($4)
              AND expires_at > NOW()
            RETURNING liquid_code, schema, created_at, retrieved_at
            ",
        )
        .bind(data_key.as_str())
        .bind(shop.as_str())
        .bind(HandoffStatus::Retrieved)
        .bind(HandoffStatus::Retrieved.predecessors())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| RetrievedHandoff {
            liquid_code: r.liquid_code,
            schema: r.schema,
            created_at: r.created_at,
            retrieved_at: r.retrieved_at,
        }))
    }

    /// Move a `pending` record to `oauth_complete`.
    ///
    /// Returns `false` when no live pending record matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_oauth_complete(
        &self,
        data_key: &DataKey,
        shop: &ShopDomain,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE temp_sections
            SET status = $3, oauth_completed_at = NOW()
            WHERE data_key = $1
              AND shop = $2
              AND status::text = ANY($4)
              AND expires_at > NOW()
            ",
        )
        .bind(data_key.as_str())
        .bind(shop.as_str())
        .bind(HandoffStatus::OauthComplete)
        .bind(HandoffStatus::OauthComplete.predecessors())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every expired record regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM temp_sections WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
