//! Database access for the Section Forge server.
//!
//! # Tables
//!
//! - `shops` - One row per installed shop (OAuth access token, scopes)
//! - `temp_sections` - Ephemeral generated sections awaiting handoff
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p section-forge-cli -- migrate
//! ```
//!
//! # Connection lifecycle
//!
//! [`Database`] is the process-wide gateway. It connects lazily on the first
//! [`Database::acquire`] and hands out the same pool for the rest of the
//! process lifetime. Handlers that never touch the database (rendering,
//! install redirects) therefore never open a connection.

pub mod handoff;
pub mod shops;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::OnceCell;

pub use handoff::{HandoffRecord, HandoffRepository, NewHandoff, RetrievedHandoff};
pub use shops::{Shop, ShopRepository};

/// Embedded migrations for the server schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Lazily-connected, process-wide database handle.
///
/// Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    url: SecretString,
    pool: OnceCell<PgPool>,
}

impl Database {
    /// Create a gateway that will connect to `url` on first use.
    #[must_use]
    pub fn new(url: SecretString) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                url,
                pool: OnceCell::new(),
            }),
        }
    }

    /// Wrap an already-connected pool. Index setup is not re-run.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                url: SecretString::from(String::new()),
                pool: OnceCell::from(pool),
            }),
        }
    }

    /// Return the shared pool, connecting on the first call.
    ///
    /// The first successful call also ensures the expiry index on
    /// `temp_sections`; index failures are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the connection cannot be established.
    /// A failed attempt is not cached; the next call retries.
    pub async fn acquire(&self) -> Result<&PgPool, RepositoryError> {
        let pool = self
            .inner
            .pool
            .get_or_try_init(|| async {
                let pool = create_pool(&self.inner.url).await?;
                tracing::info!("Database pool created");
                ensure_expiry_index(&pool).await;
                Ok::<_, sqlx::Error>(pool)
            })
            .await?;
        Ok(pool)
    }

    /// Whether the first connection has already been made.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.pool.initialized()
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Make sure expired handoff rows can be found without a sequential scan.
///
/// Automatic expiry is an optimization; reads filter on `expires_at`
/// themselves, so a failure here must not fail the request.
async fn ensure_expiry_index(pool: &PgPool) {
    let result = sqlx::query(
        "CREATE INDEX IF NOT EXISTS temp_sections_expires_at_idx ON temp_sections (expires_at)",
    )
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to ensure temp_sections expiry index");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_database_is_not_connected() {
        let db = Database::new(SecretString::from("postgres://localhost/none"));
        assert!(!db.is_connected());
    }

    #[test]
    fn test_database_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<Database>();
    }

    #[tokio::test]
    async fn test_acquire_failure_is_not_cached() {
        // Port 1 is never a PostgreSQL server.
        let db = Database::new(SecretString::from("postgres://user:pw@127.0.0.1:1/none"));
        assert!(db.acquire().await.is_err());
        assert!(!db.is_connected());
    }
}
