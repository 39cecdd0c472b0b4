//! Installed-shop repository.
//!
//! One row per shop domain, overwritten on every successful OAuth callback
//! so the stored access token is always the most recent exchange.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use section_forge_core::ShopDomain;
use sqlx::PgPool;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// An installed shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct Shop {
    /// Shop domain (e.g., your-store.myshopify.com).
    pub shop: ShopDomain,
    /// OAuth access token (redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// First successful install.
    pub installed_at: DateTime<Utc>,
    /// Most recent successful authorization.
    pub last_auth_at: DateTime<Utc>,
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("installed_at", &self.installed_at)
            .field("last_auth_at", &self.last_auth_at)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    shop: String,
    access_token: String,
    scope: String,
    installed_at: DateTime<Utc>,
    last_auth_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop)
            .map_err(|e| RepositoryError::DataCorruption(format!("shop {}: {e}", row.shop)))?;

        Ok(Self {
            shop,
            access_token: SecretString::from(row.access_token),
            scopes: split_scopes(&row.scope),
            installed_at: row.installed_at,
            last_auth_at: row.last_auth_at,
        })
    }
}

/// Split a comma-separated scope string, dropping blanks.
#[must_use]
pub fn split_scopes(scope: &str) -> Vec<String> {
    scope
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for installed-shop database operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an installed shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, shop: &ShopDomain) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            SELECT shop, access_token, scope, installed_at, last_auth_at
            FROM shops
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Shop::try_from).transpose()
    }

    /// Insert or overwrite the token for a shop.
    ///
    /// `installed_at` is set on first insert only; `last_auth_at` is bumped
    /// on every call.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        scopes: &[String],
    ) -> Result<(), RepositoryError> {
        let scope = scopes.join(",");

        sqlx::query(
            r"
            INSERT INTO shops (shop, access_token, scope, installed_at, last_auth_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                last_auth_at = NOW()
            ",
        )
        .bind(shop.as_str())
        .bind(access_token.expose_secret())
        .bind(scope)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scopes() {
        assert_eq!(
            split_scopes("write_themes, read_themes,,"),
            vec!["write_themes".to_string(), "read_themes".to_string()]
        );
        assert!(split_scopes("").is_empty());
    }

    #[test]
    fn test_shop_debug_redacts_token() {
        let shop = Shop {
            shop: ShopDomain::parse("a.myshopify.com").expect("valid shop"),
            access_token: SecretString::from("shpat_very_secret"),
            scopes: vec!["write_themes".to_string()],
            installed_at: Utc::now(),
            last_auth_at: Utc::now(),
        };
        let debug = format!("{shop:?}");
        assert!(debug.contains("a.myshopify.com"));
        assert!(!debug.contains("shpat_very_secret"));
    }
}
