//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Database;
use crate::shopify::ShopifyClient;

/// Application state shared across all handlers.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    db: Database,
    shopify: ShopifyClient,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Nothing connects here: the database is reached on first use.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let db = Database::new(config.database_url.clone());
        let shopify = ShopifyClient::new(config.shopify.api_version.clone());
        Self::with_parts(config, db, shopify)
    }

    /// Build state from explicit parts (tests, alternate Shopify origins).
    #[must_use]
    pub fn with_parts(config: ServerConfig, db: Database, shopify: ShopifyClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                shopify,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }
}
