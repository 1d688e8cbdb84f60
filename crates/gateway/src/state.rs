//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::MySqlPool;

use crate::config::GatewayConfig;
use crate::db::{Statements, TableGateway};
use crate::locks::KeyedLocks;
use crate::services::{
    AuthCache, BatchService, CatalogService, CatalogSettings, CurrencyService, DbKeyStore,
    ImageService, ImageStore, OrderService,
};
use crate::slack::SlackClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every service shares the same
/// pool, statement registry and keyed locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    pool: MySqlPool,
    statements: Arc<Statements>,
    auth: AuthCache<DbKeyStore>,
    catalog: CatalogService,
    images: ImageService,
    batch: BatchService,
    orders: OrderService,
    currency: CurrencyService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Gateway configuration
    /// * `pool` - Storefront `MySQL` connection pool
    #[must_use]
    pub fn new(config: GatewayConfig, pool: MySqlPool) -> Self {
        let statements = Arc::new(Statements::new(config.database.table_prefix.clone()));
        let locks = Arc::new(KeyedLocks::new());

        let auth = AuthCache::new(
            DbKeyStore::new(pool.clone(), Arc::clone(&statements)),
            config.api_key.clone(),
            config.auth_cache_ttl,
        );
        let catalog = CatalogService::new(
            pool.clone(),
            Arc::clone(&statements),
            Arc::clone(&locks),
            CatalogSettings {
                custom_fields: config.product_custom_fields.clone(),
                tax_class_id: config.default_tax_class_id,
            },
        );
        let images = ImageService::new(
            pool.clone(),
            Arc::clone(&statements),
            Arc::clone(&locks),
            ImageStore::from_config(&config.images),
        );
        let batch = BatchService::new(
            pool.clone(),
            Arc::clone(&statements),
            images.clone(),
            config.slack().map(SlackClient::from_config),
            config.socket_addr().to_string(),
        );
        let orders = OrderService::new(pool.clone(), Arc::clone(&statements));
        let currency = CurrencyService::new(pool.clone(), Arc::clone(&statements));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                statements,
                auth,
                catalog,
                images,
                batch,
                orders,
                currency,
            }),
        }
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &MySqlPool {
        &self.inner.pool
    }

    /// Get a reference to the prefixed statement registry.
    #[must_use]
    pub fn statements(&self) -> &Statements {
        &self.inner.statements
    }

    #[must_use]
    pub fn auth(&self) -> &AuthCache<DbKeyStore> {
        &self.inner.auth
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn images(&self) -> &ImageService {
        &self.inner.images
    }

    #[must_use]
    pub fn batch(&self) -> &BatchService {
        &self.inner.batch
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn currency(&self) -> &CurrencyService {
        &self.inner.currency
    }

    /// Guarded access to whitelisted tables.
    #[must_use]
    pub fn tables(&self) -> TableGateway<'_> {
        TableGateway::new(&self.inner.pool, &self.inner.statements)
    }
}
