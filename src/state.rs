use std::sync::Arc;

use crate::billing::{BillingProvider, StripeClient};
use crate::config::{self, AppConfig, DatabaseConfig, StorageBackend};
use crate::database::{DatabaseManager, MemoryStorage, PgStorage, Storage};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    /// `None` when no payments secret is configured.
    pub billing: Option<Arc<dyn BillingProvider>>,
    /// Whether `POST /auth/login` may issue tokens.
    pub allow_dev_login: bool,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, billing: Option<Arc<dyn BillingProvider>>) -> Self {
        Self {
            storage,
            billing,
            allow_dev_login: config::config().security.allow_dev_login,
        }
    }

    pub fn with_dev_login(mut self, enabled: bool) -> Self {
        self.allow_dev_login = enabled;
        self
    }

    /// Opens the configured storage backend and payments client.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let storage = open_storage(&config.database).await?;

        let billing = match StripeClient::from_config(&config.billing)? {
            Some(client) => Some(Arc::new(client) as Arc<dyn BillingProvider>),
            None => {
                tracing::warn!("STRIPE_SECRET_KEY not set; billing endpoints will answer 503");
                None
            }
        };

        Ok(Self::new(storage, billing).with_dev_login(config.security.allow_dev_login))
    }
}

/// Connects the configured backend, applying migrations when enabled.
pub async fn open_storage(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(config).await?;
            if config.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Ok(Arc::new(PgStorage::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
