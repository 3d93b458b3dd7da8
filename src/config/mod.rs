use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

use crate::database::models::SubscriptionPlan;

/// Development-only signing secret; production refuses to start with it.
pub const DEV_JWT_SECRET: &str = "adflow-development-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub billing: BillingConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub backend: StorageBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub refresh_grace_days: i64,
    pub cors_origins: Vec<String>,
    pub allow_dev_login: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub api_base: String,
    pub api_version: String,
    pub price_ids: HashMap<SubscriptionPlan, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub list_limit: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in production")]
    InsecureJwtSecret,
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingDatabaseUrl,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Checks that must pass before the server binds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::InsecureJwtSecret);
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("ADFLOW_STORAGE") {
            self.database.backend = match v.as_str() {
                "memory" => StorageBackend::Memory,
                _ => StorageBackend::Postgres,
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(v) = env::var("ADFLOW_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_DEV_LOGIN") {
            self.security.allow_dev_login = v.parse().unwrap_or(self.security.allow_dev_login);
        }

        // Billing overrides
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            if !v.is_empty() {
                self.billing.secret_key = Some(v);
            }
        }
        if let Ok(v) = env::var("STRIPE_API_BASE") {
            self.billing.api_base = v;
        }
        for plan in SubscriptionPlan::ALL {
            let key = format!("STRIPE_PRICE_{}", plan.as_str().to_uppercase());
            if let Ok(v) = env::var(&key) {
                self.billing.price_ids.insert(*plan, v);
            }
        }

        if let Ok(v) = env::var("NOTIFICATIONS_LIST_LIMIT") {
            self.notifications.list_limit = v.parse().unwrap_or(self.notifications.list_limit);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                backend: StorageBackend::Postgres,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 5000,
                request_timeout_secs: 30,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                refresh_grace_days: 7,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                allow_dev_login: true,
            },
            billing: BillingConfig::with_defaults(),
            notifications: NotificationConfig { list_limit: 50 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                backend: StorageBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 5000,
                request_timeout_secs: 20,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                refresh_grace_days: 7,
                cors_origins: vec!["https://staging.adflow.app".to_string()],
                allow_dev_login: true,
            },
            billing: BillingConfig::with_defaults(),
            notifications: NotificationConfig { list_limit: 50 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                backend: StorageBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 5000,
                request_timeout_secs: 15,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 4,
                refresh_grace_days: 7,
                cors_origins: vec!["https://app.adflow.app".to_string()],
                allow_dev_login: false,
            },
            billing: BillingConfig::with_defaults(),
            notifications: NotificationConfig { list_limit: 50 },
        }
    }
}

impl BillingConfig {
    fn with_defaults() -> Self {
        let price_ids = SubscriptionPlan::ALL
            .iter()
            .map(|plan| (*plan, format!("price_{}", plan.as_str())))
            .collect();

        Self {
            secret_key: None,
            api_base: "https://api.stripe.com".to_string(),
            api_version: "2023-10-16".to_string(),
            price_ids,
        }
    }

    pub fn price_for(&self, plan: SubscriptionPlan) -> Option<&str> {
        self.price_ids.get(&plan).map(String::as_str)
    }

    pub fn plan_for_price(&self, price_id: &str) -> Option<SubscriptionPlan> {
        self.price_ids
            .iter()
            .find(|(_, id)| id.as_str() == price_id)
            .map(|(plan, _)| *plan)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.security.allow_dev_login);
        assert_eq!(config.notifications.list_limit, 50);
        assert!(config.billing.secret_key.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.security.allow_dev_login);
        assert!(!config.database.run_migrations);
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn production_rejects_development_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/adflow".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InsecureJwtSecret)));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn postgres_backend_requires_url() {
        let config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::MissingDatabaseUrl)));

        let mut memory = AppConfig::development();
        memory.database.backend = StorageBackend::Memory;
        assert!(memory.validate().is_ok());
    }

    #[test]
    fn price_ids_resolve_both_ways() {
        let billing = BillingConfig::with_defaults();
        assert_eq!(billing.price_for(SubscriptionPlan::Professional), Some("price_professional"));
        assert_eq!(billing.plan_for_price("price_enterprise"), Some(SubscriptionPlan::Enterprise));
        assert_eq!(billing.plan_for_price("price_unknown"), None);
    }
}
