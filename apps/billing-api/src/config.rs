//! Billing API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use dine_core::{NumberingStrategy, Role};
use serde::{Deserialize, Serialize};

/// Billing API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// Interface to bind
    pub bind_addr: IpAddr,

    /// SQLite database file
    pub database_path: String,

    /// Maximum pooled connections
    pub db_max_connections: u32,

    /// JWT secret key for signing and validating tokens
    pub jwt_secret: String,

    /// Lifetime of tokens issued at login
    pub token_lifetime_secs: i64,

    /// Concurrent logins allowed per admin account
    pub admin_max_sessions: usize,

    /// Concurrent logins allowed per staff account
    pub staff_max_sessions: usize,

    /// Lifetime of the cached open-orders list
    pub open_orders_ttl_secs: u64,

    /// Lifetime of cached analytics reports
    pub daily_stats_ttl_secs: u64,

    /// Lifetime of cached menu and category listings
    pub catalog_ttl_secs: u64,

    /// How often expired cache entries are purged
    pub cache_sweep_interval_secs: u64,

    /// How bill numbers are proposed
    pub bill_numbering: NumberingStrategy,

    /// Accept Open → Paid without a generated bill
    pub allow_direct_settlement: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./dine.db".to_string()),

            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            jwt_secret: env::var("JWT_SECRET")
                // In production, this MUST be set via environment variable
                .unwrap_or_else(|_| "dine-pos-dev-secret-change-in-production".to_string()),

            token_lifetime_secs: env::var("JWT_LIFETIME_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 1 day
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()))?,

            admin_max_sessions: env::var("ADMIN_MAX_CONCURRENT_LOGINS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ADMIN_MAX_CONCURRENT_LOGINS".to_string()))?,

            staff_max_sessions: env::var("STAFF_MAX_CONCURRENT_LOGINS")
                .or_else(|_| env::var("CUSTOMER_MAX_CONCURRENT_LOGINS"))
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STAFF_MAX_CONCURRENT_LOGINS".to_string()))?,

            open_orders_ttl_secs: env::var("OPEN_ORDERS_TTL_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("OPEN_ORDERS_TTL_SECS".to_string()))?,

            daily_stats_ttl_secs: env::var("DAILY_STATS_TTL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DAILY_STATS_TTL_SECS".to_string()))?,

            catalog_ttl_secs: env::var("CATALOG_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CATALOG_TTL_SECS".to_string()))?,

            cache_sweep_interval_secs: env::var("CACHE_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string()) // 5 minutes
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CACHE_SWEEP_INTERVAL_SECS".to_string()))?,

            bill_numbering: env::var("BILL_NUMBERING")
                .unwrap_or_else(|_| "sequential".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BILL_NUMBERING".to_string()))?,

            allow_direct_settlement: env::var("ALLOW_DIRECT_SETTLEMENT")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ALLOW_DIRECT_SETTLEMENT".to_string()))?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if self.admin_max_sessions == 0 {
            return Err(ConfigError::InvalidValue("ADMIN_MAX_CONCURRENT_LOGINS".to_string()));
        }
        if self.staff_max_sessions == 0 {
            return Err(ConfigError::InvalidValue("STAFF_MAX_CONCURRENT_LOGINS".to_string()));
        }
        if self.cache_sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("CACHE_SWEEP_INTERVAL_SECS".to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }

    pub fn open_orders_ttl(&self) -> Duration {
        Duration::from_secs(self.open_orders_ttl_secs)
    }

    pub fn daily_stats_ttl(&self) -> Duration {
        Duration::from_secs(self.daily_stats_ttl_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    /// Concurrent logins allowed for an account with `role`.
    pub fn max_sessions(&self, role: Role) -> usize {
        match role {
            Role::Admin => self.admin_max_sessions,
            Role::Staff => self.staff_max_sessions,
        }
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }
}

impl Default for ApiConfig {
    /// Development defaults, identical to `load()` with no variables set.
    fn default() -> Self {
        ApiConfig {
            http_port: 5000,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            database_path: "./dine.db".to_string(),
            db_max_connections: 5,
            jwt_secret: "dine-pos-dev-secret-change-in-production".to_string(),
            token_lifetime_secs: 86400,
            admin_max_sessions: 1,
            staff_max_sessions: 5,
            open_orders_ttl_secs: 10,
            daily_stats_ttl_secs: 30,
            catalog_ttl_secs: 60,
            cache_sweep_interval_secs: 300,
            bill_numbering: NumberingStrategy::Sequential,
            allow_direct_settlement: false,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
