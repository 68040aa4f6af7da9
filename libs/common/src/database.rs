//! Database module for handling PostgreSQL connections and operations
//!
//! This module owns the connection pool lifecycle: configuration, connect,
//! schema bootstrap, handle access, health checks and shutdown.

use crate::error::{DatabaseError, DatabaseResult};
use serde::Deserialize;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// DDL for the `users` table. Safe to run on every startup.
pub const USERS_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Database configuration struct
///
/// Loaded from `DB_*` environment variables, e.g. `DB_HOST`, `DB_PORT`,
/// `DB_POOL_MAX`. Every field has a default so an empty environment yields
/// a local development configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database server host (`DB_HOST`, falling back to `DB_SERVER`)
    #[serde(default = "default_host")]
    pub host: String,
    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
    /// Login user
    #[serde(default = "default_user")]
    pub user: String,
    /// Login password
    #[serde(default)]
    pub password: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Require an encrypted connection
    #[serde(default)]
    pub encrypt: bool,
    /// Accept the server certificate without verifying it
    #[serde(default)]
    pub trust_server_certificate: bool,
    /// Maximum number of connections in the pool
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
    /// Minimum number of idle connections kept open
    #[serde(default)]
    pub pool_min: u32,
    /// Idle connection timeout in milliseconds
    #[serde(default = "default_pool_idle_timeout_ms")]
    pub pool_idle_timeout_ms: u64,
    /// Connection acquire timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "crud_api_db".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_pool_max() -> u32 {
    10
}

fn default_pool_idle_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from `DB_*` environment variables
    ///
    /// `DB_SERVER` is the older name for the host and is only read when
    /// `DB_HOST` is unset.
    pub fn from_env() -> DatabaseResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("DB").try_parsing(true))
            .build()?;

        let server = match settings.get_string("host") {
            Ok(_) => None,
            Err(_) => settings.get_string("server").ok(),
        };

        let mut config: Self = settings.try_deserialize()?;
        if let Some(server) = server {
            config.host = server;
        }
        Ok(config)
    }

    /// TLS mode derived from the encrypt / trust flags
    pub fn ssl_mode(&self) -> PgSslMode {
        match (self.encrypt, self.trust_server_certificate) {
            (false, _) => PgSslMode::Prefer,
            (true, true) => PgSslMode::Require,
            (true, false) => PgSslMode::VerifyFull,
        }
    }

    /// Connection options for the sqlx driver
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(self.ssl_mode())
    }

    /// Pool bounds for the sqlx driver
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.pool_max)
            .min_connections(self.pool_min)
            .idle_timeout(Duration::from_millis(self.pool_idle_timeout_ms))
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Storage gateway owning the PostgreSQL pool
///
/// Constructed explicitly and handed to whoever needs it; there is no
/// process-wide pool.
pub struct Database {
    config: DatabaseConfig,
    pool: Mutex<Option<PgPool>>,
}

impl Database {
    /// Create a gateway. No connection is opened until `connect()`.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
        }
    }

    /// Open the pool, or return the existing one
    pub async fn connect(&self) -> DatabaseResult<PgPool> {
        let mut slot = self.pool.lock().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        info!(
            "Connecting to PostgreSQL at {}:{}/{}",
            self.config.host, self.config.port, self.config.database
        );

        let pool = self
            .config
            .pool_options()
            .connect_with(self.config.connect_options())
            .await
            .map_err(DatabaseError::Connection)?;

        info!("Database connection pool initialized successfully");
        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Create the `users` table if it does not exist
    pub async fn ensure_schema(&self) -> DatabaseResult<()> {
        let pool = self.pool().await?;

        sqlx::query(USERS_TABLE_DDL)
            .execute(&pool)
            .await
            .map_err(DatabaseError::Schema)?;

        info!("Users table created or already exists");
        Ok(())
    }

    /// The active pool
    pub async fn pool(&self) -> DatabaseResult<PgPool> {
        self.pool
            .lock()
            .await
            .as_ref()
            .cloned()
            .ok_or(DatabaseError::NotConnected)
    }

    /// Close the pool. Calling this more than once is a no-op.
    pub async fn close(&self) {
        let pool = self.pool.lock().await.take();
        match pool {
            Some(pool) => {
                pool.close().await;
                info!("Database connection closed");
            }
            None => warn!("Database close requested but no pool is open"),
        }
    }

    /// Configuration this gateway was built with
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - PostgreSQL connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tokio_test::{assert_err, assert_ok};

    const DB_VARS: [&str; 7] = [
        "DB_HOST",
        "DB_SERVER",
        "DB_PORT",
        "DB_PASSWORD",
        "DB_ENCRYPT",
        "DB_TRUST_SERVER_CERTIFICATE",
        "DB_POOL_MAX",
    ];

    fn clear_db_vars() {
        for var in DB_VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_database_config_defaults() {
        clear_db_vars();

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.pool_max, 10);
        assert_eq!(config.pool_min, 0);
        assert_eq!(config.pool_idle_timeout_ms, 30_000);
        assert!(!config.encrypt);
    }

    #[test]
    #[serial]
    fn test_database_config_from_env_with_custom_values() {
        clear_db_vars();
        unsafe {
            std::env::set_var("DB_SERVER", "db.internal");
            std::env::set_var("DB_PORT", "6543");
            std::env::set_var("DB_PASSWORD", "12345");
            std::env::set_var("DB_ENCRYPT", "true");
            std::env::set_var("DB_TRUST_SERVER_CERTIFICATE", "true");
            std::env::set_var("DB_POOL_MAX", "20");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.password, "12345");
        assert_eq!(config.pool_max, 20);
        assert!(matches!(config.ssl_mode(), PgSslMode::Require));

        clear_db_vars();
    }

    #[test]
    #[serial]
    fn test_database_host_wins_over_server() {
        clear_db_vars();
        unsafe {
            std::env::set_var("DB_HOST", "primary.internal");
            std::env::set_var("DB_SERVER", "legacy.internal");
        }

        let config = assert_ok!(DatabaseConfig::from_env());
        assert_eq!(config.host, "primary.internal");

        clear_db_vars();
    }

    #[test]
    #[serial]
    fn test_database_config_rejects_bad_port() {
        clear_db_vars();
        unsafe {
            std::env::set_var("DB_PORT", "not-a-port");
        }

        let result = DatabaseConfig::from_env();
        assert!(matches!(result, Err(DatabaseError::Configuration(_))));

        clear_db_vars();
    }

    #[test]
    #[serial]
    fn test_ssl_mode_mapping() {
        clear_db_vars();
        let mut config = DatabaseConfig::from_env().unwrap();
        assert!(matches!(config.ssl_mode(), PgSslMode::Prefer));

        config.encrypt = true;
        assert!(matches!(config.ssl_mode(), PgSslMode::VerifyFull));

        config.trust_server_certificate = true;
        assert!(matches!(config.ssl_mode(), PgSslMode::Require));
    }

    #[tokio::test]
    #[serial]
    async fn test_pool_before_connect_is_not_connected() {
        clear_db_vars();
        let database = Database::new(DatabaseConfig::from_env().unwrap());

        let result = database.pool().await;
        assert!(matches!(result, Err(DatabaseError::NotConnected)));
        assert_err!(database.ensure_schema().await);
    }

    #[tokio::test]
    #[serial]
    async fn test_close_is_idempotent_without_connection() {
        clear_db_vars();
        let database = Database::new(DatabaseConfig::from_env().unwrap());

        database.close().await;
        database.close().await;
        assert_err!(database.pool().await);
        assert_ok!(DatabaseConfig::from_env());
    }
}
