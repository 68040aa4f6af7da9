//! Common library for the users service
//!
//! This crate provides the storage gateway used by the HTTP service:
//! PostgreSQL configuration, pool lifecycle, schema bootstrap and the
//! shared database error type.
//!
//! ```rust,no_run
//! use common::database::{Database, DatabaseConfig, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let database = Database::new(DatabaseConfig::from_env()?);
//!     let pool = database.connect().await?;
//!     database.ensure_schema().await?;
//!     println!("Database health check: {}", health_check(&pool).await?);
//!     database.close().await;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
