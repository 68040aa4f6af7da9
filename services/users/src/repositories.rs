//! Repositories for database operations

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewUser, User, UserPatch};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgUserRepository;

/// Repository failure
///
/// Absence of a row is not an error: lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The `email` unique constraint rejected the write
    #[error("Unique constraint violation")]
    UniqueViolation,

    /// Any other driver or I/O failure
    #[error("Storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::UniqueViolation
            }
            _ => RepositoryError::Storage(err),
        }
    }
}

/// Type alias for repository results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// User persistence port
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it with its generated id and timestamp
    async fn create(&self, new_user: &NewUser) -> RepositoryResult<User>;

    /// All users, newest first
    async fn find_all(&self) -> RepositoryResult<Vec<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Apply a partial update. `None` when the id does not exist.
    async fn update_by_id(&self, id: i64, patch: &UserPatch) -> RepositoryResult<Option<User>>;

    /// Remove a user and return the row as it was before deletion
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    /// Whether the backing store answers
    async fn health_check(&self) -> bool;
}
