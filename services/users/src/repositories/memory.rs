//! In-memory user repository used by the handler tests

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{RepositoryError, RepositoryResult, UserRepository};
use crate::models::{NewUser, User, UserPatch};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<User>,
}

/// Mirrors the PostgreSQL table, including the `email` unique constraint.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<Table>,
    /// Make `find_by_email` always miss, so only the constraint catches duplicates
    blind_email_lookup: bool,
    /// Fail every call with a storage error
    broken: bool,
    /// Never answer the health check
    stalled: bool,
    calls: AtomicUsize,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blind_email_lookup() -> Self {
        Self {
            blind_email_lookup: true,
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    /// Number of repository calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> RepositoryResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(RepositoryError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> RepositoryResult<User> {
        self.enter()?;
        let mut table = self.table.lock().unwrap();

        if table.rows.iter().any(|u| u.email == new_user.email) {
            return Err(RepositoryError::UniqueViolation);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            created_at: Utc::now(),
        };
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        self.enter()?;
        let mut users = self.table.lock().unwrap().rows.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        self.enter()?;
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.enter()?;
        if self.blind_email_lookup {
            return Ok(None);
        }
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn update_by_id(&self, id: i64, patch: &UserPatch) -> RepositoryResult<Option<User>> {
        self.enter()?;
        let mut table = self.table.lock().unwrap();

        if let Some(email) = &patch.email {
            if table.rows.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepositoryError::UniqueViolation);
            }
        }

        let Some(user) = table.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            user.name = name.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        self.enter()?;
        let mut table = self.table.lock().unwrap();
        let position = table.rows.iter().position(|u| u.id == id);
        Ok(position.map(|index| table.rows.remove(index)))
    }

    async fn health_check(&self) -> bool {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        !self.broken
    }
}
