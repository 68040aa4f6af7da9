//! Application state shared across handlers

use std::sync::Arc;

use crate::{rate_limiter::RateLimiter, repositories::UserRepository, settings::Settings};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub rate_limiter: RateLimiter,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(user_repository: Arc<dyn UserRepository>, settings: Settings) -> Self {
        Self {
            user_repository,
            rate_limiter: RateLimiter::new(settings.rate_limiter()),
            settings: Arc::new(settings),
        }
    }
}
