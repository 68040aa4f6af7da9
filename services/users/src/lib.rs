//! Users service
//!
//! A small HTTP CRUD service over a single PostgreSQL `users` table. Every
//! endpoint answers with the same JSON envelope (see [`response`]).

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod settings;
pub mod state;
pub mod validation;
