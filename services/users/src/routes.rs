//! Users service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::warn;

use crate::{
    handlers::{create_user, delete_user, get_user, get_users, update_user},
    middleware::{cors_layer, handle_panic, rate_limit_middleware, security_headers_middleware},
    state::AppState,
};

/// Upper bound on the storage check behind `/health`
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Create the router for the users service
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.settings.body_limit_bytes;
    let cors = cors_layer(&state.settings);

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/api/v1/users", get(get_users).post(create_user))
        .route(
            "/api/v1/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let check = tokio::time::timeout(HEALTH_CHECK_TIMEOUT, state.user_repository.health_check());
    let database = match check.await {
        Ok(true) => "up",
        Ok(false) => "down",
        Err(_) => {
            warn!("Database health check timed out after {:?}", HEALTH_CHECK_TIMEOUT);
            "down"
        }
    };

    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "environment": state.settings.environment,
        "database": database,
    }))
}

/// Endpoint directory
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Users CRUD API with PostgreSQL",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "users": {
                "create": "POST /api/v1/users",
                "getAll": "GET /api/v1/users",
                "getById": "GET /api/v1/users/:id",
                "update": "PUT /api/v1/users/:id",
                "delete": "DELETE /api/v1/users/:id"
            }
        }
    }))
}

/// Catch-all for unmatched routes
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
            "path": uri.to_string(),
        })),
    )
}
