//! User handlers: validation, repository calls and envelope construction

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    extractors::JsonBody,
    models::User,
    repositories::RepositoryError,
    response::ApiResponse,
    state::AppState,
    validation,
};

type UserResponse = (StatusCode, Json<ApiResponse<User>>);

/// Map a repository failure to the client-facing error.
///
/// A unique violation can surface even after the email pre-check passed,
/// when two requests race for the same address.
fn storage_failure(action: &'static str) -> impl FnOnce(RepositoryError) -> ApiError {
    move |e| match e {
        RepositoryError::UniqueViolation => ApiError::Conflict,
        RepositoryError::Storage(_) => {
            error!("Failed to {}: {}", action, e);
            ApiError::InternalServerError
        }
    }
}

fn ok(status: StatusCode, message: &str, user: User) -> UserResponse {
    (status, Json(ApiResponse::success(message, user)))
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<UserResponse> {
    let new_user = validation::validate_create(&body).map_err(ApiError::Validation)?;
    let repo = &state.user_repository;

    // Best effort only; the unique constraint is authoritative
    if repo
        .find_by_email(&new_user.email)
        .await
        .map_err(storage_failure("check email"))?
        .is_some()
    {
        return Err(ApiError::Conflict);
    }

    let user = repo
        .create(&new_user)
        .await
        .map_err(storage_failure("create user"))?;

    Ok(ok(StatusCode::CREATED, "User created successfully", user))
}

/// Get all users, newest first
pub async fn get_users(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Vec<User>>>)> {
    let users = state
        .user_repository
        .find_all()
        .await
        .map_err(storage_failure("fetch users"))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::list("Users retrieved successfully", users)),
    ))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let id = validation::parse_id(&id).map_err(ApiError::Validation)?;

    let user = state
        .user_repository
        .find_by_id(id)
        .await
        .map_err(storage_failure("fetch user"))?
        .ok_or(ApiError::NotFound)?;

    Ok(ok(StatusCode::OK, "User retrieved successfully", user))
}

/// Partially update a user
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<UserResponse> {
    let id = validation::parse_id(&id);
    let patch = validation::validate_update(&body);
    let (id, patch) = match (id, patch) {
        (Ok(id), Ok(patch)) => (id, patch),
        (id, patch) => {
            let errors = id
                .err()
                .into_iter()
                .chain(patch.err())
                .flatten()
                .collect();
            return Err(ApiError::Validation(errors));
        }
    };
    let repo = &state.user_repository;

    let existing = repo
        .find_by_id(id)
        .await
        .map_err(storage_failure("fetch user"))?
        .ok_or(ApiError::NotFound)?;

    if let Some(email) = patch.email.as_deref().filter(|email| *email != existing.email) {
        if repo
            .find_by_email(email)
            .await
            .map_err(storage_failure("check email"))?
            .is_some()
        {
            return Err(ApiError::Conflict);
        }
    }

    // The row may have been deleted since the lookup above
    let user = repo
        .update_by_id(id, &patch)
        .await
        .map_err(storage_failure("update user"))?
        .ok_or(ApiError::NotFound)?;

    Ok(ok(StatusCode::OK, "User updated successfully", user))
}

/// Delete a user and return the deleted row
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let id = validation::parse_id(&id).map_err(ApiError::Validation)?;

    let user = state
        .user_repository
        .delete_by_id(id)
        .await
        .map_err(storage_failure("delete user"))?
        .ok_or(ApiError::NotFound)?;

    Ok(ok(StatusCode::OK, "User deleted successfully", user))
}
