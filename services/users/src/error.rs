//! Custom error types for the users service

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{response::ApiResponse, validation::FieldError};

/// Custom error type for the users service
///
/// Every variant renders as the standard envelope. Internal details are
/// logged where the error is raised and never reach the client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more payload or path parameter violations
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    /// Email already taken
    #[error("User with this email already exists")]
    Conflict,

    /// No user with the requested id
    #[error("User not found")]
    NotFound,

    /// Body is not parseable JSON
    #[error("Invalid JSON format")]
    MalformedBody,

    /// Body exceeds the configured limit
    #[error("Request entity too large")]
    PayloadTooLarge,

    /// Client exhausted its request window
    #[error("Too many requests from this IP, please try again later.")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            ApiError::Validation(errors) => {
                (status, Json(ApiResponse::invalid(errors))).into_response()
            }
            ApiError::RateLimited {
                limit,
                retry_after_secs,
            } => {
                let mut response = (status, Json(ApiResponse::failure(message))).into_response();
                let headers = response.headers_mut();
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
                headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
                response
            }
            _ => (status, Json(ApiResponse::failure(message))).into_response(),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
