//! JSON body extractor with envelope-shaped rejections

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;

/// Raw JSON body, validated later by `crate::validation`
///
/// Requests without a JSON content type are read as an empty object, so
/// they fail field validation rather than content negotiation.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => {
                Ok(JsonBody(Value::Object(Map::new())))
            }
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                debug!("Rejected oversized body: {}", rejection.body_text());
                Err(ApiError::PayloadTooLarge)
            }
            Err(rejection) => {
                debug!("Rejected malformed body: {}", rejection.body_text());
                Err(ApiError::MalformedBody)
            }
        }
    }
}
