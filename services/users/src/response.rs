//! Uniform JSON envelope returned by every endpoint

use serde::Serialize;

use crate::validation::FieldError;

/// `{ success, message, data, errors?, count? }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying a single value
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            count: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Successful list response; `count` mirrors the number of items
    pub fn list(message: impl Into<String>, items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            success: true,
            message: message.into(),
            data: Some(items),
            errors: None,
            count: Some(count),
        }
    }
}

impl ApiResponse<()> {
    /// Failure with `data: null`
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
            count: None,
        }
    }

    /// Failure listing every field violation
    pub fn invalid(errors: Vec<FieldError>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::failure("Validation error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_serializes_null_data() {
        let body = serde_json::to_value(ApiResponse::failure("User not found")).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "User not found", "data": null})
        );
    }

    #[test]
    fn test_list_carries_count() {
        let body = serde_json::to_value(ApiResponse::list("ok", vec![1, 2, 3])).unwrap();
        assert_eq!(body["count"], 3);
        assert_eq!(body["data"], json!([1, 2, 3]));
        assert!(body.get("errors").is_none());
    }
}
