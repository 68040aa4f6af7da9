//! Input validation for user payloads and path parameters
//!
//! Every check runs on plain `serde_json::Value`s so the rules do not depend
//! on the web framework. Each field reports its first failing rule and every
//! failing field is reported.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::models::{NewUser, UserPatch};

/// Maximum length (in characters) of `name` and `email`
pub const MAX_FIELD_LEN: usize = 255;
/// Minimum length (in characters) of `name`
pub const MIN_NAME_LEN: usize = 2;
/// Largest id accepted in a path, 2^53 - 1
pub const MAX_SAFE_ID: i64 = (1 << 53) - 1;

/// A single `(field, message)` validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Update payload carried neither `name` nor `email`
    pub fn empty_update() -> Self {
        Self::new(
            "body",
            "At least one field (name or email) must be provided for update",
        )
    }

    /// Path identifier is not a positive integer
    pub fn invalid_id(message: &str) -> Self {
        Self::new("id", message)
    }
}

/// Result of a validation pass
pub type ValidationResult<T> = Result<T, Vec<FieldError>>;

struct Field {
    key: &'static str,
    label: &'static str,
    min_len: Option<usize>,
    is_email: bool,
}

const NAME: Field = Field {
    key: "name",
    label: "Name",
    min_len: Some(MIN_NAME_LEN),
    is_email: false,
};

const EMAIL: Field = Field {
    key: "email",
    label: "Email",
    min_len: None,
    is_email: true,
};

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9_%+-]+(?:\.[a-zA-Z0-9_%+-]+)*@(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$",
        )
            .expect("Failed to compile email regex")
    })
}

/// Check one string field. `Ok(None)` means absent and optional.
fn check_field(
    field: &Field,
    value: Option<&Value>,
    required: bool,
) -> Result<Option<String>, FieldError> {
    let fail = |message: String| FieldError::new(field.key, message);

    let value = match value {
        None if required => return Err(fail(format!("{} is required", field.label))),
        None => return Ok(None),
        Some(value) => value,
    };

    let Value::String(text) = value else {
        return Err(fail(format!("{} must be a string", field.label)));
    };

    if text.is_empty() {
        return Err(fail(format!("{} is not allowed to be empty", field.label)));
    }

    let len = text.chars().count();
    if let Some(min_len) = field.min_len {
        if len < min_len {
            return Err(fail(format!(
                "{} must be at least {} characters long",
                field.label, min_len
            )));
        }
    }

    if field.is_email && !email_regex().is_match(text) {
        return Err(fail("Please provide a valid email address".to_string()));
    }

    if len > MAX_FIELD_LEN {
        return Err(fail(format!(
            "{} cannot exceed {} characters",
            field.label, MAX_FIELD_LEN
        )));
    }

    Ok(Some(text.clone()))
}

/// Validate every known field of an object body and flag unknown keys
fn check_object(
    body: &Value,
    required: bool,
) -> ValidationResult<(Option<String>, Option<String>)> {
    let Value::Object(map) = body else {
        return Err(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )]);
    };

    let mut errors = Vec::new();
    let name = check_field(&NAME, map.get(NAME.key), required).unwrap_or_else(|e| {
        errors.push(e);
        None
    });
    let email = check_field(&EMAIL, map.get(EMAIL.key), required).unwrap_or_else(|e| {
        errors.push(e);
        None
    });

    for key in map.keys() {
        if key != NAME.key && key != EMAIL.key {
            errors.push(FieldError::new(key.as_str(), format!("\"{key}\" is not allowed")));
        }
    }

    if errors.is_empty() {
        Ok((name, email))
    } else {
        Err(errors)
    }
}

/// Validate a create payload: `name` and `email` both required
pub fn validate_create(body: &Value) -> ValidationResult<NewUser> {
    match check_object(body, true)? {
        (Some(name), Some(email)) => Ok(NewUser { name, email }),
        // check_object reports missing required fields as errors
        _ => Err(vec![FieldError::new("body", "Name and email are required")]),
    }
}

/// Validate an update payload: both fields optional, at least one present
pub fn validate_update(body: &Value) -> ValidationResult<UserPatch> {
    let (name, email) = check_object(body, false)?;
    let patch = UserPatch { name, email };

    if patch.is_empty() {
        return Err(vec![FieldError::empty_update()]);
    }

    Ok(patch)
}

/// Parse a path identifier as a positive integer
///
/// Integral spellings such as `1.0` or `1e3` are accepted.
pub fn parse_id(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();

    let message = match raw.parse::<i64>() {
        Ok(id) if (1..=MAX_SAFE_ID).contains(&id) => return Ok(id),
        Ok(id) if id <= 0 => "ID must be a positive number",
        Ok(_) => "ID must be a safe number",
        Err(_) => match raw.parse::<f64>() {
            Ok(n) if !n.is_finite() => "ID must be a number",
            Ok(n) if n.fract() != 0.0 => "ID must be an integer",
            Ok(n) if n <= 0.0 => "ID must be a positive number",
            Ok(n) if n > MAX_SAFE_ID as f64 => "ID must be a safe number",
            Ok(n) => return Ok(n as i64),
            Err(_) => "ID must be a number",
        },
    };

    Err(vec![FieldError::invalid_id(message)])
}
