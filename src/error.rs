//! API error type shared by every handler and service.
//!
//! Errors are rendered as JSON in the shape clients of the API expect:
//! field maps for validation failures, `{"errors": ...}` for conflicts and
//! `{"detail": ...}` for everything else.

use crate::storage::StorageError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::collections::BTreeMap;

/// Field name to list of messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed, missing or inconsistent fields. Carries every violation found.
    Validation(FieldErrors),
    /// Duplicate membership, self-subscription or a unique constraint race.
    Conflict(String),
    /// Missing entity or membership row.
    NotFound(String),
    /// No credentials were supplied.
    Unauthorized,
    /// Credentials were supplied but do not match a token.
    InvalidToken,
    /// Authenticated, but not allowed to touch the resource.
    Forbidden,
    Database(DbErr),
    Storage(StorageError),
    Internal(String),
}

impl ApiError {
    /// Single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_owned())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation failed on {} field(s)", errors.len())
            }
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Unauthorized => write!(f, "Authentication credentials were not provided."),
            ApiError::InvalidToken => write!(f, "Invalid token."),
            ApiError::Forbidden => {
                write!(f, "You do not have permission to perform this action.")
            }
            ApiError::Database(e) => write!(f, "Database error: {}", e),
            ApiError::Storage(e) => write!(f, "Storage error: {}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        // The existence check before an insert can lose a race; the unique
        // index then decides and the caller sees the same conflict.
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                log::debug!("Unique constraint violation: {}", detail);
                ApiError::Conflict("Entry already exists".to_owned())
            }
            _ => ApiError::Database(e),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ApiError::not_found(),
            e => ApiError::Storage(e),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        merge_validation_errors(&mut errors, &e);
        ApiError::Validation(errors)
    }
}

/// Folds `validator` field errors into a field map, keeping existing entries.
pub fn merge_validation_errors(into: &mut FieldErrors, errors: &validator::ValidationErrors) {
    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors.iter().map(|e| match &e.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value ({}).", e.code),
        });
        into.entry(field.to_string()).or_default().extend(messages);
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::Conflict(msg) => json!({ "errors": msg }),
            ApiError::NotFound(msg) => json!({ "detail": msg }),
            ApiError::Unauthorized | ApiError::InvalidToken | ApiError::Forbidden => {
                json!({ "detail": self.to_string() })
            }
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                log::error!("{}", self);
                json!({ "detail": "Internal server error." })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
