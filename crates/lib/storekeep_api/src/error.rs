//! Application error types.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storekeep_core::auth::AuthError;
use storekeep_core::products::ProductError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Every variant renders as `{"error": <code>, "message": <text>}`; the code
/// is stable and machine-readable.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {message}")]
    InvalidFields {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Not found: {message}")]
    NotFound { code: &'static str, message: String },

    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Forbidden: {message}")]
    Forbidden { code: &'static str, message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m, None),
            AppError::InvalidFields { message, fields } => {
                (StatusCode::BAD_REQUEST, "validation_error", message, Some(fields))
            }
            AppError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message, None),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message, None),
            AppError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message, None)
            }
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message, None),
            AppError::StoreUnavailable(m) => {
                error!("store unavailable: {m}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "Service temporarily unavailable".to_string(),
                    None,
                )
            }
            AppError::Internal(m) => {
                error!("internal error: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };
        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            fields,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let message = e.to_string();
        match e {
            AuthError::InvalidCredentials => AppError::unauthorized("invalid_credentials", message),
            AuthError::AccountInactive => AppError::Forbidden {
                code: "account_inactive",
                message,
            },
            AuthError::UserNotFound => AppError::NotFound {
                code: "user_not_found",
                message,
            },
            AuthError::DuplicateUsername => AppError::Conflict {
                code: "duplicate_username",
                message,
            },
            AuthError::DuplicateEmail => AppError::Conflict {
                code: "duplicate_email",
                message,
            },
            AuthError::InvalidToken => AppError::unauthorized("invalid_token", message),
            AuthError::ExpiredToken => AppError::unauthorized("expired_token", message),
            AuthError::MalformedToken => AppError::unauthorized("malformed_token", message),
            AuthError::Validation(fields) => AppError::InvalidFields {
                message: "One or more fields are invalid".into(),
                fields: fields.0,
            },
            AuthError::Forbidden(m) => AppError::Forbidden {
                code: "forbidden",
                message: m,
            },
            AuthError::StoreUnavailable(m) => AppError::StoreUnavailable(m),
            AuthError::Config(m) | AuthError::Hashing(m) | AuthError::Internal(m) => {
                AppError::Internal(m)
            }
        }
    }
}

impl From<ProductError> for AppError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(_) => AppError::NotFound {
                code: "product_not_found",
                message: e.to_string(),
            },
            ProductError::Validation(m) => AppError::Validation(m),
            ProductError::StoreUnavailable(m) => AppError::StoreUnavailable(m),
            ProductError::Store(m) => AppError::Internal(m),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
