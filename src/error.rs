// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// The four credential verification failures all render as the same 401
/// body; callers are never told which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No credential supplied")]
    MissingCredential,

    #[error("Credential signature or payload invalid")]
    InvalidCredential,

    #[error("Credential expired")]
    ExpiredCredential,

    #[error("Credential subject no longer exists")]
    PrincipalNotFound,

    #[error("Role not permitted for this resource")]
    ForbiddenRole,

    #[error("Profile kind does not match account role")]
    RoleProfileMismatch,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upstream operation timed out")]
    UpstreamTimeout,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body: `{"errors":[{"msg":"..."}]}`.
#[derive(Serialize)]
struct ErrorResponse {
    errors: Vec<ErrorMessage>,
}

#[derive(Serialize)]
struct ErrorMessage {
    msg: String,
}

/// The one message every credential verification failure renders as.
const UNIFORM_401_MSG: &str = "Authorization denied";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::MissingCredential
            | AppError::InvalidCredential
            | AppError::ExpiredCredential
            | AppError::PrincipalNotFound => {
                (StatusCode::UNAUTHORIZED, UNIFORM_401_MSG.to_string())
            }
            AppError::ForbiddenRole => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            AppError::RoleProfileMismatch => {
                // The role gate runs before the adapter, so reaching this
                // branch means a route was wired without its gate.
                tracing::error!("Profile kind / role mismatch reached the store adapter");
                (StatusCode::FORBIDDEN, "Access denied".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UpstreamTimeout => {
                tracing::error!("Upstream timeout");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Upstream timeout, please retry".to_string(),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = ErrorResponse {
            errors: vec![ErrorMessage { msg }],
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    /// Collapse a `validator` error set to its first message.
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let msg = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .next()
            .unwrap_or_else(|| "Invalid request".to_string());
        AppError::Validation(msg)
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
