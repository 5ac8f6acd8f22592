// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::VerifyError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Please wait {remaining_secs} seconds before requesting another code")]
    CooldownActive { remaining_secs: u64 },

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Verification(#[from] VerifyError),

    #[error("Email provider error: {message}")]
    EmailProvider { status: StatusCode, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::CooldownActive { remaining_secs } => {
                retry_after = Some(*remaining_secs);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "cooldown_active",
                    Some(self.to_string()),
                )
            }
            AppError::RateLimited { retry_after_secs } => {
                retry_after = Some(*retry_after_secs);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "rate_limited",
                    Some(self.to_string()),
                )
            }
            AppError::Verification(err) => {
                let code = match err {
                    VerifyError::Expired => "code_expired",
                    VerifyError::Mismatch => "code_mismatch",
                    VerifyError::Malformed => "bad_request",
                    VerifyError::Missing => "code_missing",
                };
                (StatusCode::BAD_REQUEST, code, Some(err.to_string()))
            }
            AppError::EmailProvider { status, message } => {
                tracing::warn!(status = %status, error = %message, "Email provider error");
                (*status, "email_provider_error", Some(message.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse classification of failures, used to pick the message shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidCredential,
    TooManyRequests,
    QuotaExceeded,
    Network,
    Other,
}

impl ErrorCategory {
    /// Classify an HTTP status returned by the server or a provider.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCategory::InvalidCredential,
            StatusCode::TOO_MANY_REQUESTS => ErrorCategory::TooManyRequests,
            StatusCode::INSUFFICIENT_STORAGE => ErrorCategory::QuotaExceeded,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                ErrorCategory::Network
            }
            _ => ErrorCategory::Other,
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCategory::InvalidCredential => "Invalid email or password. Please try again.",
            ErrorCategory::TooManyRequests => {
                "Too many attempts. Please wait a moment and try again."
            }
            ErrorCategory::QuotaExceeded => "Service limit reached. Please try again later.",
            ErrorCategory::Network => {
                "Network error. Please check your connection and try again."
            }
            ErrorCategory::Other => "Something went wrong. Please try again.",
        }
    }
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => ErrorCategory::InvalidCredential,
            AppError::RateLimited { .. } | AppError::CooldownActive { .. } => {
                ErrorCategory::TooManyRequests
            }
            AppError::EmailProvider { status, .. } => ErrorCategory::from_status(*status),
            _ => ErrorCategory::Other,
        }
    }
}
