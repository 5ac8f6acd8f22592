// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use social_planner::error::{AppError, ErrorCategory};
use social_planner::models::VerifyError;
use social_planner::services::EmailError;

async fn json_body(err: AppError) -> (StatusCode, Option<String>, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, retry_after, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_cooldown_response() {
    let (status, retry_after, body) = json_body(AppError::CooldownActive { remaining_secs: 42 }).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(retry_after.as_deref(), Some("42"));
    assert_eq!(body["error"], "cooldown_active");
    assert_eq!(body["retryAfter"], 42);
}

#[tokio::test]
async fn test_verification_error_codes() {
    let (status, _, body) = json_body(VerifyError::Expired.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "code_expired");

    let (_, _, body) = json_body(VerifyError::Mismatch.into()).await;
    assert_eq!(body["error"], "code_mismatch");
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let (status, _, body) = json_body(AppError::Internal(anyhow::anyhow!("secret path"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_email_provider_status_mapping() {
    let cases = [
        (401, StatusCode::UNAUTHORIZED, "Invalid API key"),
        (403, StatusCode::FORBIDDEN, "Email sending is disabled"),
        (429, StatusCode::TOO_MANY_REQUESTS, "Too many requests to SendGrid"),
        (500, StatusCode::INTERNAL_SERVER_ERROR, "Failed to send email"),
    ];

    for (provider_status, expected, message) in cases {
        let err: AppError = EmailError::Provider {
            status: provider_status,
            body: String::new(),
        }
        .into();
        let (status, _, body) = json_body(err).await;
        assert_eq!(status, expected);
        assert_eq!(body["details"], message);
    }
}

#[test]
fn test_error_categories() {
    assert_eq!(AppError::InvalidToken.category(), ErrorCategory::InvalidCredential);
    assert_eq!(
        AppError::RateLimited { retry_after_secs: 1 }.category(),
        ErrorCategory::TooManyRequests
    );
    assert_eq!(
        ErrorCategory::from_status(StatusCode::SERVICE_UNAVAILABLE),
        ErrorCategory::Network
    );
    assert_eq!(
        AppError::BadRequest("x".to_string()).category().user_message(),
        "Something went wrong. Please try again."
    );
}
