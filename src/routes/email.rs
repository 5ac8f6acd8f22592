// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public email relay endpoint with a per-client send quota.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::EmailMessage;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/send-email", post(send_email))
}

#[derive(Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
}

/// Client key for the relay quota: the first `X-Forwarded-For` hop.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Relay a message to the email provider.
///
/// The quota is charged before the body is parsed, so malformed requests
/// count against it too.
async fn send_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SendEmailResponse>> {
    let client = client_key(&headers);
    state
        .relay_quota
        .try_acquire(&client)
        .map_err(|retry_after_secs| {
            tracing::warn!(client = %client, "Email relay quota exceeded");
            AppError::RateLimited { retry_after_secs }
        })?;

    let message: EmailMessage = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Missing required email fields".to_string()))?;
    message.validate_relay()?;

    state.mailer.send(&message).await?;

    Ok(Json(SendEmailResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "unknown");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }
}
