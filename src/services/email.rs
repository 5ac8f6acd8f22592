// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional email delivery through the SendGrid v3 API.
//!
//! Without an API key the service runs in log mode: messages are written to
//! the log instead of being sent, which is what local development uses.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::config::Config;
use crate::error::AppError;
use crate::models::verification::CODE_TTL_MINUTES;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub const VERIFICATION_SUBJECT: &str = "Your Social-Plan Verification Code";

/// An outgoing message. Also the request body of the relay endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    #[serde(default)]
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl EmailMessage {
    /// Check required fields and the recipient address.
    pub fn validate(&self) -> Result<(), AppError> {
        let has_body = self.text.as_deref().is_some_and(|t| !t.is_empty())
            || self.html.as_deref().is_some_and(|h| !h.is_empty());
        if self.to.trim().is_empty() || self.subject.trim().is_empty() || !has_body {
            return Err(AppError::BadRequest(
                "Missing required email fields".to_string(),
            ));
        }
        if !self.to.trim().to_string().validate_email() {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if let Some(from) = &self.from {
            if !from.trim().to_string().validate_email() {
                return Err(AppError::BadRequest("Invalid email address".to_string()));
            }
        }
        Ok(())
    }

    /// Check a message submitted to the public relay, which must name its
    /// own sender.
    pub fn validate_relay(&self) -> Result<(), AppError> {
        if !self.from.as_deref().is_some_and(|f| !f.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Missing required email fields".to_string(),
            ));
        }
        self.validate()
    }
}

/// The verification email carrying a freshly issued code.
pub fn verification_message(to: &str, code: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        from: None,
        subject: VERIFICATION_SUBJECT.to_string(),
        text: Some(format!(
            "Your verification code is: {code}. This code will expire in {CODE_TTL_MINUTES} minutes."
        )),
        html: Some(format!(
            "<p>Your verification code is: <strong>{code}</strong></p>\
             <p>This code will expire in {CODE_TTL_MINUTES} minutes.</p>"
        )),
    }
}

/// Email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("email request failed: {0}")]
    Transport(String),
}

impl EmailError {
    /// Status and client-facing message for a failed send.
    pub fn response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            EmailError::Provider { status: 401, .. } => {
                (StatusCode::UNAUTHORIZED, "Invalid API key")
            }
            EmailError::Provider { status: 403, .. } => {
                (StatusCode::FORBIDDEN, "Email sending is disabled")
            }
            EmailError::Provider { status: 429, .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests to SendGrid")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to send email"),
        }
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        tracing::warn!(error = %err, "Email send failed");
        let (status, message) = err.response_parts();
        AppError::EmailProvider {
            status,
            message: message.to_string(),
        }
    }
}

enum Transport {
    SendGrid {
        http: reqwest::Client,
        base_url: String,
        api_key: String,
    },
    Log,
}

/// Email sender used by the relay endpoint and the verification flow.
pub struct EmailService {
    transport: Transport,
    default_from: String,
}

impl EmailService {
    /// SendGrid when an API key is configured, log mode otherwise.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.sendgrid_api_key {
            Some(api_key) => Self::sendgrid(
                &config.sendgrid_api_url,
                api_key.clone(),
                config.email_from.clone(),
            ),
            None => {
                tracing::warn!("SENDGRID_API_KEY not set; emails will be logged, not sent");
                Ok(Self::log_only(config.email_from.clone()))
            }
        }
    }

    pub fn sendgrid(base_url: &str, api_key: String, default_from: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("failed building email HTTP client: {e}"))?;

        Ok(Self {
            transport: Transport::SendGrid {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            },
            default_from,
        })
    }

    pub fn log_only(default_from: String) -> Self {
        Self {
            transport: Transport::Log,
            default_from,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.transport, Transport::SendGrid { .. })
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let from = message.from.as_deref().unwrap_or(&self.default_from);

        match &self.transport {
            Transport::Log => {
                tracing::info!(
                    to = %message.to,
                    from = %from,
                    subject = %message.subject,
                    text = message.text.as_deref().unwrap_or(""),
                    "Email (log mode, not sent)"
                );
                Ok(())
            }
            Transport::SendGrid {
                http,
                base_url,
                api_key,
            } => {
                let url = format!("{}/v3/mail/send", base_url);
                let response = http
                    .post(&url)
                    .bearer_auth(api_key)
                    .json(&sendgrid_body(message, from))
                    .send()
                    .await
                    .map_err(|e| EmailError::Transport(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(EmailError::Provider {
                        status: status.as_u16(),
                        body,
                    });
                }

                tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
                Ok(())
            }
        }
    }
}

/// SendGrid v3 `mail/send` request body. Plain text must precede HTML.
fn sendgrid_body(message: &EmailMessage, from: &str) -> serde_json::Value {
    let mut content = Vec::new();
    if let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) {
        content.push(serde_json::json!({ "type": "text/plain", "value": text }));
    }
    if let Some(html) = message.html.as_deref().filter(|h| !h.is_empty()) {
        content.push(serde_json::json!({ "type": "text/html", "value": html }));
    }

    serde_json::json!({
        "personalizations": [{ "to": [{ "email": message.to.trim() }] }],
        "from": { "email": from },
        "subject": message.subject,
        "content": content,
    })
}
