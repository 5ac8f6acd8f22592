// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email address verification with emailed 6-digit codes.
//!
//! - A code lives in the profile document until it is used, replaced, or
//!   expires (10 minutes).
//! - Codes may be requested at most once per 60 seconds per user and five
//!   times per hour per address.
//! - A successful check marks the address verified and clears the code.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Store;
use crate::error::AppError;
use crate::models::verification::{is_well_formed, RESEND_COOLDOWN_SECS};
use crate::models::{ProfileField, ProfileView, ResendCooldown, VerificationCode, VerifyError};
use crate::services::changes::{Change, ChangeFeed};
use crate::services::email::{verification_message, EmailService};
use crate::services::quota::SendQuota;

/// Codes sent to one address per hour.
pub const ADDRESS_QUOTA_PER_HOUR: u32 = 5;

/// Result of issuing a code, returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCode {
    pub expires_at: DateTime<Utc>,
    /// Seconds before another code may be requested
    pub resend_after: u32,
}

pub struct VerificationService {
    store: Arc<dyn Store>,
    mailer: Arc<EmailService>,
    changes: Arc<ChangeFeed>,
    address_quota: SendQuota,
}

impl VerificationService {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<EmailService>, changes: Arc<ChangeFeed>) -> Self {
        Self {
            store,
            mailer,
            changes,
            address_quota: SendQuota::new(ADDRESS_QUOTA_PER_HOUR, Duration::from_secs(3600)),
        }
    }

    /// Generate, store and email a new code, replacing any earlier one.
    pub async fn issue_code(&self, uid: &str, now: DateTime<Utc>) -> Result<IssuedCode, AppError> {
        let mut profile = self
            .store
            .get_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        if profile.email_verified {
            return Err(AppError::Conflict("Email is already verified".to_string()));
        }

        let cooldown = ResendCooldown::since(profile.last_code_sent, now);
        if !cooldown.can_resend() {
            return Err(AppError::CooldownActive {
                remaining_secs: cooldown.remaining() as u64,
            });
        }

        self.address_quota
            .try_acquire(&profile.email.to_lowercase())
            .map_err(|retry_after_secs| AppError::RateLimited { retry_after_secs })?;

        let code = VerificationCode::generate(now)?;
        let expires_at = code.expires_at;
        let message = verification_message(&profile.email, &code.code);

        profile.verification = Some(code);
        profile.last_code_sent = Some(now);
        self.store
            .update_profile(
                &profile,
                &[ProfileField::Verification, ProfileField::LastCodeSent],
            )
            .await?;

        self.mailer.send(&message).await?;

        tracing::info!(uid, %expires_at, "Verification code issued");
        Ok(IssuedCode {
            expires_at,
            resend_after: RESEND_COOLDOWN_SECS as u32,
        })
    }

    /// Check a submitted code and mark the address verified on success.
    pub async fn verify(
        &self,
        uid: &str,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<ProfileView, AppError> {
        let submitted = submitted.trim();
        if !is_well_formed(submitted) {
            return Err(VerifyError::Malformed.into());
        }

        let mut profile = self
            .store
            .get_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        if profile.email_verified {
            return Err(AppError::Conflict("Email is already verified".to_string()));
        }

        let code = profile.verification.as_ref().ok_or(VerifyError::Missing)?;
        if let Err(err) = code.check(submitted, now) {
            tracing::info!(uid, reason = ?err, "Verification code rejected");
            return Err(err.into());
        }

        profile.email_verified = true;
        profile.verified_at = Some(now);
        profile.verification = None;
        profile.updated_at = now;
        self.store
            .update_profile(
                &profile,
                &[
                    ProfileField::EmailVerified,
                    ProfileField::VerifiedAt,
                    ProfileField::Verification,
                    ProfileField::UpdatedAt,
                ],
            )
            .await?;

        tracing::info!(uid, "Email verified");
        let view = ProfileView::from(profile);
        self.changes.publish(uid, Change::Profile(view.clone()));
        Ok(view)
    }
}
