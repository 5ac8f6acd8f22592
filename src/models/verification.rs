// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email verification codes and the resend cooldown.

use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Number of digits in a code.
pub const CODE_LENGTH: usize = 6;

/// Code lifetime.
pub const CODE_TTL_MINUTES: i64 = 10;

/// Minimum interval between two codes sent to the same user.
pub const RESEND_COOLDOWN_SECS: i64 = 60;

// Largest multiple of 10^6 that fits in a u32; values at or above it are
// redrawn so every code is equally likely.
const REJECTION_BOUND: u32 = 4_294_000_000;

/// A pending verification code embedded in the profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCode {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("Verification code has expired. Please request a new one.")]
    Expired,

    #[error("Invalid verification code. Please try again.")]
    Mismatch,

    #[error("Verification code must be 6 digits")]
    Malformed,

    #[error("No verification code found. Please request a new one.")]
    Missing,
}

impl VerificationCode {
    /// Generate a fresh uniformly random code expiring 10 minutes after `now`.
    pub fn generate(now: DateTime<Utc>) -> anyhow::Result<Self> {
        let rng = SystemRandom::new();
        let mut buf = [0u8; 4];
        let value = loop {
            rng.fill(&mut buf)
                .map_err(|_| anyhow::anyhow!("Failed to generate random verification code"))?;
            let candidate = u32::from_be_bytes(buf);
            if candidate < REJECTION_BOUND {
                break candidate % 1_000_000;
            }
        };
        Ok(Self::from_parts(&format!("{value:06}"), now))
    }

    /// Build a code with the standard lifetime from an explicit value.
    pub fn from_parts(code: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            code: code.to_string(),
            issued_at,
            expires_at: issued_at + Duration::minutes(CODE_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check a submitted code.
    ///
    /// Expiry is checked first, so an expired code fails even when it matches.
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> Result<(), VerifyError> {
        if !is_well_formed(submitted) {
            return Err(VerifyError::Malformed);
        }
        if self.is_expired(now) {
            return Err(VerifyError::Expired);
        }
        if bool::from(self.code.as_bytes().ct_eq(submitted.as_bytes())) {
            Ok(())
        } else {
            Err(VerifyError::Mismatch)
        }
    }
}

/// True for exactly six ASCII digits.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Countdown before another code may be requested.
///
/// Mirrors the seconds counter shown next to the resend button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResendCooldown {
    remaining: u32,
}

impl ResendCooldown {
    pub fn new(remaining: u32) -> Self {
        Self { remaining }
    }

    /// Cooldown remaining given when the last code was sent, rounded up to
    /// whole seconds.
    pub fn since(last_sent: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last_sent) = last_sent else {
            return Self::default();
        };
        let elapsed_ms = (now - last_sent).num_milliseconds().max(0);
        let remaining_ms = (RESEND_COOLDOWN_SECS * 1000 - elapsed_ms).max(0);
        Self {
            remaining: ((remaining_ms + 999) / 1000) as u32,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Restart the countdown if resend is currently allowed.
    pub fn try_restart(&mut self) -> bool {
        if !self.can_resend() {
            return false;
        }
        self.remaining = RESEND_COOLDOWN_SECS as u32;
        true
    }
}
