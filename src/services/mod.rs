// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod changes;
pub mod email;
pub mod identity;
pub mod profiles;
pub mod quota;
pub mod schedule;
pub mod social;
pub mod verification;

pub use changes::{Change, ChangeFeed};
pub use email::{EmailError, EmailMessage, EmailService};
pub use identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
pub use profiles::ProfileService;
pub use quota::SendQuota;
pub use schedule::ScheduleService;
pub use social::SocialService;
pub use verification::VerificationService;
