// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod task;
pub mod verification;
pub mod weekday;

pub use profile::{
    default_availability, AvailabilitySlot, FollowChange, ProfileField, ProfileUpdate,
    ProfileView, PublicProfile, UserProfile, UserSearchResult,
};
pub use task::{FreeTimeSlot, Task, TaskList};
pub use verification::{ResendCooldown, VerificationCode, VerifyError};
pub use weekday::Weekday;
