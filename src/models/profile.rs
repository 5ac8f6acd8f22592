// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model: identity, bio, weekly availability and follow edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::models::verification::VerificationCode;
use crate::models::Weekday;
use crate::time_utils::parse_clock_time;

/// One weekday's configured time window and on/off flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AvailabilitySlot {
    pub day: Weekday,
    /// "HH:MM", 24-hour
    pub start_time: String,
    /// "HH:MM", 24-hour
    pub end_time: String,
    pub is_available: bool,
}

/// Default weekly availability: 09:00-17:00, weekdays on, weekend off.
pub fn default_availability() -> Vec<AvailabilitySlot> {
    Weekday::ALL
        .iter()
        .map(|&day| AvailabilitySlot {
            day,
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            is_available: !day.is_weekend(),
        })
        .collect()
}

/// Check that availability holds exactly one slot per weekday, Monday first,
/// with well-formed clock times.
pub fn validate_availability(slots: &[AvailabilitySlot]) -> Result<(), String> {
    if slots.len() != Weekday::ALL.len() {
        return Err(format!(
            "Availability must contain {} slots, got {}",
            Weekday::ALL.len(),
            slots.len()
        ));
    }

    for (slot, expected) in slots.iter().zip(Weekday::ALL) {
        if slot.day != expected {
            return Err(format!(
                "Availability slot for {} is out of order (expected {})",
                slot.day.as_str(),
                expected.as_str()
            ));
        }
        let start = parse_clock_time(&slot.start_time)
            .ok_or_else(|| format!("Invalid start time for {}", slot.day.as_str()))?;
        let end = parse_clock_time(&slot.end_time)
            .ok_or_else(|| format!("Invalid end time for {}", slot.day.as_str()))?;
        if slot.is_available && end <= start {
            return Err(format!(
                "End time must be after start time for {}",
                slot.day.as_str()
            ));
        }
    }

    Ok(())
}

/// Profile document stored in Firestore at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity-provider user id (also the document ID)
    pub uid: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Monday..Sunday
    #[serde(default = "default_availability")]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    /// Outstanding email verification code, superseded by any newer one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_code_sent: Option<DateTime<Utc>>,
    /// User ids this user follows
    #[serde(default)]
    pub following: Vec<String>,
    /// User ids following this user
    #[serde(default)]
    pub followers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build a fresh profile with default availability and no follow edges.
    ///
    /// Falls back to the local part of the email when no display name is known.
    pub fn new(
        uid: &str,
        display_name: Option<&str>,
        email: &str,
        email_verified: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Self {
            uid: uid.to_string(),
            display_name,
            email: email.to_string(),
            bio: String::new(),
            photo_url: None,
            availability: default_availability(),
            email_verified,
            verified_at: None,
            verification: None,
            last_code_sent: None,
            following: Vec::new(),
            followers: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an owner edit. Returns the fields that changed.
    pub fn apply_update(&mut self, update: ProfileUpdate, now: DateTime<Utc>) -> Vec<ProfileField> {
        let mut changed = Vec::new();

        if let Some(display_name) = update.display_name {
            self.display_name = display_name.trim().to_string();
            changed.push(ProfileField::DisplayName);
        }
        if let Some(bio) = update.bio {
            self.bio = bio;
            changed.push(ProfileField::Bio);
        }
        if let Some(photo_url) = update.photo_url {
            self.photo_url = Some(photo_url).filter(|url| !url.is_empty());
            changed.push(ProfileField::PhotoUrl);
        }
        if let Some(availability) = update.availability {
            self.availability = availability;
            changed.push(ProfileField::Availability);
        }

        if !changed.is_empty() {
            self.updated_at = now;
            changed.push(ProfileField::UpdatedAt);
        }
        changed
    }

    pub fn is_following(&self, uid: &str) -> bool {
        self.following.iter().any(|id| id == uid)
    }

    /// Add `uid` to `following`. Returns false if it was already present.
    pub fn add_following(&mut self, uid: &str) -> bool {
        insert_unique(&mut self.following, uid)
    }

    /// Remove every occurrence of `uid` from `following`.
    pub fn remove_following(&mut self, uid: &str) -> bool {
        remove_all(&mut self.following, uid)
    }

    pub fn add_follower(&mut self, uid: &str) -> bool {
        insert_unique(&mut self.followers, uid)
    }

    pub fn remove_follower(&mut self, uid: &str) -> bool {
        remove_all(&mut self.followers, uid)
    }
}

fn insert_unique(ids: &mut Vec<String>, uid: &str) -> bool {
    if ids.iter().any(|id| id == uid) {
        return false;
    }
    ids.push(uid.to_string());
    true
}

fn remove_all(ids: &mut Vec<String>, uid: &str) -> bool {
    let before = ids.len();
    ids.retain(|id| id != uid);
    ids.len() != before
}

/// Direction of a follow-edge change between two profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowChange {
    Follow,
    Unfollow,
}

impl FollowChange {
    /// Apply the change to both sides of the edge.
    ///
    /// Returns true if either document changed.
    pub fn apply(
        self,
        follower: &mut UserProfile,
        target: &mut UserProfile,
        now: DateTime<Utc>,
    ) -> bool {
        let (a, b) = match self {
            FollowChange::Follow => (
                follower.add_following(&target.uid),
                target.add_follower(&follower.uid),
            ),
            FollowChange::Unfollow => (
                follower.remove_following(&target.uid),
                target.remove_follower(&follower.uid),
            ),
        };
        if a {
            follower.updated_at = now;
        }
        if b {
            target.updated_at = now;
        }
        a || b
    }
}

/// Individually writable profile fields, used as Firestore update masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    DisplayName,
    Bio,
    PhotoUrl,
    Availability,
    EmailVerified,
    VerifiedAt,
    Verification,
    LastCodeSent,
    Following,
    Followers,
    UpdatedAt,
}

impl ProfileField {
    /// Field path as stored in the document.
    pub fn path(self) -> &'static str {
        match self {
            ProfileField::DisplayName => "displayName",
            ProfileField::Bio => "bio",
            ProfileField::PhotoUrl => "photoUrl",
            ProfileField::Availability => "availability",
            ProfileField::EmailVerified => "emailVerified",
            ProfileField::VerifiedAt => "verifiedAt",
            ProfileField::Verification => "verification",
            ProfileField::LastCodeSent => "lastCodeSent",
            ProfileField::Following => "following",
            ProfileField::Followers => "followers",
            ProfileField::UpdatedAt => "updatedAt",
        }
    }

    /// Copy this field's value from `src` into `dst`.
    pub fn copy(self, src: &UserProfile, dst: &mut UserProfile) {
        match self {
            ProfileField::DisplayName => dst.display_name = src.display_name.clone(),
            ProfileField::Bio => dst.bio = src.bio.clone(),
            ProfileField::PhotoUrl => dst.photo_url = src.photo_url.clone(),
            ProfileField::Availability => dst.availability = src.availability.clone(),
            ProfileField::EmailVerified => dst.email_verified = src.email_verified,
            ProfileField::VerifiedAt => dst.verified_at = src.verified_at,
            ProfileField::Verification => dst.verification = src.verification.clone(),
            ProfileField::LastCodeSent => dst.last_code_sent = src.last_code_sent,
            ProfileField::Following => dst.following = src.following.clone(),
            ProfileField::Followers => dst.followers = src.followers.clone(),
            ProfileField::UpdatedAt => dst.updated_at = src.updated_at,
        }
    }
}

/// Partial profile edit submitted by the owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<AvailabilitySlot>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.photo_url.is_none()
            && self.availability.is_none()
    }
}

/// The owner's view of their own profile (verification secrets stripped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileView {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub photo_url: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub email_verified: bool,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileView {
    fn from(profile: UserProfile) -> Self {
        Self {
            uid: profile.uid,
            display_name: profile.display_name,
            email: profile.email,
            bio: profile.bio,
            photo_url: profile.photo_url,
            availability: profile.availability,
            email_verified: profile.email_verified,
            following: profile.following,
            followers: profile.followers,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Another user's profile as seen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicProfile {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub photo_url: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub followers_count: u32,
    pub following_count: u32,
    pub is_following: bool,
}

impl PublicProfile {
    pub fn from_profile(profile: UserProfile, is_following: bool) -> Self {
        Self {
            followers_count: profile.followers.len() as u32,
            following_count: profile.following.len() as u32,
            uid: profile.uid,
            display_name: profile.display_name,
            email: profile.email,
            bio: profile.bio,
            photo_url: profile.photo_url,
            availability: profile.availability,
            is_following,
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserSearchResult {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub photo_url: Option<String>,
    /// Whether the searching user follows this user
    pub is_following: bool,
}
