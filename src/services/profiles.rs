// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile document lifecycle: creation on first sign-in and owner edits.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::db::Store;
use crate::error::AppError;
use crate::models::profile::validate_availability;
use crate::models::{ProfileField, ProfileUpdate, ProfileView, UserProfile};
use crate::services::changes::{Change, ChangeFeed};
use crate::services::identity::VerifiedIdentity;

pub struct ProfileService {
    store: Arc<dyn Store>,
    changes: Arc<ChangeFeed>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>, changes: Arc<ChangeFeed>) -> Self {
        Self { store, changes }
    }

    pub async fn get(&self, uid: &str) -> Result<UserProfile, AppError> {
        self.store
            .get_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))
    }

    /// Return the user's profile, creating it with defaults on first use.
    ///
    /// The returned flag is true when the profile was just created.
    pub async fn ensure(&self, identity: &VerifiedIdentity) -> Result<(UserProfile, bool), AppError> {
        if let Some(mut profile) = self.store.get_profile(&identity.uid).await? {
            // The provider may have verified the address out of band
            if identity.email_verified && !profile.email_verified {
                let now = Utc::now();
                profile.email_verified = true;
                profile.verified_at = Some(now);
                profile.updated_at = now;
                self.store
                    .update_profile(
                        &profile,
                        &[
                            ProfileField::EmailVerified,
                            ProfileField::VerifiedAt,
                            ProfileField::UpdatedAt,
                        ],
                    )
                    .await?;
                self.publish(&profile);
            }
            return Ok((profile, false));
        }

        let profile = UserProfile::new(
            &identity.uid,
            identity.display_name.as_deref(),
            &identity.email,
            identity.email_verified,
            Utc::now(),
        );
        self.store.upsert_profile(&profile).await?;

        tracing::info!(uid = %profile.uid, "Created user profile");
        Ok((profile, true))
    }

    /// Apply an owner edit and return the updated profile.
    pub async fn update(&self, uid: &str, update: ProfileUpdate) -> Result<UserProfile, AppError> {
        update
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if let Some(availability) = &update.availability {
            validate_availability(availability).map_err(AppError::BadRequest)?;
        }
        if let Some(photo_url) = &update.photo_url {
            if !photo_url.is_empty()
                && !photo_url.starts_with("https://")
                && !photo_url.starts_with("http://")
            {
                return Err(AppError::BadRequest(
                    "Photo URL must be an http(s) URL".to_string(),
                ));
            }
        }
        if update
            .display_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(AppError::BadRequest(
                "Display name must not be blank".to_string(),
            ));
        }

        let mut profile = self.get(uid).await?;
        let changed = profile.apply_update(update, Utc::now());
        if changed.is_empty() {
            return Ok(profile);
        }

        self.store.update_profile(&profile, &changed).await?;
        tracing::debug!(uid, fields = changed.len(), "Profile updated");

        self.publish(&profile);
        Ok(profile)
    }

    /// Push a profile snapshot to the owner's change feed.
    pub fn publish(&self, profile: &UserProfile) {
        self.changes.publish(
            &profile.uid,
            Change::Profile(ProfileView::from(profile.clone())),
        );
    }
}
