// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile loading with an on-device fallback.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{ProfileUpdate, ProfileView};
use crate::sync::cache::keys;
use crate::sync::{Connectivity, LocalCache, RemoteStore, SyncError};

/// Cached profiles older than this are not used.
pub const PROFILE_CACHE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

pub const OFFLINE_NOTICE: &str = "Using cached profile data while offline.";

/// Result of [`ProfileSync::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLoad {
    pub profile: ProfileView,
    pub from_cache: bool,
    /// Message to show the user, if any.
    pub notice: Option<&'static str>,
}

pub struct ProfileSync {
    uid: String,
    remote: Arc<dyn RemoteStore>,
    cache: Arc<LocalCache>,
    connectivity: Connectivity,
    current: Mutex<Option<ProfileView>>,
    pending: Mutex<Option<ProfileUpdate>>,
}

impl ProfileSync {
    pub fn new(
        uid: &str,
        remote: Arc<dyn RemoteStore>,
        cache: Arc<LocalCache>,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            uid: uid.to_string(),
            remote,
            cache,
            connectivity,
            current: Mutex::new(None),
            pending: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<ProfileView> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The last update that failed to reach the server.
    pub fn pending_update(&self) -> Option<ProfileUpdate> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Fetch the profile, creating it on first sign-in. Offline or on a
    /// failed fetch, a cached copy younger than a day is used instead.
    pub async fn load(&self) -> Result<ProfileLoad, SyncError> {
        let err = if self.connectivity.is_online() {
            match self.fetch_or_init().await {
                Ok(profile) => {
                    self.store(profile.clone());
                    return Ok(ProfileLoad {
                        profile,
                        from_cache: false,
                        notice: None,
                    });
                }
                Err(e) => {
                    if e.is_offline() {
                        self.connectivity.set_online(false);
                    }
                    tracing::warn!(uid = %self.uid, error = %e, "Profile fetch failed");
                    e
                }
            }
        } else {
            SyncError::Offline
        };

        let cached = self
            .cache
            .get::<ProfileView>(&keys::profile(&self.uid), Some(PROFILE_CACHE_MAX_AGE))
            .ok_or(err)?;

        tracing::info!(uid = %self.uid, saved_at = %cached.saved_at, "Using cached profile");
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(cached.data.clone());
        Ok(ProfileLoad {
            profile: cached.data,
            from_cache: true,
            notice: Some(OFFLINE_NOTICE),
        })
    }

    async fn fetch_or_init(&self) -> Result<ProfileView, SyncError> {
        match self.remote.fetch_profile().await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::info!(uid = %self.uid, "No profile yet; creating");
                self.remote.init_profile().await
            }
        }
    }

    /// Send an edit to the server. Edits are not queued offline; a failed
    /// edit is kept for [`ProfileSync::retry_pending`].
    pub async fn update(&self, update: ProfileUpdate) -> Result<ProfileView, SyncError> {
        if !self.connectivity.is_online() {
            return Err(SyncError::Offline);
        }

        match self.remote.update_profile(&update).await {
            Ok(profile) => {
                self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
                self.store(profile.clone());
                Ok(profile)
            }
            Err(e) => {
                if e.is_offline() {
                    self.connectivity.set_online(false);
                }
                tracing::warn!(uid = %self.uid, error = %e, "Profile update failed");
                *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(update);
                Err(e)
            }
        }
    }

    /// Resend the last failed edit, if there is one.
    pub async fn retry_pending(&self) -> Result<Option<ProfileView>, SyncError> {
        match self.pending_update() {
            Some(update) => self.update(update).await.map(Some),
            None => Ok(None),
        }
    }

    /// Apply a server snapshot received over the change feed.
    pub fn apply_remote(&self, profile: ProfileView) -> bool {
        if !self.connectivity.is_online() || profile.uid != self.uid {
            return false;
        }
        self.store(profile);
        true
    }

    fn store(&self, profile: ProfileView) {
        if let Err(e) = self.cache.put(&keys::profile(&self.uid), &profile) {
            tracing::warn!(uid = %self.uid, error = %e, "Failed to cache profile");
        }
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(profile);
    }
}
