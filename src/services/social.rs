// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User search and follow edges.

use std::sync::Arc;

use chrono::Utc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{FollowChange, ProfileView, PublicProfile, UserProfile, UserSearchResult};
use crate::services::changes::{Change, ChangeFeed};

/// Profiles fetched per search.
pub const SEARCH_SCAN_LIMIT: u32 = 100;
/// Results returned per search.
pub const SEARCH_RESULT_LIMIT: usize = 20;

/// Match `term` against a batch of profiles.
///
/// The term is trimmed and lowercased; an empty term matches nothing. A
/// profile matches when its display name or email contains the term. Exact
/// matches sort first and the original order is otherwise kept.
pub fn search_profiles(
    profiles: &[UserProfile],
    caller_uid: &str,
    caller_following: &[String],
    term: &str,
) -> Vec<UserSearchResult> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(bool, &UserProfile)> = profiles
        .iter()
        .filter(|p| p.uid != caller_uid)
        .filter_map(|p| {
            let name = p.display_name.to_lowercase();
            let email = p.email.to_lowercase();
            if name.contains(&term) || email.contains(&term) {
                Some((name == term || email == term, p))
            } else {
                None
            }
        })
        .collect();

    // Stable: non-exact matches keep fetch order
    hits.sort_by_key(|(exact, _)| !*exact);

    hits.into_iter()
        .take(SEARCH_RESULT_LIMIT)
        .map(|(_, p)| UserSearchResult {
            uid: p.uid.clone(),
            display_name: p.display_name.clone(),
            email: p.email.clone(),
            bio: p.bio.clone(),
            photo_url: p.photo_url.clone(),
            is_following: caller_following.iter().any(|id| *id == p.uid),
        })
        .collect()
}

pub struct SocialService {
    store: Arc<dyn Store>,
    changes: Arc<ChangeFeed>,
}

impl SocialService {
    pub fn new(store: Arc<dyn Store>, changes: Arc<ChangeFeed>) -> Self {
        Self { store, changes }
    }

    pub async fn search(&self, caller_uid: &str, term: &str) -> Result<Vec<UserSearchResult>, AppError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }

        let following = self
            .store
            .get_profile(caller_uid)
            .await?
            .map(|p| p.following)
            .unwrap_or_default();
        let profiles = self.store.list_profiles(SEARCH_SCAN_LIMIT).await?;

        let results = search_profiles(&profiles, caller_uid, &following, term);
        tracing::debug!(
            uid = caller_uid,
            scanned = profiles.len(),
            matched = results.len(),
            "User search"
        );
        Ok(results)
    }

    pub async fn follow(&self, caller_uid: &str, target_uid: &str) -> Result<(), AppError> {
        self.change(caller_uid, target_uid, FollowChange::Follow).await
    }

    pub async fn unfollow(&self, caller_uid: &str, target_uid: &str) -> Result<(), AppError> {
        self.change(caller_uid, target_uid, FollowChange::Unfollow)
            .await
    }

    async fn change(
        &self,
        caller_uid: &str,
        target_uid: &str,
        change: FollowChange,
    ) -> Result<(), AppError> {
        if caller_uid == target_uid {
            let msg = match change {
                FollowChange::Follow => "You cannot follow yourself",
                FollowChange::Unfollow => "You cannot unfollow yourself",
            };
            return Err(AppError::BadRequest(msg.to_string()));
        }

        let outcome = self
            .store
            .apply_follow(caller_uid, target_uid, change, Utc::now())
            .await?;

        for profile in [outcome.follower, outcome.target] {
            let uid = profile.uid.clone();
            self.changes
                .publish(&uid, Change::Profile(ProfileView::from(profile)));
        }
        Ok(())
    }

    pub async fn public_profile(
        &self,
        caller_uid: &str,
        target_uid: &str,
    ) -> Result<PublicProfile, AppError> {
        let target = self
            .store
            .get_profile(target_uid)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        let is_following = target.followers.iter().any(|id| id == caller_uid);
        Ok(PublicProfile::from_profile(target, is_following))
    }

    pub async fn followers(&self, uid: &str) -> Result<Vec<String>, AppError> {
        Ok(self.existing(uid).await?.followers)
    }

    pub async fn following(&self, uid: &str) -> Result<Vec<String>, AppError> {
        Ok(self.existing(uid).await?.following)
    }

    async fn existing(&self, uid: &str) -> Result<UserProfile, AppError> {
        self.store
            .get_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }
}
