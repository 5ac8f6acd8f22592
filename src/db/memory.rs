// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`Store`] used by tests and `STORE=memory` local runs.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::{FollowOutcome, Store};
use crate::error::AppError;
use crate::models::{FollowChange, ProfileField, TaskList, UserProfile};

#[derive(Default)]
pub struct MemoryStore {
    // BTreeMap keeps list_profiles in document-id order like Firestore
    profiles: RwLock<BTreeMap<String, UserProfile>>,
    tasks: RwLock<HashMap<String, TaskList>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.read().await.get(uid).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.profiles
            .write()
            .await
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        profile: &UserProfile,
        fields: &[ProfileField],
    ) -> Result<(), AppError> {
        let mut profiles = self.profiles.write().await;
        let stored = profiles
            .get_mut(&profile.uid)
            .ok_or_else(|| AppError::NotFound(format!("User {}", profile.uid)))?;
        for field in fields {
            field.copy(profile, stored);
        }
        Ok(())
    }

    async fn list_profiles(&self, limit: u32) -> Result<Vec<UserProfile>, AppError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn apply_follow(
        &self,
        follower_uid: &str,
        target_uid: &str,
        change: FollowChange,
        now: DateTime<Utc>,
    ) -> Result<FollowOutcome, AppError> {
        // One write lock covers both documents
        let mut profiles = self.profiles.write().await;

        let mut follower = profiles
            .get(follower_uid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {}", follower_uid)))?;
        let mut target = profiles
            .get(target_uid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {}", target_uid)))?;

        if change.apply(&mut follower, &mut target, now) {
            profiles.insert(follower.uid.clone(), follower.clone());
            profiles.insert(target.uid.clone(), target.clone());
        }

        Ok(FollowOutcome { follower, target })
    }

    async fn get_task_list(&self, uid: &str) -> Result<Option<TaskList>, AppError> {
        Ok(self.tasks.read().await.get(uid).cloned())
    }

    async fn put_task_list(&self, uid: &str, list: &TaskList) -> Result<(), AppError> {
        self.tasks
            .write()
            .await
            .insert(uid.to_string(), list.clone());
        Ok(())
    }
}
