// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile documents, follow edges)
//! - Tasks (one task list document per user)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{collections, FollowOutcome, Store};
use crate::error::AppError;
use crate::models::{FollowChange, ProfileField, TaskList, UserProfile};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_profile(
        &self,
        profile: &UserProfile,
        fields: &[ProfileField],
    ) -> Result<(), AppError> {
        if fields.is_empty() {
            return Ok(());
        }

        // Fields masked out of the update are left untouched; fields in the
        // mask but absent from the object (e.g. a cleared code) are deleted.
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().map(|f| f.path()))
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_profiles(&self, limit: u32) -> Result<Vec<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Follow Edges ────────────────────────────────────────────

    /// Apply a follow change to both profiles in one transaction.
    ///
    /// Array membership is changed with server-side union/removal transforms,
    /// so concurrent follows of the same target from different users cannot
    /// overwrite each other's entries. `updatedAt` is written in the same
    /// commit through a field mask.
    async fn apply_follow(
        &self,
        follower_uid: &str,
        target_uid: &str,
        change: FollowChange,
        now: DateTime<Utc>,
    ) -> Result<FollowOutcome, AppError> {
        let client = self.get_client()?;

        let mut follower = self
            .get_profile(follower_uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", follower_uid)))?;
        let mut target = self
            .get_profile(target_uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", target_uid)))?;

        // Already in the requested state
        if !change.apply(&mut follower, &mut target, now) {
            return Ok(FollowOutcome { follower, target });
        }

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (profile, field, member) in [
            (&follower, ProfileField::Following, target_uid),
            (&target, ProfileField::Followers, follower_uid),
        ] {
            let member = member.to_string();
            client
                .fluent()
                .update()
                .fields([ProfileField::UpdatedAt.path()])
                .in_col(collections::USERS)
                .document_id(&profile.uid)
                .object(profile)
                .transforms(|t| match change {
                    FollowChange::Follow => t.fields([t
                        .field(field.path())
                        .append_missing_elements([member.clone()])]),
                    FollowChange::Unfollow => t.fields([t
                        .field(field.path())
                        .remove_all_from_array([member.clone()])]),
                })
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add follow edge to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            follower = follower_uid,
            target = target_uid,
            ?change,
            "Follow edge updated"
        );

        Ok(FollowOutcome { follower, target })
    }

    // ─── Task Operations ─────────────────────────────────────────

    async fn get_task_list(&self, uid: &str) -> Result<Option<TaskList>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TASKS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put_task_list(&self, uid: &str, list: &TaskList) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TASKS)
            .document_id(uid)
            .object(list)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
