//! Database layer.
//!
//! Handlers talk to a [`Store`]; production uses Firestore and tests or
//! local development may use the in-memory implementation.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{FollowChange, ProfileField, TaskList, UserProfile};

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by uid)
    pub const USERS: &str = "users";
    /// Per-user task lists (keyed by uid)
    pub const TASKS: &str = "tasks";
}

/// Both sides of a follow edge after a change was applied.
#[derive(Debug, Clone)]
pub struct FollowOutcome {
    pub follower: UserProfile,
    pub target: UserProfile,
}

/// Persistence operations needed by the services.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;

    /// Create or fully overwrite a profile.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError>;

    /// Write only `fields` of `profile` to the existing document.
    async fn update_profile(
        &self,
        profile: &UserProfile,
        fields: &[ProfileField],
    ) -> Result<(), AppError>;

    /// Fetch up to `limit` profiles in storage order.
    async fn list_profiles(&self, limit: u32) -> Result<Vec<UserProfile>, AppError>;

    /// Update `following` on the follower and `followers` on the target
    /// atomically. Fails with `NotFound` if either profile is missing.
    async fn apply_follow(
        &self,
        follower_uid: &str,
        target_uid: &str,
        change: FollowChange,
        now: DateTime<Utc>,
    ) -> Result<FollowOutcome, AppError>;

    async fn get_task_list(&self, uid: &str) -> Result<Option<TaskList>, AppError>;

    async fn put_task_list(&self, uid: &str, list: &TaskList) -> Result<(), AppError>;
}
