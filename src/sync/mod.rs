// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side synchronization.
//!
//! Keeps a device's copy of the user's profile and tasks usable offline:
//! edits apply locally first, are cached on disk, and reach the server via a
//! debounced save that retries with backoff. Server snapshots arrive over the
//! `/api/events` stream and replace local state.

pub mod cache;
pub mod connectivity;
pub mod debounce;
pub mod events;
pub mod free_time;
pub mod profile;
pub mod remote;
pub mod retry;
pub mod tasks;

pub use cache::LocalCache;
pub use connectivity::Connectivity;
pub use debounce::Debouncer;
pub use free_time::FreeTimeSlots;
pub use profile::{ProfileLoad, ProfileSync};
pub use remote::{HttpRemote, RemoteStore};
pub use retry::{RetryError, RetryPolicy};
pub use tasks::{SyncStatus, TaskSync, TaskSyncConfig};

use axum::http::StatusCode;

use crate::error::ErrorCategory;

/// Errors surfaced by the sync layer. None of them is fatal; each is scoped
/// to the action that triggered it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("You are offline")]
    Offline,

    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid: {0}")]
    Invalid(String),

    #[error("local cache error: {0}")]
    Cache(String),
}

impl SyncError {
    /// True when the failure means the server could not be reached.
    pub fn is_offline(&self) -> bool {
        matches!(self, SyncError::Offline | SyncError::Network(_))
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Remote { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Offline | SyncError::Network(_) => ErrorCategory::Network,
            SyncError::Remote { status, .. } => StatusCode::from_u16(*status)
                .map(ErrorCategory::from_status)
                .unwrap_or(ErrorCategory::Other),
            _ => ErrorCategory::Other,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SyncError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
