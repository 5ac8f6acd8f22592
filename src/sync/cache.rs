// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-device JSON cache, one file per key.
//!
//! Each entry is stored as `{"data": <value>, "timestamp": <unix millis>}`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::sync::SyncError;

/// Cache key names.
pub mod keys {
    pub fn profile(uid: &str) -> String {
        format!("userProfileCache_{uid}")
    }

    pub fn tasks(uid: &str) -> String {
        format!("tasks_{uid}")
    }

    pub fn free_time_slots(uid: &str) -> String {
        format!("free_time_slots_{uid}")
    }
}

#[derive(Serialize, Deserialize)]
struct Entry<T> {
    data: T,
    timestamp: i64,
}

/// A value read back from the cache with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub data: T,
    pub saved_at: DateTime<Utc>,
}

pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SyncError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| SyncError::Cache(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", urlencoding::encode(key)))
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SyncError> {
        self.put_at(key, value, Utc::now())
    }

    /// Write an entry stamped with `now`.
    ///
    /// The file is replaced atomically so a crash never leaves a torn entry.
    pub fn put_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let entry = Entry {
            data: value,
            timestamp: now.timestamp_millis(),
        };
        let bytes =
            serde_json::to_vec(&entry).map_err(|e| SyncError::Cache(format!("encode {key}: {e}")))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| SyncError::Cache(format!("write {key}: {e}")))?;
        fs::rename(&tmp, &path).map_err(|e| SyncError::Cache(format!("rename {key}: {e}")))?;
        Ok(())
    }

    /// Read an entry. Missing, corrupt, and (when `max_age` is set) stale
    /// entries all read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Option<Duration>) -> Option<Cached<T>> {
        self.get_at(key, max_age, Utc::now())
    }

    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Option<Cached<T>> {
        let bytes = fs::read(self.path_for(key)).ok()?;
        let entry: Entry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring corrupt cache entry");
                return None;
            }
        };

        let saved_at = DateTime::from_timestamp_millis(entry.timestamp)?;
        if let Some(max_age) = max_age {
            let age = now.signed_duration_since(saved_at);
            if age.num_milliseconds() > max_age.as_millis() as i64 {
                tracing::debug!(key, age_secs = age.num_seconds(), "Cache entry expired");
                return None;
            }
        }

        Some(Cached {
            data: entry.data,
            saved_at,
        })
    }

    pub fn remove(&self, key: &str) -> Result<(), SyncError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Cache(format!("remove {key}: {e}"))),
        }
    }
}
