// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline-first task list synchronization.
//!
//! Every edit is applied in memory, written to the on-device cache, and then
//! pushed to the server by a debounced save. While offline, edits accumulate
//! locally and are pushed once connectivity returns.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::models::task::MAX_TASKS;
use crate::models::{Task, TaskList};
use crate::sync::cache::keys;
use crate::sync::{Connectivity, Debouncer, LocalCache, RemoteStore, RetryError, RetryPolicy, SyncError};

/// Quiet period after the last edit before the task list is saved.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(1);

/// Where the local task list stands relative to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    /// A save is scheduled.
    Pending,
    Saving { attempt: u32 },
    Saved,
    /// Edits are waiting for connectivity.
    PendingOffline,
    Failed { attempts: u32, message: String },
}

#[derive(Debug, Clone)]
pub struct TaskSyncConfig {
    pub debounce: Duration,
    pub retry: RetryPolicy,
}

impl Default for TaskSyncConfig {
    fn default() -> Self {
        Self {
            debounce: SAVE_DEBOUNCE,
            retry: RetryPolicy::default(),
        }
    }
}

struct State {
    tasks: Vec<Task>,
    /// Bumped on every local edit.
    revision: u64,
    /// Highest revision the server has acknowledged.
    saved_revision: u64,
}

struct Inner {
    uid: String,
    remote: Arc<dyn RemoteStore>,
    cache: Arc<LocalCache>,
    connectivity: Connectivity,
    debouncer: Debouncer,
    retry: RetryPolicy,
    /// Held for the whole of a save, retries included.
    save_lock: AsyncMutex<()>,
    state: Mutex<State>,
    status: watch::Sender<SyncStatus>,
}

/// Handle to one user's synchronized task list. Clones share state.
#[derive(Clone)]
pub struct TaskSync {
    inner: Arc<Inner>,
}

impl TaskSync {
    /// Start from whatever the on-device cache holds for `uid`.
    pub fn new(
        uid: &str,
        remote: Arc<dyn RemoteStore>,
        cache: Arc<LocalCache>,
        connectivity: Connectivity,
        config: TaskSyncConfig,
    ) -> Self {
        let tasks = cache
            .get::<Vec<Task>>(&keys::tasks(uid), None)
            .map(|cached| cached.data)
            .unwrap_or_default();
        tracing::debug!(uid, count = tasks.len(), "Loaded cached tasks");

        let (status, _rx) = watch::channel(SyncStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                uid: uid.to_string(),
                remote,
                cache,
                connectivity,
                debouncer: Debouncer::new(config.debounce),
                retry: config.retry,
                save_lock: AsyncMutex::new(()),
                state: Mutex::new(State {
                    tasks,
                    revision: 0,
                    saved_revision: 0,
                }),
                status,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: SyncStatus) {
        self.inner.status.send_replace(status);
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        let state = self.state();
        state.revision != state.saved_revision
    }

    /// Refresh from the server when online. Falls back to the cached list on
    /// failure. Unsaved local edits win over the server copy.
    pub async fn load(&self) -> Vec<Task> {
        if !self.inner.connectivity.is_online() {
            return self.tasks();
        }

        match self.inner.remote.fetch_tasks().await {
            Ok(list) if self.has_unsaved_changes() => {
                tracing::info!(
                    uid = %self.inner.uid,
                    remote_count = list.tasks.len(),
                    "Keeping unsaved local tasks over server copy"
                );
                self.schedule_save();
            }
            Ok(list) => self.replace_saved(list.tasks),
            Err(e) => {
                if e.is_offline() {
                    self.inner.connectivity.set_online(false);
                }
                tracing::warn!(uid = %self.inner.uid, error = %e, "Failed to load tasks; using cache");
            }
        }
        self.tasks()
    }

    pub fn add(&self, task: Task) -> Result<Task, SyncError> {
        task.validate().map_err(SyncError::Invalid)?;
        self.mutate(|tasks| {
            if tasks.len() >= MAX_TASKS {
                return Err(SyncError::Invalid(format!(
                    "At most {MAX_TASKS} tasks are allowed"
                )));
            }
            if tasks.iter().any(|t| t.id == task.id) {
                return Err(SyncError::Invalid(format!("Duplicate task id: {}", task.id)));
            }
            tasks.push(task.clone());
            Ok(task)
        })
    }

    /// Replace the task with the same id.
    pub fn update(&self, task: Task) -> Result<(), SyncError> {
        task.validate().map_err(SyncError::Invalid)?;
        self.mutate(|tasks| {
            let slot = tasks
                .iter_mut()
                .find(|t| t.id == task.id)
                .ok_or_else(|| SyncError::NotFound(format!("Task {}", task.id)))?;
            *slot = task;
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> Result<Task, SyncError> {
        self.mutate(|tasks| {
            let index = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| SyncError::NotFound(format!("Task {id}")))?;
            Ok(tasks.remove(index))
        })
    }

    fn mutate<R>(
        &self,
        edit: impl FnOnce(&mut Vec<Task>) -> Result<R, SyncError>,
    ) -> Result<R, SyncError> {
        let (result, snapshot) = {
            let mut state = self.state();
            let result = edit(&mut state.tasks)?;
            state.revision += 1;
            (result, state.tasks.clone())
        };
        self.persist(&snapshot);
        self.schedule_save();
        Ok(result)
    }

    /// Cache failures are logged and otherwise ignored; memory stays authoritative.
    fn persist(&self, tasks: &[Task]) {
        if let Err(e) = self.inner.cache.put(&keys::tasks(&self.inner.uid), &tasks) {
            tracing::warn!(uid = %self.inner.uid, error = %e, "Failed to cache tasks");
        }
    }

    fn schedule_save(&self) {
        if self.inner.connectivity.is_online() {
            self.set_status(SyncStatus::Pending);
            let this = self.clone();
            self.inner.debouncer.schedule(async move {
                // Errors are reported through the status channel
                let _ = this.save_now().await;
            });
        } else {
            self.inner.debouncer.cancel();
            self.set_status(SyncStatus::PendingOffline);
        }
    }

    /// Save immediately instead of waiting for the debounce delay.
    pub async fn flush(&self) -> Result<(), SyncError> {
        self.inner.debouncer.cancel();
        self.save_now().await
    }

    /// Push the current list, then any edits made while it was in flight.
    ///
    /// Saves never overlap, so an older snapshot cannot reach the server
    /// after a newer one.
    async fn save_now(&self) -> Result<(), SyncError> {
        let _guard = self.inner.save_lock.lock().await;

        loop {
            let pending = {
                let state = self.state();
                (state.revision != state.saved_revision)
                    .then(|| (state.tasks.clone(), state.revision))
            };
            let Some((tasks, revision)) = pending else {
                // An earlier save already covered the edit that scheduled this one
                self.inner.status.send_if_modified(|status| {
                    let covered = *status == SyncStatus::Pending;
                    if covered {
                        *status = SyncStatus::Saved;
                    }
                    covered
                });
                return Ok(());
            };

            if !self.inner.connectivity.is_online() {
                self.set_status(SyncStatus::PendingOffline);
                return Err(SyncError::Offline);
            }

            let mut attempts = 0;
            let result = self
                .inner
                .retry
                .run(
                    |attempt| {
                        attempts = attempt;
                        self.set_status(SyncStatus::Saving { attempt });
                        let remote = self.inner.remote.clone();
                        let tasks = tasks.clone();
                        async move { remote.save_tasks(&tasks).await }
                    },
                    SyncError::is_retryable,
                )
                .await;

            match result {
                Ok(saved) => {
                    let done = {
                        let mut state = self.state();
                        state.saved_revision = state.saved_revision.max(revision);
                        state.revision == state.saved_revision
                    };
                    tracing::debug!(
                        uid = %self.inner.uid,
                        revision,
                        count = saved.tasks.len(),
                        "Tasks saved"
                    );
                    if done {
                        self.set_status(SyncStatus::Saved);
                        return Ok(());
                    }
                    tracing::debug!(uid = %self.inner.uid, "Tasks edited during save; saving again");
                }
                Err(e) => {
                    let err = match e {
                        RetryError::Exhausted { last, .. } => last,
                        RetryError::Fatal(last) => last,
                    };
                    if err.is_offline() {
                        self.inner.connectivity.set_online(false);
                    }
                    tracing::error!(uid = %self.inner.uid, attempts, error = %err, "Failed to save tasks");
                    self.set_status(SyncStatus::Failed {
                        attempts,
                        message: err.category().user_message().to_string(),
                    });
                    return Err(err);
                }
            }
        }
    }

    /// Push pending edits whenever connectivity returns.
    pub fn spawn_reconnect_watcher(&self) -> JoinHandle<()> {
        let this = self.clone();
        let mut online_rx = self.inner.connectivity.subscribe();
        tokio::spawn(async move {
            while online_rx.changed().await.is_ok() {
                let online = *online_rx.borrow_and_update();
                if !this.has_unsaved_changes() {
                    continue;
                }
                if online {
                    tracing::info!(uid = %this.inner.uid, "Back online; saving pending tasks");
                    this.inner.debouncer.cancel();
                    let _ = this.save_now().await;
                } else {
                    this.inner.debouncer.cancel();
                    this.set_status(SyncStatus::PendingOffline);
                }
            }
        })
    }

    /// Apply a server snapshot received over the change feed.
    ///
    /// Ignored while offline, and while unsaved local edits exist since the
    /// pending save will overwrite the server copy. Returns whether the
    /// snapshot was applied.
    pub fn apply_remote(&self, list: TaskList) -> bool {
        if !self.inner.connectivity.is_online() || self.has_unsaved_changes() {
            return false;
        }
        self.replace_saved(list.tasks);
        true
    }

    fn replace_saved(&self, tasks: Vec<Task>) {
        {
            let mut state = self.state();
            state.tasks = tasks.clone();
            state.saved_revision = state.revision;
        }
        self.persist(&tasks);
    }
}
