// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user task lists.

use std::sync::Arc;

use chrono::Utc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::task::validate_tasks;
use crate::models::{Task, TaskList};
use crate::services::changes::{Change, ChangeFeed};

pub struct ScheduleService {
    store: Arc<dyn Store>,
    changes: Arc<ChangeFeed>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn Store>, changes: Arc<ChangeFeed>) -> Self {
        Self { store, changes }
    }

    /// The user's tasks; an empty list if none were ever saved.
    pub async fn get_tasks(&self, uid: &str) -> Result<TaskList, AppError> {
        Ok(self
            .store
            .get_task_list(uid)
            .await?
            .unwrap_or_else(|| TaskList::empty(Utc::now())))
    }

    /// Replace the user's whole task list.
    pub async fn replace_tasks(&self, uid: &str, tasks: Vec<Task>) -> Result<TaskList, AppError> {
        validate_tasks(&tasks).map_err(AppError::BadRequest)?;

        let list = TaskList {
            tasks,
            updated_at: Utc::now(),
        };
        self.store.put_task_list(uid, &list).await?;

        tracing::debug!(uid, count = list.tasks.len(), "Task list saved");
        self.changes.publish(uid, Change::Tasks(list.clone()));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Weekday;

    #[tokio::test]
    async fn test_replace_then_get() {
        let service = ScheduleService::new(Arc::new(MemoryStore::new()), Arc::new(ChangeFeed::new()));
        assert!(service.get_tasks("alice").await.unwrap().tasks.is_empty());

        let task = Task::new(Weekday::Tuesday, "08:00", "09:00", "Gym");
        service
            .replace_tasks("alice", vec![task.clone()])
            .await
            .unwrap();

        let stored = service.get_tasks("alice").await.unwrap();
        assert_eq!(stored.tasks, vec![task]);
    }

    #[tokio::test]
    async fn test_replace_rejects_invalid_task() {
        let service = ScheduleService::new(Arc::new(MemoryStore::new()), Arc::new(ChangeFeed::new()));
        let bad = Task::new(Weekday::Tuesday, "10:00", "09:00", "Backwards");
        let err = service.replace_tasks("alice", vec![bad]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(service.get_tasks("alice").await.unwrap().tasks.is_empty());
    }
}
