// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly tasks and free-time slots.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Weekday;
use crate::time_utils::parse_clock_time;

/// Upper bound on tasks kept per user.
pub const MAX_TASKS: usize = 500;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A scheduled task on a given weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Task {
    pub id: String,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub description: String,
}

impl Task {
    /// Create a task with a freshly generated id.
    pub fn new(day: Weekday, start_time: &str, end_time: &str, description: &str) -> Self {
        Self {
            id: new_id(),
            day,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            description: description.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Task id must not be empty".to_string());
        }
        validate_window(&self.start_time, &self.end_time)?;
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(format!(
                "Task description must be at most {MAX_DESCRIPTION_CHARS} characters"
            ));
        }
        Ok(())
    }
}

/// Validate a full task list before it replaces the stored one.
pub fn validate_tasks(tasks: &[Task]) -> Result<(), String> {
    if tasks.len() > MAX_TASKS {
        return Err(format!("At most {MAX_TASKS} tasks are allowed"));
    }

    let mut seen = std::collections::HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()
            .map_err(|e| format!("Task {}: {}", task.id, e))?;
        if !seen.insert(task.id.as_str()) {
            return Err(format!("Duplicate task id: {}", task.id));
        }
    }
    Ok(())
}

fn validate_window(start: &str, end: &str) -> Result<(), String> {
    let start = parse_clock_time(start).ok_or("Start time must be HH:MM")?;
    let end = parse_clock_time(end).ok_or("End time must be HH:MM")?;
    if end <= start {
        return Err("End time must be after start time".to_string());
    }
    Ok(())
}

/// Document stored at `tasks/{uid}`: the complete task set for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl TaskList {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            tasks: Vec::new(),
            updated_at: now,
        }
    }
}

/// A manually entered free-time window, kept on-device only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTimeSlot {
    pub id: String,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
}

impl FreeTimeSlot {
    pub fn new(day: Weekday, start_time: &str, end_time: &str) -> Result<Self, String> {
        validate_window(start_time, end_time)?;
        Ok(Self {
            id: new_id(),
            day,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        })
    }

    /// Starter slots shown before the user has entered any.
    pub fn defaults() -> Vec<FreeTimeSlot> {
        [
            ("1", Weekday::Monday, "09:00", "12:00"),
            ("2", Weekday::Monday, "13:00", "17:00"),
            ("3", Weekday::Wednesday, "09:00", "17:00"),
            ("4", Weekday::Friday, "13:00", "15:00"),
        ]
        .into_iter()
        .map(|(id, day, start, end)| FreeTimeSlot {
            id: id.to_string(),
            day,
            start_time: start.to_string(),
            end_time: end.to_string(),
        })
        .collect()
    }
}

/// Random 16-hex-digit identifier for client-created records.
pub fn new_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
