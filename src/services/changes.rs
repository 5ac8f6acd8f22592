// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user change notifications, delivered to clients as Server-Sent Events.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::{ProfileView, TaskList};

/// SSE event name for profile snapshots.
pub const PROFILE_EVENT: &str = "profile";
/// SSE event name for task list snapshots.
pub const TASKS_EVENT: &str = "tasks";

const CHANNEL_CAPACITY: usize = 16;

/// A full snapshot of one of the user's documents.
#[derive(Debug, Clone)]
pub enum Change {
    Profile(ProfileView),
    Tasks(TaskList),
}

impl Change {
    pub fn event_name(&self) -> &'static str {
        match self {
            Change::Profile(_) => PROFILE_EVENT,
            Change::Tasks(_) => TASKS_EVENT,
        }
    }

    /// JSON payload for the SSE `data:` field (the snapshot itself).
    pub fn payload(&self) -> serde_json::Result<String> {
        match self {
            Change::Profile(profile) => serde_json::to_string(profile),
            Change::Tasks(tasks) => serde_json::to_string(tasks),
        }
    }
}

/// Fan-out of document snapshots to each user's open subscriptions.
#[derive(Default)]
pub struct ChangeFeed {
    channels: DashMap<String, broadcast::Sender<Change>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, uid: &str) -> broadcast::Receiver<Change> {
        self.channels
            .entry(uid.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver a change to the user's subscribers, if any.
    pub fn publish(&self, uid: &str, change: Change) {
        let Some(sender) = self.channels.get(uid).map(|s| s.clone()) else {
            return;
        };

        if sender.send(change).is_err() {
            // Last subscriber went away
            self.channels
                .remove_if(uid, |_, s| s.receiver_count() == 0);
            tracing::debug!(uid, "Dropped change feed with no subscribers");
        }
    }

    pub fn subscriber_count(&self, uid: &str) -> usize {
        self.channels
            .get(uid)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_publish_reaches_only_that_user() {
        let feed = ChangeFeed::new();
        let mut alice = feed.subscribe("alice");
        let mut bob = feed.subscribe("bob");

        feed.publish("alice", Change::Tasks(TaskList::empty(Utc::now())));

        let change = alice.recv().await.unwrap();
        assert_eq!(change.event_name(), TASKS_EVENT);
        assert!(bob.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let feed = ChangeFeed::new();
        feed.publish("nobody", Change::Tasks(TaskList::empty(Utc::now())));
        assert_eq!(feed.subscriber_count("nobody"), 0);

        let rx = feed.subscribe("carol");
        assert_eq!(feed.subscriber_count("carol"), 1);
        drop(rx);
        feed.publish("carol", Change::Tasks(TaskList::empty(Utc::now())));
        assert_eq!(feed.subscriber_count("carol"), 0);
    }
}
