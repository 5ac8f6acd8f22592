// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Online/offline tracking.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Timeout for a single health probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared connectivity flag. Clones observe the same state.
#[derive(Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record the current state. Subscribers are only woken on a transition.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            if online {
                tracing::info!("Connection restored");
            } else {
                tracing::warn!("Connection lost; working offline");
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Check `health_url` once and record the result.
    pub async fn probe(&self, http: &reqwest::Client, health_url: &str) -> bool {
        let online = match http.get(health_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Health probe failed");
                false
            }
        };
        self.set_online(online);
        online
    }

    /// Probe `health_url` every `period` until the handle is aborted.
    pub fn spawn_probe_loop(
        &self,
        http: reqwest::Client,
        health_url: String,
        period: Duration,
    ) -> JoinHandle<()> {
        let connectivity = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                connectivity.probe(&http, &health_url).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transitions_notify_once() {
        let connectivity = Connectivity::new(true);
        let mut rx = connectivity.subscribe();

        connectivity.set_online(true);
        assert!(!rx.has_changed().unwrap());

        connectivity.set_online(false);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
        assert!(!connectivity.is_online());

        let clone = connectivity.clone();
        clone.set_online(true);
        assert!(connectivity.is_online());
    }

    #[tokio::test]
    async fn test_probe_unreachable_marks_offline() {
        let connectivity = Connectivity::new(true);
        let http = reqwest::Client::new();
        // Port 9 (discard) on loopback is not listening in test environments
        let online = connectivity.probe(&http, "http://127.0.0.1:9/health").await;
        assert!(!online);
        assert!(!connectivity.is_online());
    }
}
