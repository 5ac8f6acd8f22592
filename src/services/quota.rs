// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-window send quotas keyed by client IP or email address.

use std::time::{Duration, Instant};

use dashmap::DashMap;

// Expired windows are swept once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `limit` sends per key within a window that opens at the first
/// counted send and resets once it has fully elapsed.
pub struct SendQuota {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl SendQuota {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Count one send for `key`.
    ///
    /// Returns `Err(retry_after_secs)` without counting if the quota is spent.
    pub fn try_acquire(&self, key: &str) -> Result<(), u64> {
        self.try_acquire_at(key, Instant::now())
    }

    pub fn try_acquire_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.windows.len() > PRUNE_THRESHOLD {
            self.prune(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) > self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.limit {
            let reset_at = entry.started + self.window;
            let retry_after = reset_at.saturating_duration_since(now).as_secs().max(1);
            tracing::debug!(key, count = entry.count, retry_after, "Send quota exhausted");
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(())
    }

    fn prune(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) <= window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_limit_within_window() {
        let quota = SendQuota::new(5, HOUR);
        let start = Instant::now();

        for i in 0..5 {
            let now = start + Duration::from_secs(i * 60);
            assert!(quota.try_acquire_at("1.2.3.4", now).is_ok());
        }
        let retry = quota
            .try_acquire_at("1.2.3.4", start + Duration::from_secs(600))
            .unwrap_err();
        assert_eq!(retry, 3000);

        // Other keys are independent
        for _ in 0..5 {
            assert!(quota.try_acquire_at("5.6.7.8", start).is_ok());
        }
        assert!(quota.try_acquire_at("5.6.7.8", start).is_err());
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let quota = SendQuota::new(2, HOUR);
        let start = Instant::now();

        assert!(quota.try_acquire_at("k", start).is_ok());
        assert!(quota.try_acquire_at("k", start).is_ok());
        // Exactly one window later is still inside it
        assert!(quota.try_acquire_at("k", start + HOUR).is_err());

        let later = start + HOUR + Duration::from_secs(1);
        assert!(quota.try_acquire_at("k", later).is_ok());
        // The new window counted one send
        assert!(quota.try_acquire_at("k", later).is_ok());
        assert!(quota.try_acquire_at("k", later).is_err());
    }
}
