// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;

use crate::models::{FreeTimeSlot, Weekday};
use crate::sync::cache::keys;
use crate::sync::{LocalCache, SyncError};

/// Manually entered free-time windows. These never leave the device.
pub struct FreeTimeSlots {
    uid: String,
    cache: Arc<LocalCache>,
    slots: Vec<FreeTimeSlot>,
}

impl FreeTimeSlots {
    /// Load the cached slots, or the starter set if none were saved.
    pub fn load(uid: &str, cache: Arc<LocalCache>) -> Self {
        let slots = cache
            .get::<Vec<FreeTimeSlot>>(&keys::free_time_slots(uid), None)
            .map(|cached| cached.data)
            .unwrap_or_else(FreeTimeSlot::defaults);
        Self {
            uid: uid.to_string(),
            cache,
            slots,
        }
    }

    pub fn slots(&self) -> &[FreeTimeSlot] {
        &self.slots
    }

    pub fn on(&self, day: Weekday) -> impl Iterator<Item = &FreeTimeSlot> {
        self.slots.iter().filter(move |slot| slot.day == day)
    }

    pub fn add(&mut self, day: Weekday, start_time: &str, end_time: &str) -> Result<FreeTimeSlot, SyncError> {
        let slot = FreeTimeSlot::new(day, start_time, end_time).map_err(SyncError::Invalid)?;
        self.slots.push(slot.clone());
        self.persist();
        Ok(slot)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        let removed = self.slots.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        if let Err(e) = self.cache.put(&keys::free_time_slots(&self.uid), &self.slots) {
            tracing::warn!(uid = %self.uid, error = %e, "Failed to cache free-time slots");
        }
    }
}
