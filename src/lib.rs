// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Social Planner: weekly availability, tasks and follows for coordinating
//! free time with other people.
//!
//! This crate provides the backend API (profiles, tasks, search/follow,
//! email verification, email relay) and the `sync` client library that keeps
//! a device's local copy in step with it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod sync;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{
    ChangeFeed, EmailService, IdentityVerifier, ProfileService, ScheduleService, SendQuota,
    SocialService, VerificationService,
};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub identity: Arc<IdentityVerifier>,
    pub mailer: Arc<EmailService>,
    pub changes: Arc<ChangeFeed>,
    pub profiles: ProfileService,
    pub social: SocialService,
    pub schedule: ScheduleService,
    pub verification: VerificationService,
    /// Per-client quota for the public email relay
    pub relay_quota: SendQuota,
}

impl AppState {
    /// Wire services around the given store, verifier and mailer.
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        identity: Arc<IdentityVerifier>,
        mailer: Arc<EmailService>,
    ) -> Self {
        let changes = Arc::new(ChangeFeed::new());
        let relay_quota = SendQuota::new(
            config.email_quota_per_window,
            Duration::from_secs(config.email_quota_window_secs),
        );

        Self {
            profiles: ProfileService::new(store.clone(), changes.clone()),
            social: SocialService::new(store.clone(), changes.clone()),
            schedule: ScheduleService::new(store.clone(), changes.clone()),
            verification: VerificationService::new(store.clone(), mailer.clone(), changes.clone()),
            config,
            store,
            identity,
            mailer,
            changes,
            relay_quota,
        }
    }
}
