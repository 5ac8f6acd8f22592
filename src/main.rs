// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social Planner API Server
//!
//! Serves profiles, weekly tasks, search/follow and email verification for
//! the planner frontend.

use social_planner::{
    config::Config,
    db::{FirestoreDb, MemoryStore, Store},
    services::{EmailService, IdentityVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        env = %config.app_env,
        "Starting Social Planner API"
    );

    let store: Arc<dyn Store> = if config.memory_store {
        if config.is_production() {
            tracing::warn!("In-memory store selected in production; data will not persist");
        }
        tracing::info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        )
    };

    let identity =
        Arc::new(IdentityVerifier::new(&config).expect("Failed to initialize ID token verifier"));

    let mailer = Arc::new(EmailService::from_config(&config).expect("Failed to initialize email"));
    tracing::info!(live = mailer.is_live(), "Email service initialized");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, identity, mailer));

    // Build router
    let app = social_planner::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("social_planner=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
