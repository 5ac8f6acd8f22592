// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use social_planner::config::Config;
use social_planner::db::{FirestoreDb, MemoryStore, Store};
use social_planner::middleware::auth::create_session_token;
use social_planner::models::{ProfileUpdate, ProfileView, Task, TaskList, UserProfile};
use social_planner::routes::create_router;
use social_planner::services::identity::issuer_for;
use social_planner::services::{EmailService, IdentityVerifier};
use social_planner::sync::{LocalCache, RemoteStore, SyncError};
use social_planner::AppState;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared secret for test ID tokens.
pub const ID_TOKEN_SECRET: &[u8] = b"integration-id-token-secret";
pub const ID_TOKEN_KID: &str = "test-kid";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        frontend_url: frontend_url.to_string(),
        ..Config::default()
    };
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let mailer = Arc::new(EmailService::log_only(config.email_from.clone()));
    create_test_app_with_mailer(config, mailer)
}

#[allow(dead_code)]
pub fn create_test_app_with_mailer(
    config: Config,
    mailer: Arc<EmailService>,
) -> (axum::Router, Arc<AppState>) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let identity = Arc::new(
        IdentityVerifier::new_with_static_key(
            &config,
            ID_TOKEN_KID,
            Algorithm::HS256,
            DecodingKey::from_secret(ID_TOKEN_SECRET),
        )
        .expect("static identity verifier"),
    );

    let state = Arc::new(AppState::new(config, store, identity, mailer));
    (create_router(state.clone()), state)
}

/// Session token for `uid`, signed with the test configuration's key.
#[allow(dead_code)]
pub fn session_token(state: &AppState, uid: &str) -> String {
    let email = format!("{uid}@example.com");
    create_session_token(uid, Some(&email), &state.config.session_signing_key).unwrap()
}

/// Provider ID token accepted by the test verifier.
#[allow(dead_code)]
pub fn id_token(uid: &str, email: &str, email_verified: bool, name: Option<&str>) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = serde_json::json!({
        "iss": issuer_for(&Config::default().firebase_project_id),
        "aud": Config::default().firebase_project_id,
        "sub": uid,
        "iat": now,
        "exp": now + 3600,
        "email": email,
        "email_verified": email_verified,
        "name": name,
    });

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(ID_TOKEN_KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(ID_TOKEN_SECRET)).unwrap()
}

/// Insert a profile directly into the store.
#[allow(dead_code)]
pub async fn seed_profile(state: &AppState, uid: &str, name: &str) -> UserProfile {
    let profile = UserProfile::new(
        uid,
        Some(name),
        &format!("{uid}@example.com"),
        false,
        Utc::now(),
    );
    state.store.upsert_profile(&profile).await.unwrap();
    profile
}

#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));

    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Fresh on-device cache in a unique temp directory.
#[allow(dead_code)]
pub fn temp_cache() -> Arc<LocalCache> {
    let dir = std::env::temp_dir().join(format!(
        "planner-test-cache-{}",
        social_planner::models::task::new_id()
    ));
    Arc::new(LocalCache::open(dir).unwrap())
}

/// Scripted `RemoteStore` that records task saves.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeRemote {
    pub tasks: Mutex<Vec<Task>>,
    pub profile: Mutex<Option<ProfileView>>,
    pub saves: AtomicU32,
    pub profile_updates: AtomicU32,
    /// Number of upcoming calls that fail with a server error
    pub fail_next: AtomicU32,
    /// Fail every call as if the network were down
    pub unreachable: std::sync::atomic::AtomicBool,
}

#[allow(dead_code)]
impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn saved_tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SyncError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SyncError::Network("connection refused".to_string()));
        }
        let failed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(SyncError::Remote {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch_profile(&self) -> Result<Option<ProfileView>, SyncError> {
        self.check()?;
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn init_profile(&self) -> Result<ProfileView, SyncError> {
        self.check()?;
        let profile: ProfileView = UserProfile::new("u1", None, "u1@example.com", false, Utc::now()).into();
        *self.profile.lock().unwrap() = Some(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileView, SyncError> {
        self.check()?;
        self.profile_updates.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.profile.lock().unwrap();
        let profile = guard
            .as_mut()
            .ok_or_else(|| SyncError::NotFound("Profile".to_string()))?;
        if let Some(name) = &update.display_name {
            profile.display_name = name.clone();
        }
        if let Some(bio) = &update.bio {
            profile.bio = bio.clone();
        }
        Ok(profile.clone())
    }

    async fn fetch_tasks(&self) -> Result<TaskList, SyncError> {
        self.check()?;
        Ok(TaskList {
            tasks: self.tasks.lock().unwrap().clone(),
            updated_at: Utc::now(),
        })
    }

    async fn save_tasks(&self, tasks: &[Task]) -> Result<TaskList, SyncError> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.tasks.lock().unwrap() = tasks.to_vec();
        Ok(TaskList {
            tasks: tasks.to_vec(),
            updated_at: Utc::now(),
        })
    }
}
