// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdate, ProfileView, PublicProfile, Task, TaskList, UserSearchResult};
use crate::services::changes::Change;
use crate::services::VerifiedIdentity;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted search term, in characters.
const MAX_SEARCH_TERM_CHARS: usize = 100;

/// API routes (require authentication via session token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route(
            "/api/profile",
            get(get_profile).post(init_profile).patch(update_profile),
        )
        .route("/api/users/search", get(search_users))
        .route("/api/users/{uid}", get(get_user))
        .route("/api/users/{uid}/follow", post(follow).delete(unfollow))
        .route("/api/users/{uid}/followers", get(get_followers))
        .route("/api/users/{uid}/following", get(get_following))
        .route("/api/tasks", get(get_tasks).put(put_tasks))
        .route("/api/events", get(events))
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionInfo {
    pub uid: String,
    pub email: Option<String>,
}

async fn get_session(Extension(user): Extension<AuthUser>) -> Json<SessionInfo> {
    Json(SessionInfo {
        uid: user.uid,
        email: user.email,
    })
}

// ─── Own Profile ─────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileView>> {
    let profile = state.profiles.get(&user.uid).await?;
    Ok(Json(profile.into()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitProfileRequest {
    display_name: Option<String>,
}

/// Create the caller's profile if it does not exist yet.
///
/// The body is optional; an empty body uses the email prefix as the name.
async fn init_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<ProfileView>)> {
    let request: InitProfileRequest = if body.is_empty() {
        InitProfileRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let email = user
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("Session has no email address".to_string()))?;

    let identity = VerifiedIdentity {
        uid: user.uid,
        email,
        email_verified: false,
        display_name: request.display_name,
    };
    let (profile, created) = state.profiles.ensure(&identity).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(profile.into())))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    let profile = state.profiles.update(&user.uid, update).await?;
    Ok(Json(profile.into()))
}

// ─── Users & Follow Edges ────────────────────────────────────

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResponse {
    pub results: Vec<UserSearchResult>,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    if query.q.chars().count() > MAX_SEARCH_TERM_CHARS {
        return Err(AppError::BadRequest(format!(
            "Search term must be at most {MAX_SEARCH_TERM_CHARS} characters"
        )));
    }
    let results = state.social.search(&user.uid, &query.q).await?;
    Ok(Json(SearchResponse { results }))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<PublicProfile>> {
    Ok(Json(state.social.public_profile(&user.uid, &uid).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowResponse {
    pub uid: String,
    pub is_following: bool,
}

async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<FollowResponse>> {
    state.social.follow(&user.uid, &uid).await?;
    Ok(Json(FollowResponse {
        uid,
        is_following: true,
    }))
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<FollowResponse>> {
    state.social.unfollow(&user.uid, &uid).await?;
    Ok(Json(FollowResponse {
        uid,
        is_following: false,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UidListResponse {
    pub uids: Vec<String>,
}

async fn get_followers(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UidListResponse>> {
    let uids = state.social.followers(&uid).await?;
    Ok(Json(UidListResponse { uids }))
}

async fn get_following(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UidListResponse>> {
    let uids = state.social.following(&uid).await?;
    Ok(Json(UidListResponse { uids }))
}

// ─── Tasks ───────────────────────────────────────────────────

async fn get_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TaskList>> {
    Ok(Json(state.schedule.get_tasks(&user.uid).await?))
}

#[derive(Deserialize)]
struct PutTasksRequest {
    tasks: Vec<Task>,
}

async fn put_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PutTasksRequest>,
) -> Result<Json<TaskList>> {
    Ok(Json(
        state.schedule.replace_tasks(&user.uid, request.tasks).await?,
    ))
}

// ─── Change Feed ─────────────────────────────────────────────

/// Server-Sent Events stream of the caller's profile and task snapshots.
///
/// Current snapshots are sent first so a client can rely on the stream alone.
async fn events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    // Subscribe before reading so no update falls between snapshot and feed
    let rx = state.changes.subscribe(&user.uid);

    let mut initial = Vec::new();
    if let Some(profile) = state.store.get_profile(&user.uid).await? {
        initial.push(Change::Profile(profile.into()));
    }
    initial.push(Change::Tasks(state.schedule.get_tasks(&user.uid).await?));

    tracing::debug!(uid = %user.uid, "Change feed subscribed");

    let initial = stream::iter(initial.into_iter().filter_map(to_event).map(Ok::<_, Infallible>));
    let updates = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    if let Some(event) = to_event(change) {
                        return Some((Ok::<_, Infallible>(event), rx));
                    }
                }
                // Resumes with the next full snapshot
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Change feed subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(initial.chain(updates))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn to_event(change: Change) -> Option<Event> {
    match change.payload() {
        Ok(data) => Some(Event::default().event(change.event_name()).data(data)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize change event");
            None
        }
    }
}
