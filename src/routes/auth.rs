// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: exchange a provider ID token for a session cookie.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_session_token, SESSION_COOKIE, SESSION_HINT_COOKIE, SESSION_TTL_SECS,
};
use crate::services::IdentityError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

/// Session creation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub email_verified: bool,
    /// True when this sign-in created the profile
    pub new_user: bool,
}

fn session_cookie(config: &Config, name: &'static str, value: String, http_only: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Verify the provider ID token from the Authorization header, make sure
/// the profile exists, and start a session.
async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let identity = state
        .identity
        .verify_bearer(headers.get(header::AUTHORIZATION))
        .await
        .map_err(|e| match e {
            IdentityError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "ID token rejected");
                AppError::InvalidToken
            }
            IdentityError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("ID token verification unavailable: {reason}"))
            }
        })?;

    let (profile, new_user) = state.profiles.ensure(&identity).await?;

    let token = create_session_token(&profile.uid, Some(&profile.email), &state.config.session_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;

    tracing::info!(uid = %profile.uid, new_user, "Session started");

    let jar = jar
        .add(session_cookie(&state.config, SESSION_COOKIE, token, true))
        .add(session_cookie(&state.config, SESSION_HINT_COOKIE, "1".to_string(), false));

    Ok((
        jar,
        Json(SessionResponse {
            uid: profile.uid,
            email: profile.email,
            display_name: profile.display_name,
            email_verified: profile.email_verified,
            new_user,
        }),
    ))
}

/// Clear both session cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    let jar = jar
        .remove(session_cookie(&state.config, SESSION_COOKIE, String::new(), true))
        .remove(session_cookie(&state.config, SESSION_HINT_COOKIE, String::new(), false));
    (StatusCode::NO_CONTENT, jar)
}
