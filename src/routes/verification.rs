// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email verification code routes (session required).

use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::ProfileView;
use crate::services::verification::IssuedCode;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/verification/code", post(issue_code))
        .route("/api/verification/verify", post(verify_code))
}

/// Send a new code, subject to the resend cooldown.
async fn issue_code(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<IssuedCode>> {
    Ok(Json(
        state.verification.issue_code(&user.uid, Utc::now()).await?,
    ))
}

#[derive(Deserialize)]
struct VerifyRequest {
    code: String,
}

async fn verify_code(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<ProfileView>> {
    Ok(Json(
        state
            .verification
            .verify(&user.uid, &request.code, Utc::now())
            .await?,
    ))
}
