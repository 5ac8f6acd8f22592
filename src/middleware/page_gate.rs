// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redirect signed-out visitors away from app pages.
//!
//! Only the presence of a session cookie is checked here. The API routes do
//! the real token validation.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::middleware::auth::{SESSION_COOKIE, SESSION_HINT_COOKIE};

/// Page paths that require a signed-in user (sub-paths included).
pub const PROTECTED_PREFIXES: [&str; 5] =
    ["/dashboard", "/profile", "/settings", "/calendar", "/search"];

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Login URL remembering where the visitor was headed.
pub fn login_redirect(path: &str) -> String {
    format!("/login?from={}", urlencoding::encode(path))
}

pub async fn page_gate(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !is_protected(path) {
        return next.run(request).await;
    }

    let has_session = jar.get(SESSION_COOKIE).is_some() || jar.get(SESSION_HINT_COOKIE).is_some();
    if has_session {
        return next.run(request).await;
    }

    tracing::debug!(path, "No session cookie; redirecting to login");
    Redirect::temporary(&login_redirect(path)).into_response()
}
