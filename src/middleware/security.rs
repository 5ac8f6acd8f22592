// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Policy for JSON and event-stream responses.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

/// Policy for the frontend bundle. The sign-in widget talks to the identity
/// provider's endpoints directly.
const PAGE_CSP: &str = "default-src 'self'; \
     connect-src 'self' https://*.googleapis.com https://securetoken.googleapis.com; \
     img-src 'self' data: https:; \
     style-src 'self' 'unsafe-inline'; \
     frame-src https://*.firebaseapp.com; \
     frame-ancestors 'none'";

fn is_api_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/api/") || path.starts_with("/auth/")
}

/// Add security headers to all responses.
pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let csp = if is_api_path(req.uri().path()) {
        API_CSP
    } else {
        PAGE_CSP
    };

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert("Content-Security-Policy", HeaderValue::from_static(csp));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=(), usb=()"),
    );

    response
}
