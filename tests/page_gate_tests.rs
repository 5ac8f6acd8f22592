// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page access and security header tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn page(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_protected_page_redirects_without_session() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(page("/calendar/week", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login?from=%2Fcalendar%2Fweek"
    );
}

#[tokio::test]
async fn test_protected_page_passes_with_hint_cookie() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(page("/dashboard", Some("userHasSession=1")))
        .await
        .unwrap();

    // No frontend bundle is configured, so the page itself is missing
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_pages_not_gated() {
    let (app, _) = common::create_test_app();

    for uri in ["/login", "/", "/profiles"] {
        let response = app.clone().oneshot(page(uri, None)).await.unwrap();
        assert_ne!(
            response.status(),
            StatusCode::TEMPORARY_REDIRECT,
            "{uri} should not redirect"
        );
    }
}

#[tokio::test]
async fn test_api_routes_not_redirected() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(page("/api/profile", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_security_headers_present() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(page("/health", None)).await.unwrap();
    let headers = response.headers();

    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-frame-options"));
}
