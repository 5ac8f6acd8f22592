// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_search_term_too_long() {
    let (app, state) = common::create_test_app();
    let token = common::session_token(&state, "alice");

    let long_term = "a".repeat(101);
    let response = app
        .oneshot(common::authed_request(
            "GET",
            &format!("/api/users/search?q={long_term}"),
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_profile_patch_rejected() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    let token = common::session_token(&state, "alice");

    let response = app
        .oneshot(common::authed_request("PATCH", "/api/profile", &token, Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_patch_validation() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    let token = common::session_token(&state, "alice");

    let cases = [
        json!({ "displayName": "" }),
        json!({ "displayName": "   " }),
        json!({ "displayName": "x".repeat(101) }),
        json!({ "bio": "b".repeat(1001) }),
        json!({ "photoUrl": "javascript:alert(1)" }),
        json!({ "availability": [] }),
    ];

    for body in cases {
        let response = app
            .clone()
            .oneshot(common::authed_request("PATCH", "/api/profile", &token, Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {body}"
        );
    }

    // Nothing was written
    let stored = state.store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Alice");
    assert_eq!(stored.bio, "");
}

#[tokio::test]
async fn test_profile_patch_applies_fields() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    let token = common::session_token(&state, "alice");

    let response = app
        .oneshot(common::authed_request(
            "PATCH",
            "/api/profile",
            &token,
            Some(json!({ "bio": "Climbing on weekends", "photoUrl": "https://img.example.com/a.png" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["bio"], "Climbing on weekends");
    assert_eq!(json["displayName"], "Alice");
    assert!(json.get("verification").is_none());
}

#[tokio::test]
async fn test_init_profile_created_then_existing() {
    let (app, state) = common::create_test_app();
    let token = common::session_token(&state, "erin");

    let created = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/profile",
            &token,
            Some(json!({ "displayName": "Erin" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let json = common::body_json(created).await;
    assert_eq!(json["displayName"], "Erin");
    assert_eq!(json["availability"].as_array().unwrap().len(), 7);

    let again = app
        .oneshot(common::authed_request("POST", "/api/profile", &token, None))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_put_tasks_validation() {
    let (app, state) = common::create_test_app();
    let token = common::session_token(&state, "alice");

    let task = |id: &str, start: &str, end: &str| {
        json!({ "id": id, "day": "monday", "startTime": start, "endTime": end, "description": "" })
    };

    let cases = [
        json!({ "tasks": [task("a", "10:00", "09:00")] }),
        json!({ "tasks": [task("a", "9:00", "10:00")] }),
        json!({ "tasks": [task("a", "09:00", "10:00"), task("a", "11:00", "12:00")] }),
        json!({ "tasks": [task("", "09:00", "10:00")] }),
    ];

    for body in cases {
        let response = app
            .clone()
            .oneshot(common::authed_request("PUT", "/api/tasks", &token, Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {body}"
        );
    }
}

#[tokio::test]
async fn test_put_then_get_tasks() {
    let (app, state) = common::create_test_app();
    let token = common::session_token(&state, "alice");

    let empty = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/tasks", &token, None))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::OK);
    assert_eq!(common::body_json(empty).await["tasks"], json!([]));

    let body = json!({ "tasks": [{
        "id": "t1",
        "day": "Tuesday",
        "startTime": "18:00",
        "endTime": "19:30",
        "description": "Choir"
    }]});
    let saved = app
        .clone()
        .oneshot(common::authed_request("PUT", "/api/tasks", &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);

    let fetched = app
        .oneshot(common::authed_request("GET", "/api/tasks", &token, None))
        .await
        .unwrap();
    let json = common::body_json(fetched).await;
    assert_eq!(json["tasks"][0]["id"], "t1");
    assert_eq!(json["tasks"][0]["day"], "tuesday");
    assert!(json["updatedAt"].is_string());
}
