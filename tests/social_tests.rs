// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Search and follow graph tests.

use axum::http::StatusCode;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_follow_and_unfollow_update_both_sides() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    common::seed_profile(&state, "bob", "Bob").await;
    let token = common::session_token(&state, "alice");

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/users/bob/follow", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["uid"], "bob");
    assert_eq!(json["isFollowing"], true);

    // Following twice leaves a single edge
    app.clone()
        .oneshot(common::authed_request("POST", "/api/users/bob/follow", &token, None))
        .await
        .unwrap();

    let alice = state.store.get_profile("alice").await.unwrap().unwrap();
    let bob = state.store.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(alice.following, vec!["bob".to_string()]);
    assert_eq!(bob.followers, vec!["alice".to_string()]);

    let public = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/users/bob", &token, None))
        .await
        .unwrap();
    let json = common::body_json(public).await;
    assert_eq!(json["isFollowing"], true);
    assert_eq!(json["followersCount"], 1);
    assert_eq!(json["followingCount"], 0);

    let followers = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/users/bob/followers", &token, None))
        .await
        .unwrap();
    assert_eq!(common::body_json(followers).await["uids"], serde_json::json!(["alice"]));

    let response = app
        .clone()
        .oneshot(common::authed_request("DELETE", "/api/users/bob/follow", &token, None))
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await["isFollowing"], false);

    let following = app
        .oneshot(common::authed_request("GET", "/api/users/alice/following", &token, None))
        .await
        .unwrap();
    assert_eq!(common::body_json(following).await["uids"], serde_json::json!([]));

    let bob = state.store.get_profile("bob").await.unwrap().unwrap();
    assert!(bob.followers.is_empty());
}

#[tokio::test]
async fn test_follow_then_unfollow_restores_existing_edges() {
    let (app, state) = common::create_test_app();
    for (uid, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol"), ("dave", "Dave")] {
        common::seed_profile(&state, uid, name).await;
    }
    let alice_token = common::session_token(&state, "alice");
    let carol_token = common::session_token(&state, "carol");

    for (uri, token) in [
        ("/api/users/bob/follow", &carol_token),
        ("/api/users/dave/follow", &alice_token),
        ("/api/users/alice/follow", &carol_token),
    ] {
        let response = app
            .clone()
            .oneshot(common::authed_request("POST", uri, token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let alice_before = state.store.get_profile("alice").await.unwrap().unwrap();
    let bob_before = state.store.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(bob_before.followers, vec!["carol".to_string()]);
    assert_eq!(alice_before.following, vec!["dave".to_string()]);

    for method in ["POST", "DELETE"] {
        let response = app
            .clone()
            .oneshot(common::authed_request(method, "/api/users/bob/follow", &alice_token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let alice = state.store.get_profile("alice").await.unwrap().unwrap();
    let bob = state.store.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(alice.following, alice_before.following);
    assert_eq!(alice.followers, alice_before.followers);
    assert_eq!(bob.following, bob_before.following);
    assert_eq!(bob.followers, bob_before.followers);
}

#[tokio::test]
async fn test_cannot_follow_self() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    let token = common::session_token(&state, "alice");

    for method in ["POST", "DELETE"] {
        let response = app
            .clone()
            .oneshot(common::authed_request(method, "/api/users/alice/follow", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_follow_unknown_user() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    let token = common::session_token(&state, "alice");

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/users/ghost/follow", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::authed_request("GET", "/api/users/ghost", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let alice = state.store.get_profile("alice").await.unwrap().unwrap();
    assert!(alice.following.is_empty());
}

#[tokio::test]
async fn test_search() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "alice", "Alice").await;
    common::seed_profile(&state, "bob", "Bob Smith").await;
    common::seed_profile(&state, "bobby", "Bob").await;
    common::seed_profile(&state, "carol", "Carol").await;
    state
        .social
        .follow("alice", "bobby")
        .await
        .unwrap();
    let token = common::session_token(&state, "alice");

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/users/search?q=%20BOB%20", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = common::body_json(response).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    // Exact name match first
    assert_eq!(results[0]["uid"], "bobby");
    assert_eq!(results[0]["isFollowing"], true);
    assert_eq!(results[1]["uid"], "bob");
    assert_eq!(results[1]["isFollowing"], false);

    // The caller never appears in their own results
    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/users/search?q=alice", &token, None))
        .await
        .unwrap();
    assert!(common::body_json(response).await["results"]
        .as_array()
        .unwrap()
        .is_empty());

    let response = app
        .oneshot(common::authed_request("GET", "/api/users/search?q=", &token, None))
        .await
        .unwrap();
    assert!(common::body_json(response).await["results"]
        .as_array()
        .unwrap()
        .is_empty());
}
