use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use evently::{app::build_app, state::AppState, store::MemoryStore};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{login, send, signup};

#[tokio::test]
async fn signup_login_and_wrong_password() {
    let state = AppState::fake();
    let keys = state.keys.clone();
    let app = build_app(state);

    let (status, body) = signup(&app, "alice", "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.com");
    let token = body["token"].as_str().expect("token present");
    let signup_user = keys.verify(token).expect("token verifies").user_id;

    let (status, body) = login(&app, "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.com");
    let token = body["token"].as_str().expect("token present");
    assert_eq!(keys.verify(token).unwrap().user_id, signup_user);

    let (status, body) = login(&app, "a@x.com", "wrong").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid credentials" }));
}

#[tokio::test]
async fn unknown_email_is_indistinguishable_from_wrong_password() {
    let app = build_app(AppState::fake());
    signup(&app, "alice", "a@x.com", "secret1").await;

    let wrong_password = login(&app, "a@x.com", "nope").await;
    let unknown_email = login(&app, "ghost@x.com", "secret1").await;
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(AppState::fake_with_store(store.clone()));

    let (status, _) = signup(&app, "alice", "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = signup(&app, "other", "a@x.com", "secret2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email already registered" }));
    assert_eq!(store.count_by_email("a@x.com").await, 1);
}

#[tokio::test]
async fn missing_fields_are_400_without_writes() {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(AppState::fake_with_store(store.clone()));

    let (status, body) = signup(&app, "", "", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Please fill all fields" }));

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "email": "a@x.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.user_count().await, 0);

    let (status, body) = login(&app, "", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_reported_as_json_error() {
    let app = build_app(AppState::fake());
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_and_events_are_public() {
    let app = build_app(AppState::fake());

    let (status, body) = send(&app, "GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Events route is working!");

    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
