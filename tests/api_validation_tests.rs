// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request body validation tests.
//!
//! Each rejected request runs against the offline store: a 400 (rather than
//! the store's 500) shows the handler stopped at the first error instead of
//! carrying on to storage.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;

async fn signup_status(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let (app, _) = common::create_offline_app();
    let response = app
        .oneshot(common::post_json("/users/signup", body))
        .await
        .unwrap();
    let status = response.status();
    (status, common::read_json(response).await)
}

#[tokio::test]
async fn test_signup_malformed_json() {
    let (app, _) = common::create_offline_app();
    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/users/signup")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_missing_field() {
    let (status, body) = signup_status(json!({
        "email": "ada@example.com",
        "password": "secret123",
        "user_type": "USER"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_signup_invalid_email() {
    let (status, body) = signup_status(json!({
        "name": "Ada",
        "email": "not-an-email",
        "password": "secret123",
        "user_type": "USER"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_signup_short_password() {
    let (status, body) = signup_status(json!({
        "name": "Ada",
        "email": "ada@example.com",
        "password": "12345",
        "user_type": "USER"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn test_signup_unknown_user_type() {
    let (status, _) = signup_status(json!({
        "name": "Ada",
        "email": "ada@example.com",
        "password": "secret123",
        "user_type": "SUPERUSER"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_missing_password() {
    let (app, _) = common::create_offline_app();
    let response = app
        .oneshot(common::post_json(
            "/users/login",
            json!({ "email": "ada@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_valid_signup_reaches_storage() {
    let (status, body) = signup_status(json!({
        "name": "Ada",
        "email": "ada@example.com",
        "password": "secret123",
        "user_type": "USER"
    }))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
}
