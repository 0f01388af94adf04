// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User listing tests.
//!
//! These tests verify that:
//! 1. Only admins can list users, and rejected callers never reach storage
//! 2. Pagination parameters default and slice correctly
//! 3. An empty collection lists cleanly

use axum::http::StatusCode;
use budget_api::models::{UserPage, UserType};
use tower::ServiceExt;

mod common;

async fn seed_five(state: &budget_api::AppState) {
    for i in 0..5 {
        common::seed_user(state, &format!("user{i}@example.com"), UserType::User).await;
    }
}

async fn list(app: axum::Router, token: &str, query: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(common::get_with_token(&format!("/users{query}"), token))
        .await
        .unwrap();
    let status = response.status();
    (status, common::read_json(response).await)
}

#[tokio::test]
async fn test_first_page() {
    let (app, state) = common::create_test_app();
    seed_five(&state).await;
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (status, body) = list(app, &token, "?recordPerPage=2&page=1").await;
    assert_eq!(status, StatusCode::OK);

    let page: UserPage = serde_json::from_value(body).unwrap();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.user_items.len(), 2);
}

#[tokio::test]
async fn test_last_partial_page() {
    let (app, state) = common::create_test_app();
    seed_five(&state).await;
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (status, body) = list(app, &token, "?recordPerPage=2&page=3").await;
    assert_eq!(status, StatusCode::OK);

    let page: UserPage = serde_json::from_value(body).unwrap();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.user_items.len(), 1);
}

#[tokio::test]
async fn test_pages_do_not_overlap() {
    let (app, state) = common::create_test_app();
    seed_five(&state).await;
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let mut seen = Vec::new();
    for page in 1..=3 {
        let (_, body) = list(
            app.clone(),
            &token,
            &format!("?recordPerPage=2&page={page}"),
        )
        .await;
        let page: UserPage = serde_json::from_value(body).unwrap();
        seen.extend(page.user_items.into_iter().map(|u| u.user_id));
    }

    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(seen.len(), 5);
    assert_eq!(unique.len(), 5);
}

#[tokio::test]
async fn test_explicit_start_index() {
    let (app, state) = common::create_test_app();
    seed_five(&state).await;
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (_, body) = list(app, &token, "?recordPerPage=10&page=1&startIndex=3").await;
    let page: UserPage = serde_json::from_value(body).unwrap();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.user_items.len(), 2);
}

#[tokio::test]
async fn test_invalid_params_use_defaults() {
    let (app, state) = common::create_test_app();
    seed_five(&state).await;
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (status, body) = list(app, &token, "?recordPerPage=abc&page=0").await;
    assert_eq!(status, StatusCode::OK);
    let page: UserPage = serde_json::from_value(body).unwrap();
    assert_eq!(page.user_items.len(), 5);
}

#[tokio::test]
async fn test_listing_hides_credentials() {
    let (app, state) = common::create_test_app();
    seed_five(&state).await;
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (_, body) = list(app, &token, "").await;
    for item in body["user_items"].as_array().unwrap() {
        assert!(item.get("password").is_none());
        assert!(item.get("token").is_none());
        assert!(item.get("refresh_token").is_none());
    }
}

#[tokio::test]
async fn test_empty_collection() {
    let (app, state) = common::create_test_app();
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (status, body) = list(app, &token, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["user_items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_non_admin_rejected_without_query() {
    // The offline store fails every call with a 500, so a 400 here proves the
    // role check ran before any storage access.
    let (app, state) = common::create_offline_app();
    let token = common::token_for(&state, "user-id", UserType::User);

    let (status, body) = list(app, &token, "?recordPerPage=2&page=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_admin_on_offline_store_reaches_storage() {
    let (app, state) = common::create_offline_app();
    let token = common::token_for(&state, "admin-id", UserType::Admin);

    let (status, body) = list(app, &token, "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
}
