// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use budget_api::config::Config;
use budget_api::db::UserDb;
use budget_api::models::{User, UserType};
use budget_api::routes::create_router;
use budget_api::services::{CredentialHasher, TokenIssuer};
use budget_api::time_utils::now_rfc3339;
use budget_api::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db() -> UserDb {
    UserDb::connect_firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Password used for every seeded account.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct-horse";

fn build_app(db: UserDb) -> (axum::Router, Arc<AppState>) {
    build_app_with_config(db, Config::default())
}

fn build_app_with_config(db: UserDb, config: Config) -> (axum::Router, Arc<AppState>) {
    let tokens = TokenIssuer::from_config(&config);
    // Cheap parameters keep the suite fast; production cost is covered by unit tests.
    let hasher = CredentialHasher::with_cost(1024, 1).expect("valid test hash params");

    let state = Arc::new(AppState {
        config,
        db,
        hasher,
        tokens,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    build_app(UserDb::new_in_memory())
}

/// Create a test app whose database fails every call.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    build_app(UserDb::new_offline())
}

/// Create a test app whose database never answers, with the given request budget.
#[allow(dead_code)]
pub fn create_stalled_app(request_timeout: Duration) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        request_timeout,
        ..Config::default()
    };
    build_app_with_config(UserDb::new_stalled(), config)
}

/// Insert a user directly into the store and return it.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, email: &str, user_type: UserType) -> User {
    let user_id = budget_api::models::user::generate_user_id().unwrap();
    let tokens = state
        .tokens
        .issue(email, "Seeded User", user_type, &user_id)
        .unwrap();
    let now = now_rfc3339();

    let user = User {
        user_id,
        email: email.to_string(),
        name: "Seeded User".to_string(),
        user_type,
        password: state.hasher.hash(TEST_PASSWORD).unwrap(),
        token: tokens.token,
        refresh_token: tokens.refresh_token,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.insert_user(&user).await.unwrap();
    user
}

/// Access token for an arbitrary caller identity.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user_id: &str, user_type: UserType) -> String {
    state
        .tokens
        .issue("caller@example.com", "Caller", user_type, user_id)
        .unwrap()
        .token
}

#[allow(dead_code)]
pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("token", token)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
