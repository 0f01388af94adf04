// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: signup, signin and token refresh.
//!
//! Each handler is a straight pipeline; the first failing step produces the
//! one and only response.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use std::sync::Arc;
use validator::Validate;

use super::within_deadline;
use crate::error::{AppError, Result};
use crate::models::user::{generate_user_id, normalize_email};
use crate::models::{
    RefreshRequest, SignInRequest, SignUpRequest, SignUpResponse, TokenPair, User, UserResponse,
};
use crate::services::TokenUse;
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/signup", post(sign_up))
        .route("/users/login", post(sign_in))
        .route("/users/refresh", post(refresh))
}

/// Register a new account and issue its first token pair.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SignUpResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let budget = state.config.request_timeout;
    within_deadline(budget, async move {
        let email = normalize_email(&request.email);

        // Fast path; the insert below is what actually enforces uniqueness.
        if state.db.count_by_email(&email).await? > 0 {
            return Err(AppError::EmailTaken);
        }

        let password = state.hasher.hash_blocking(request.password).await?;

        let user_id = generate_user_id()?;
        let tokens = state
            .tokens
            .issue(&email, &request.name, request.user_type, &user_id)?;
        let now = now_rfc3339();

        let user = User {
            user_id,
            email,
            name: request.name,
            user_type: request.user_type,
            password,
            token: tokens.token,
            refresh_token: tokens.refresh_token,
            created_at: now.clone(),
            updated_at: now,
        };

        let inserted_id = state.db.insert_user(&user).await?;
        tracing::info!(user_id = %inserted_id, user_type = %user.user_type, "User signed up");

        Ok(Json(SignUpResponse { inserted_id }))
    })
    .await
}

/// Check credentials, rotate the token pair, and return the account.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let budget = state.config.request_timeout;
    within_deadline(budget, async move {
        let email = normalize_email(&request.email);

        let found = state.db.find_by_email(&email).await?;

        // An unknown email still pays for one verify, so the two failures
        // take the same time.
        let stored_hash = match &found {
            Some(user) => user.password.clone(),
            None => state.hasher.decoy_hash().to_string(),
        };
        let password_ok = state
            .hasher
            .verify_blocking(request.password, stored_hash)
            .await?;

        let found = match found {
            Some(user) if password_ok => user,
            Some(user) => {
                tracing::info!(user_id = %user.user_id, "Sign-in rejected: bad password");
                return Err(AppError::InvalidCredentials);
            }
            None => return Err(AppError::InvalidCredentials),
        };

        let tokens = state
            .tokens
            .issue(&found.email, &found.name, found.user_type, &found.user_id)?;
        state
            .db
            .update_tokens(&found.user_id, &tokens, &now_rfc3339())
            .await?;

        let user = state
            .db
            .find_by_user_id(&found.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", found.user_id)))?;

        tracing::info!(user_id = %user.user_id, "User signed in");
        Ok(Json(UserResponse::with_tokens(user)))
    })
    .await
}

/// Exchange the current refresh token for a new pair.
///
/// Only the most recently issued refresh token is accepted; older ones were
/// superseded when the pair was last rotated. The swap is conditional on the
/// stored token, so a token can be redeemed once.
async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>> {
    let Json(request) = payload?;
    let claims = state
        .tokens
        .decode(&request.refresh_token, TokenUse::Refresh)?;

    let budget = state.config.request_timeout;
    within_deadline(budget, async move {
        let user = state
            .db
            .find_by_user_id(&claims.uid)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.refresh_token != request.refresh_token {
            tracing::warn!(user_id = %user.user_id, "Superseded refresh token presented");
            return Err(AppError::InvalidToken);
        }

        let tokens = state
            .tokens
            .issue(&user.email, &user.name, user.user_type, &user.user_id)?;
        let rotated = state
            .db
            .rotate_tokens(
                &user.user_id,
                &request.refresh_token,
                &tokens,
                &now_rfc3339(),
            )
            .await?;
        if !rotated {
            tracing::warn!(user_id = %user.user_id, "Refresh token rotated concurrently");
            return Err(AppError::InvalidToken);
        }

        tracing::debug!(user_id = %user.user_id, "Token pair refreshed");
        Ok(Json(tokens))
    })
    .await
}
