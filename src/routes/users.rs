// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User lookup routes (require authentication).

use super::within_deadline;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{UserPage, UserResponse, UserType};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// User routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(get_users))
        .route("/users/{user_id}", get(get_user))
}

const DEFAULT_RECORDS_PER_PAGE: u32 = 10;
const MAX_RECORDS_PER_PAGE: u32 = 100;

/// Raw listing parameters. Values that do not parse fall back to defaults
/// rather than rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(rename = "recordPerPage")]
    pub record_per_page: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "startIndex")]
    pub start_index: Option<String>,
}

/// Resolved offset/limit for one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u32,
    pub limit: u32,
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
}

impl ListUsersQuery {
    pub fn window(&self) -> PageWindow {
        let limit = positive(self.record_per_page.as_deref())
            .unwrap_or(DEFAULT_RECORDS_PER_PAGE)
            .min(MAX_RECORDS_PER_PAGE);
        let page = positive(self.page.as_deref()).unwrap_or(1);

        let start = self
            .start_index
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or_else(|| (page - 1).saturating_mul(limit));

        PageWindow { start, limit }
    }
}

/// List users (admin only).
async fn get_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<UserPage>> {
    caller.authorize_role(UserType::Admin)?;

    let window = params.window();
    tracing::debug!(
        start = window.start,
        limit = window.limit,
        "Listing users"
    );

    within_deadline(state.config.request_timeout, async {
        let (total_count, users) = state.db.list_page(window.start, window.limit).await?;
        Ok(Json(UserPage {
            total_count,
            user_items: users.into_iter().map(UserResponse::from).collect(),
        }))
    })
    .await
}

/// Get one user (the user themselves, or an admin).
async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    caller.authorize_self_or_admin(&user_id)?;

    within_deadline(state.config.request_timeout, async {
        let user = state
            .db
            .find_by_user_id(&user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        Ok(Json(UserResponse::from(user)))
    })
    .await
}
