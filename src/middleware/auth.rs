// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware and caller authorization checks.

use crate::error::AppError;
use crate::models::UserType;
use crate::services::{Claims, TokenUse};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Legacy header the frontend sends the access token in.
pub const TOKEN_HEADER: &str = "token";

/// Authenticated caller extracted from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub user_type: UserType,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.uid,
            email: claims.email,
            name: claims.name,
            user_type: claims.user_type,
        }
    }
}

impl AuthUser {
    /// Require the caller to hold exactly `required`.
    pub fn authorize_role(&self, required: UserType) -> Result<(), AppError> {
        if self.user_type != required {
            tracing::warn!(
                user_id = %self.user_id,
                user_type = %self.user_type,
                required = %required,
                "Role check failed"
            );
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// Admins may access any user; everyone else only themselves.
    pub fn authorize_self_or_admin(&self, target_user_id: &str) -> Result<(), AppError> {
        match self.user_type {
            UserType::Admin => Ok(()),
            UserType::User if self.user_id == target_user_id => Ok(()),
            UserType::User => {
                tracing::warn!(
                    user_id = %self.user_id,
                    target = %target_user_id,
                    "Ownership check failed"
                );
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try the token header first, then Authorization: Bearer
    let headers = request.headers();
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.decode(&token, TokenUse::Access)?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
