// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Admin,
    User,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "ADMIN",
            UserType::User => "USER",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Generated identifier (also used as document ID)
    pub user_id: String,
    /// Normalized email address (unique)
    pub email: String,
    /// Display name
    pub name: String,
    pub user_type: UserType,
    /// Argon2 PHC string
    pub password: String,
    /// Current access token
    pub token: String,
    /// Current refresh token
    pub refresh_token: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Signup request body.
#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignUpRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 256))]
    pub password: String,
    pub user_type: UserType,
}

/// Signin request body.
#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignInRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Signup response. The key name is what the frontend reads.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignUpResponse {
    #[serde(rename = "InsertedID")]
    pub inserted_id: String,
}

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    /// Response for the account owner's own session (includes tokens).
    pub fn with_tokens(user: User) -> Self {
        let token = Some(user.token.clone());
        let refresh_token = Some(user.refresh_token.clone());
        Self {
            token,
            refresh_token,
            ..Self::from(user)
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            name: user.name,
            user_type: user.user_type,
            token: None,
            refresh_token: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// One page of the user listing.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserPage {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_count: u64,
    pub user_items: Vec<UserResponse>,
}

/// Canonical form used for storage and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generate a 24 hex character user ID: 4 bytes of big-endian Unix seconds
/// followed by 8 random bytes, so IDs sort roughly by creation time.
pub fn generate_user_id() -> anyhow::Result<String> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as u32;

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    SystemRandom::new()
        .fill(&mut bytes[4..])
        .map_err(|_| anyhow::anyhow!("System RNG failure"))?;

    Ok(hex::encode(bytes))
}
