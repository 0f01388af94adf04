// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the user repository.
//!
//! [`UserDb`] fronts one of three backends:
//! - Firestore, used in production and against the emulator
//! - an in-process store for local development and handler tests
//! - offline, where every call fails (proves a path never touches storage)
//! - stalled, where every call hangs (exercises the request budget)

pub mod firestore;
pub mod memory;

use crate::error::AppError;
use crate::models::{TokenPair, User};
use std::sync::Arc;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email claims (document ID is the SHA-256 of the normalized email)
    /// enforcing uniqueness.
    pub const USER_EMAILS: &str = "user_emails";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(Arc<MemoryDb>),
    Offline,
    Stalled,
}

/// User repository handle. Cheap to clone; safe for concurrent use.
#[derive(Clone)]
pub struct UserDb {
    backend: Backend,
}

impl UserDb {
    /// Connect to Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    pub async fn connect_firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreDb::new(project_id).await?),
        })
    }

    /// Empty in-process store.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryDb::default())),
        }
    }

    /// Offline handle for testing: all database operations return an error.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Handle for testing whose database calls never complete.
    pub fn new_stalled() -> Self {
        Self {
            backend: Backend::Stalled,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    /// Number of accounts registered under `email` (0 or 1).
    pub async fn count_by_email(&self, email: &str) -> Result<u64, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.count_by_email(email).await,
            Backend::Memory(db) => Ok(db.count_by_email(email)),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }

    /// Insert a new user, claiming its email.
    ///
    /// Returns the inserted ID, or [`AppError::EmailTaken`] if another account
    /// already holds the email (including one inserted concurrently).
    pub async fn insert_user(&self, user: &User) -> Result<String, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.insert_user(user).await,
            Backend::Memory(db) => db.insert_user(user),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.find_by_email(email).await,
            Backend::Memory(db) => Ok(db.find_by_email(email)),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.find_by_user_id(user_id).await,
            Backend::Memory(db) => Ok(db.find_by_user_id(user_id)),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }

    /// Replace the stored token pair for a user.
    pub async fn update_tokens(
        &self,
        user_id: &str,
        tokens: &TokenPair,
        updated_at: &str,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.update_tokens(user_id, tokens, updated_at).await,
            Backend::Memory(db) => db.update_tokens(user_id, tokens, updated_at),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }

    /// Replace the stored token pair only if the stored refresh token is
    /// still `presented`.
    ///
    /// Returns `false` when the user is gone or the token was already
    /// rotated, so of two concurrent refreshes with one token only one wins.
    pub async fn rotate_tokens(
        &self,
        user_id: &str,
        presented: &str,
        tokens: &TokenPair,
        updated_at: &str,
    ) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(db) => {
                db.rotate_tokens(user_id, presented, tokens, updated_at)
                    .await
            }
            Backend::Memory(db) => db.rotate_tokens(user_id, presented, tokens, updated_at),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }

    /// One page of users ordered by ID, plus the total user count.
    pub async fn list_page(&self, start: u32, limit: u32) -> Result<(u64, Vec<User>), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_page(start, limit).await,
            Backend::Memory(db) => Ok(db.list_page(start, limit)),
            Backend::Offline => Err(Self::offline()),
            Backend::Stalled => std::future::pending().await,
        }
    }
}
