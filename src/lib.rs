// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Budget API: account backend for the budgeting app.
//!
//! This crate provides user signup/signin with Argon2 password hashing and
//! JWT access/refresh tokens, plus admin and self-service user lookups,
//! backed by Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserDb;
use services::{CredentialHasher, TokenIssuer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: UserDb,
    pub hasher: CredentialHasher,
    pub tokens: TokenIssuer,
}
