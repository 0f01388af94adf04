// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Budget API Server
//!
//! Serves account signup/signin and user lookups for the budgeting frontend.

use budget_api::{
    config::{Config, StorageBackend},
    db::UserDb,
    services::{CredentialHasher, TokenIssuer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, storage = ?config.storage, "Starting Budget API");

    let db = match config.storage {
        StorageBackend::Firestore => UserDb::connect_firestore(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory user store; accounts are lost on restart");
            UserDb::new_in_memory()
        }
    };

    let hasher = CredentialHasher::new().expect("Invalid password hashing parameters");
    let tokens = TokenIssuer::from_config(&config);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        hasher,
        tokens,
    });

    // Build router
    let app = budget_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("budget_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
