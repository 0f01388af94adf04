// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Users live in `users/{user_id}`. Email uniqueness is enforced by a
//! claim document in `user_emails/{sha256(email)}`, written in the same
//! transaction as the user with an exists=false precondition. Firestore
//! rejects the commit when the claim already exists, so two concurrent
//! signups for one address cannot both succeed.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{TokenPair, User};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreWritePrecondition};
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};

/// Document ID of the claim for `email`.
///
/// Emails may contain `/` or look like reserved `__name__` IDs, so the
/// address is never used as a document ID directly.
fn email_claim_id(email: &str) -> String {
    hex::encode(digest(&SHA256, email.as_bytes()))
}

/// Claim document stored under the normalized email.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaim {
    user_id: String,
    claimed_at: String,
}

/// Partial update written on signin and refresh.
#[derive(Debug, Serialize, Deserialize)]
struct TokenUpdate {
    token: String,
    refresh_token: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct CountAggregate {
    total_count: u64,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Lookups ─────────────────────────────────────────────────

    /// 1 if the email is claimed, else 0.
    pub async fn count_by_email(&self, email: &str) -> Result<u64, AppError> {
        let claim: Option<EmailClaim> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&email_claim_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(claim.is_some() as u64)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let mut users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.pop())
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Writes ──────────────────────────────────────────────────

    /// Write the email claim and the user document in one transaction.
    pub async fn insert_user(&self, user: &User) -> Result<String, AppError> {
        let claim = EmailClaim {
            user_id: user.user_id.clone(),
            claimed_at: user.created_at.clone(),
        };

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::USER_EMAILS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(email_claim_id(&user.email))
            .object(&claim)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add email claim to transaction: {}", e))
            })?;

        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&user.user_id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        match transaction.commit().await {
            Ok(_) => Ok(user.user_id.clone()),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::info!(user_id = %user.user_id, "Signup rejected: email already claimed");
                Err(AppError::EmailTaken)
            }
            Err(e) => Err(AppError::Database(format!(
                "Failed to commit user insert: {}",
                e
            ))),
        }
    }

    /// Overwrite only the token fields and `updated_at`.
    pub async fn update_tokens(
        &self,
        user_id: &str,
        tokens: &TokenPair,
        updated_at: &str,
    ) -> Result<(), AppError> {
        let update = TokenUpdate {
            token: tokens.token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            updated_at: updated_at.to_string(),
        };

        let _: () = self
            .client
            .fluent()
            .update()
            .fields(["token", "refresh_token", "updated_at"])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Replace the token pair only if the stored refresh token is still
    /// `presented`. Returns `false` when it was already rotated.
    pub async fn rotate_tokens(
        &self,
        user_id: &str,
        presented: &str,
        tokens: &TokenPair,
        updated_at: &str,
    ) -> Result<bool, AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reading through the transaction registers the document for
        // conflict detection.
        let current: Option<User> = self
            .client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ))
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read user in transaction: {}", e)))?;

        if !current.is_some_and(|user| user.refresh_token == presented) {
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        let update = TokenUpdate {
            token: tokens.token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            updated_at: updated_at.to_string(),
        };
        self.client
            .fluent()
            .update()
            .fields(["token", "refresh_token", "updated_at"])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&update)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add token update to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit token rotation: {}", e)))?;
        Ok(true)
    }

    // ─── Listing ─────────────────────────────────────────────────

    /// Page of users ordered by ID using Firestore offset/limit, with the
    /// total from a count aggregation.
    pub async fn list_page(&self, start: u32, limit: u32) -> Result<(u64, Vec<User>), AppError> {
        let counts: Vec<CountAggregate> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .aggregate(|a| a.fields([a.field("total_count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let total = counts.first().map(|c| c.total_count).unwrap_or(0);

        if u64::from(start) >= total {
            return Ok((total, Vec::new()));
        }

        // TODO: offset still bills a read per skipped document; switch the
        // listing to start_at cursors once the frontend pages by cursor.
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("user_id", firestore::FirestoreQueryDirection::Ascending)])
            .offset(start)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((total, users))
    }
}
