// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing with Argon2id.
//!
//! Hashing is deliberately slow, so the async entry points move the work
//! onto Tokio's blocking pool instead of stalling a runtime worker.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Memory cost in KiB for production hashes.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const LANES: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<PasswordError> for crate::error::AppError {
    fn from(err: PasswordError) -> Self {
        crate::error::AppError::Internal(err.into())
    }
}

/// Salted one-way hasher with a fixed work factor.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Hash with the same parameters as real ones, verified against when
    /// no account matches so both signin failures cost one Argon2 run.
    decoy: Arc<str>,
}

impl CredentialHasher {
    /// Hasher with production cost parameters.
    pub fn new() -> Result<Self, PasswordError> {
        Self::with_cost(MEMORY_COST_KIB, ITERATIONS)
    }

    /// Hasher with explicit cost parameters. Tests use a low cost.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, LANES, None)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let decoy = argon2
            .hash_password(b"decoy", &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();
        Ok(Self {
            argon2,
            decoy: decoy.into(),
        })
    }

    /// Stored-hash stand-in for an unknown account.
    pub fn decoy_hash(&self) -> &str {
        &self.decoy
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check a candidate password against a stored PHC string.
    ///
    /// Returns `false` on mismatch and on a malformed stored hash.
    pub fn verify(&self, candidate: &str, hashed: &str) -> bool {
        match PasswordHash::new(hashed) {
            Ok(parsed) => self
                .argon2
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// [`verify`](Self::verify) on the blocking thread pool.
    pub async fn verify_blocking(
        &self,
        candidate: String,
        hashed: String,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&candidate, &hashed)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn test_verify_matches_own_hash() {
        let hasher = fast_hasher();
        for password in ["hunter22", "", "pässwörd with spaces", "🔒🔒🔒🔒🔒🔒"] {
            let hashed = hasher.hash(password).unwrap();
            assert!(hasher.verify(password, &hashed), "failed for {password:?}");
        }
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hasher = fast_hasher();
        let hashed = hasher.hash("correct horse").unwrap();
        assert!(!hasher.verify("correct hors", &hashed));
        assert!(!hasher.verify("Correct horse", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash("same password").unwrap();
        let b = hasher.hash("same password").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn test_decoy_hash_matches_real_cost() {
        let hasher = fast_hasher();
        let real = hasher.hash("whatever").unwrap();
        let decoy = PasswordHash::new(hasher.decoy_hash()).unwrap();
        let real = PasswordHash::new(&real).unwrap();

        assert_eq!(decoy.algorithm, real.algorithm);
        assert_eq!(decoy.params, real.params);
        assert!(!hasher.verify("whatever", hasher.decoy_hash()));
        assert!(!hasher.verify("", hasher.decoy_hash()));
    }

    #[test]
    fn test_production_params_are_valid() {
        assert!(CredentialHasher::new().is_ok());
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hasher = fast_hasher();
        let hashed = hasher.hash_blocking("s3cret!".to_string()).await.unwrap();
        assert!(hasher
            .verify_blocking("s3cret!".to_string(), hashed.clone())
            .await
            .unwrap());
        assert!(!hasher
            .verify_blocking("s3cret?".to_string(), hashed)
            .await
            .unwrap());
    }
}
