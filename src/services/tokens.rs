// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access and refresh token issuance (HS256 JWT).

use crate::config::Config;
use crate::error::AppError;
use crate::models::{TokenPair, UserType};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Distinguishes the two halves of a token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub email: String,
    pub name: String,
    /// User ID
    pub uid: String,
    pub user_type: UserType,
    pub token_use: TokenUse,
    /// Unique token ID, so two pairs minted in the same second still differ
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("Expected {expected:?} token")]
    WrongUse { expected: TokenUse },

    #[error("System clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("System RNG failure")]
    Random,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) | TokenError::WrongUse { .. } => AppError::InvalidToken,
            TokenError::Signing(_) | TokenError::Clock(_) | TokenError::Random => {
                AppError::Internal(err.into())
            }
        }
    }
}

/// Mints and verifies the token pair carried by a signed-in user.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    rng: SystemRandom,
}

impl TokenIssuer {
    pub fn new(signing_key: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            access_ttl,
            refresh_ttl,
            rng: SystemRandom::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_signing_key,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Issue a fresh access/refresh pair embedding the user's identity and role.
    pub fn issue(
        &self,
        email: &str,
        name: &str,
        user_type: UserType,
        user_id: &str,
    ) -> Result<TokenPair, TokenError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

        let claims = |token_use: TokenUse, ttl: Duration| -> Result<Claims, TokenError> {
            Ok(Claims {
                email: email.to_string(),
                name: name.to_string(),
                uid: user_id.to_string(),
                user_type,
                token_use,
                jti: self.token_id()?,
                iat: now,
                exp: now + ttl.as_secs() as usize,
            })
        };

        Ok(TokenPair {
            token: self.sign(&claims(TokenUse::Access, self.access_ttl)?)?,
            refresh_token: self.sign(&claims(TokenUse::Refresh, self.refresh_ttl)?)?,
        })
    }

    /// Verify a token's signature and expiry and check what it is for.
    pub fn decode(&self, token: &str, expected: TokenUse) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(TokenError::Invalid)?;

        if data.claims.token_use != expected {
            return Err(TokenError::WrongUse { expected });
        }
        Ok(data.claims)
    }

    fn token_id(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; 12];
        self.rng.fill(&mut bytes).map_err(|_| TokenError::Random)?;
        Ok(hex::encode(bytes))
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }
}
