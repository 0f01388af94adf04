// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - credential hashing and token issuance.

pub mod password;
pub mod tokens;

pub use password::{CredentialHasher, PasswordError};
pub use tokens::{Claims, TokenError, TokenIssuer, TokenUse};
