// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store.

use crate::error::AppError;
use crate::models::{TokenPair, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Users keyed by ID, plus an email index that doubles as the uniqueness
/// constraint.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
}

impl MemoryDb {
    pub fn count_by_email(&self, email: &str) -> u64 {
        self.emails.contains_key(email) as u64
    }

    pub fn insert_user(&self, user: &User) -> Result<String, AppError> {
        // The entry guard holds the shard lock, so the claim is atomic.
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::EmailTaken),
            Entry::Vacant(slot) => {
                self.users.insert(user.user_id.clone(), user.clone());
                slot.insert(user.user_id.clone());
                Ok(user.user_id.clone())
            }
        }
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let user_id = self.emails.get(email)?.value().clone();
        self.find_by_user_id(&user_id)
    }

    pub fn find_by_user_id(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|user| user.value().clone())
    }

    pub fn update_tokens(
        &self,
        user_id: &str,
        tokens: &TokenPair,
        updated_at: &str,
    ) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.token = tokens.token.clone();
        user.refresh_token = tokens.refresh_token.clone();
        user.updated_at = updated_at.to_string();
        Ok(())
    }

    /// Swap the pair only while the stored refresh token is `presented`.
    /// The shard write lock makes the compare and the swap one step.
    pub fn rotate_tokens(
        &self,
        user_id: &str,
        presented: &str,
        tokens: &TokenPair,
        updated_at: &str,
    ) -> Result<bool, AppError> {
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        if user.refresh_token != presented {
            return Ok(false);
        }
        user.token = tokens.token.clone();
        user.refresh_token = tokens.refresh_token.clone();
        user.updated_at = updated_at.to_string();
        Ok(true)
    }

    pub fn list_page(&self, start: u32, limit: u32) -> (u64, Vec<User>) {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        let total = users.len() as u64;
        let page = users
            .into_iter()
            .skip(start as usize)
            .take(limit as usize)
            .collect();
        (total, page)
    }
}
