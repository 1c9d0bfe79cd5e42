/// In-memory refresh token store
///
/// Backed by a `DashMap`; each conditional revoke holds the entry's shard
/// lock for the duration of the update, which gives the same either-or
/// ordering as the row update in PostgreSQL.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::refresh_tokens::RefreshTokenStore;
use crate::error::{IdentityError, Result};
use crate::models::RefreshToken;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Arc<DashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        Ok(self.tokens.get(token).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, token: &RefreshToken) -> Result<RefreshToken> {
        match self.tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(IdentityError::Internal(
                "duplicate refresh token value".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(token.clone())
            }
        }
    }

    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool> {
        match self.tokens.get_mut(token) {
            Some(mut entry) if entry.revoked_at.is_none() => {
                entry.revoked_at = Some(revoked_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
