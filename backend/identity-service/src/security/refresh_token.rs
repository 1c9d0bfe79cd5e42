/// Refresh Token Management
///
/// Refresh tokens are opaque 256-bit random values, hex-encoded, persisted
/// through a [`RefreshTokenStore`] and checked against the stored record on
/// every use.
///
/// ## Lifecycle
///
/// - Issued at login with a 60-day expiry
/// - Revoked at most once; revoking again is a no-op success
/// - Expires by time comparison only, with no stored state change
/// - Never rotated on refresh: the same value stays usable until it
///   expires or is revoked
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::RefreshTokenSettings;
use crate::db::RefreshTokenStore;
use crate::error::{IdentityError, Result};
use crate::models::refresh_token::token_prefix;
use crate::models::{RefreshToken, UserId};
use crate::security::jwt;

pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 60;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a 64-character lowercase hex token from the OS random source
///
/// ## Errors
///
/// Returns `IdentityError::Internal` if the random source fails.
pub fn generate_refresh_token() -> Result<String> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| IdentityError::Internal(format!("Random source failed: {}", e)))?;

    Ok(hex::encode(bytes))
}

/// Issues, checks and revokes refresh tokens against a store
pub struct RefreshTokenManager<S: RefreshTokenStore> {
    store: Arc<S>,
    settings: RefreshTokenSettings,
}

impl<S: RefreshTokenStore> Clone for RefreshTokenManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
        }
    }
}

impl<S: RefreshTokenStore> RefreshTokenManager<S> {
    pub fn new(store: Arc<S>, settings: &RefreshTokenSettings) -> Self {
        Self {
            store,
            settings: settings.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build a fresh, unpersisted record for `owner`
    ///
    /// A configured lifetime that overflows the calendar is `Internal`.
    pub fn issue(&self, owner: UserId) -> Result<RefreshToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.settings.ttl()?)
            .ok_or_else(|| {
                IdentityError::Internal(format!(
                    "Refresh token lifetime out of range: {} days",
                    self.settings.expiry_days
                ))
            })?;

        Ok(RefreshToken {
            token: generate_refresh_token()?,
            user_id: owner,
            expires_at,
            revoked_at: None,
            created_at: now,
        })
    }

    /// Issue a record for `owner` and persist it
    #[instrument(skip(self))]
    pub async fn create(&self, owner: UserId) -> Result<RefreshToken> {
        let token = self.issue(owner)?;
        let stored = self.store.insert(&token).await?;

        info!(
            user_id = %owner,
            expires_at = %stored.expires_at,
            "Refresh token issued"
        );
        Ok(stored)
    }

    /// Check a refresh token and return its owner
    ///
    /// Checks run in order: `NotFound`, then `Expired`, then `Revoked`.
    /// The token is not rotated or extended.
    #[instrument(skip_all, fields(token = %token_prefix(token)))]
    pub async fn refresh(&self, token: &str) -> Result<UserId> {
        let record = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(IdentityError::NotFound)?;

        if record.is_expired_at(Utc::now()) {
            debug!(user_id = %record.user_id, "Refresh token expired");
            return Err(IdentityError::Expired);
        }

        if record.is_revoked() {
            warn!(user_id = %record.user_id, "Revoked refresh token presented");
            return Err(IdentityError::Revoked);
        }

        Ok(record.user_id)
    }

    /// Check a refresh token and mint a new session token for its owner
    pub async fn refresh_session(
        &self,
        token: &str,
        secret: &str,
        session_ttl: Duration,
    ) -> Result<String> {
        let user_id = self.refresh(token).await?;
        jwt::generate_session_token(user_id, secret, session_ttl)
    }

    /// Revoke a refresh token
    ///
    /// Revoking an already revoked token succeeds without changing it.
    #[instrument(skip_all, fields(token = %token_prefix(token)))]
    pub async fn revoke(&self, token: &str) -> Result<()> {
        let record = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(IdentityError::NotFound)?;

        if record.is_revoked() {
            debug!(user_id = %record.user_id, "Refresh token already revoked");
            return Ok(());
        }

        // A concurrent revoke may win the conditional update; that is still success.
        if self.store.revoke(token, Utc::now()).await? {
            info!(user_id = %record.user_id, "Refresh token revoked");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRefreshTokenStore;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn manager() -> RefreshTokenManager<InMemoryRefreshTokenStore> {
        RefreshTokenManager::new(
            Arc::new(InMemoryRefreshTokenStore::new()),
            &RefreshTokenSettings::default(),
        )
    }

    #[test]
    fn test_generated_token_format() {
        let token = generate_refresh_token().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let tokens: HashSet<String> = (0..10_000)
            .map(|_| generate_refresh_token().unwrap())
            .collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn test_issue_sets_sixty_day_expiry() {
        let owner = Uuid::new_v4();
        let token = manager().issue(owner).unwrap();

        assert_eq!(token.user_id, owner);
        assert_eq!(token.expires_at - token.created_at, Duration::days(60));
        assert!(token.revoked_at.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_internal() {
        for expiry_days in [100_000_000, i64::MAX] {
            let manager = RefreshTokenManager::new(
                Arc::new(InMemoryRefreshTokenStore::new()),
                &RefreshTokenSettings { expiry_days },
            );

            assert!(matches!(
                manager.issue(Uuid::new_v4()),
                Err(IdentityError::Internal(_))
            ));
            assert!(matches!(
                manager.create(Uuid::new_v4()).await,
                Err(IdentityError::Internal(_))
            ));
            assert!(manager.store().is_empty());
        }
    }

    #[tokio::test]
    async fn test_refresh_then_revoke() {
        let manager = manager();
        let owner = Uuid::new_v4();
        let token = manager.create(owner).await.unwrap();

        assert_eq!(manager.refresh(&token.token).await.unwrap(), owner);

        manager.revoke(&token.token).await.unwrap();
        assert!(matches!(
            manager.refresh(&token.token).await,
            Err(IdentityError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_refresh_does_not_rotate() {
        let manager = manager();
        let token = manager.create(Uuid::new_v4()).await.unwrap();

        manager.refresh(&token.token).await.unwrap();
        manager.refresh(&token.token).await.unwrap();

        let stored = manager
            .store()
            .find_by_token(&token.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, token);
        assert_eq!(manager.store().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let manager = manager();
        assert!(matches!(
            manager.refresh("deadbeef").await,
            Err(IdentityError::NotFound)
        ));
        assert!(matches!(
            manager.revoke("deadbeef").await,
            Err(IdentityError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let manager = manager();
        let mut token = manager.issue(Uuid::new_v4()).unwrap();
        token.expires_at = Utc::now() - Duration::hours(1);
        manager.store().insert(&token).await.unwrap();

        assert!(matches!(
            manager.refresh(&token.token).await,
            Err(IdentityError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_expired_checked_before_revoked() {
        let manager = manager();
        let mut token = manager.issue(Uuid::new_v4()).unwrap();
        token.expires_at = Utc::now() - Duration::hours(1);
        token.revoked_at = Some(Utc::now() - Duration::hours(2));
        manager.store().insert(&token).await.unwrap();

        assert!(matches!(
            manager.refresh(&token.token).await,
            Err(IdentityError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_double_revoke_is_idempotent() {
        let manager = manager();
        let token = manager.create(Uuid::new_v4()).await.unwrap();

        manager.revoke(&token.token).await.unwrap();
        let first = manager
            .store()
            .find_by_token(&token.token)
            .await
            .unwrap()
            .unwrap()
            .revoked_at;

        manager.revoke(&token.token).await.unwrap();
        let second = manager
            .store()
            .find_by_token(&token.token)
            .await
            .unwrap()
            .unwrap()
            .revoked_at;

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_refresh_session_mints_token_for_owner() {
        let manager = manager();
        let owner = Uuid::new_v4();
        let token = manager.create(owner).await.unwrap();

        let session = manager
            .refresh_session(&token.token, "secret", Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(jwt::validate_session_token(&session, "secret").unwrap(), owner);
    }

    #[tokio::test]
    async fn test_concurrent_revokes_all_succeed() {
        let manager = manager();
        let token = manager.create(Uuid::new_v4()).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                let value = token.token.clone();
                tokio::spawn(async move { manager.revoke(&value).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(matches!(
            manager.refresh(&token.token).await,
            Err(IdentityError::Revoked)
        ));
    }
}
