/// Authentication flows over the credential primitives
///
/// Composes password verification, session tokens and refresh tokens into
/// the login, authenticate, refresh and revoke flows. HTTP status mapping is
/// left to the caller.
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{JwtSettings, RefreshTokenSettings, Settings};
use crate::db::RefreshTokenStore;
use crate::error::{IdentityError, Result};
use crate::models::UserId;
use crate::security::credentials::bearer_token;
use crate::security::{jwt, password, RefreshTokenManager};

/// Token pair returned on login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication service
pub struct AuthService<S: RefreshTokenStore> {
    jwt: JwtSettings,
    refresh_tokens: RefreshTokenManager<S>,
}

impl<S: RefreshTokenStore> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self {
            jwt: self.jwt.clone(),
            refresh_tokens: self.refresh_tokens.clone(),
        }
    }
}

impl<S: RefreshTokenStore> AuthService<S> {
    pub fn new(store: Arc<S>, jwt: JwtSettings, refresh: &RefreshTokenSettings) -> Self {
        Self {
            jwt,
            refresh_tokens: RefreshTokenManager::new(store, refresh),
        }
    }

    pub fn from_settings(store: Arc<S>, settings: &Settings) -> Self {
        Self::new(store, settings.jwt.clone(), &settings.refresh)
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenManager<S> {
        &self.refresh_tokens
    }

    /// Verify a password and issue a session token plus a persisted refresh token
    ///
    /// `stored_hash` is the user's PasswordHash as loaded by the caller.
    pub async fn login(
        &self,
        user_id: UserId,
        password: &str,
        stored_hash: &str,
    ) -> Result<TokenPair> {
        password::verify_password(password, stored_hash).map_err(|e| {
            if matches!(e, IdentityError::Malformed(_)) {
                warn!(user_id = %user_id, "Stored password hash is unreadable");
            }
            e
        })?;

        let token = jwt::generate_session_token(user_id, &self.jwt.secret, self.jwt.ttl()?)?;
        let refresh = self.refresh_tokens.create(user_id).await?;

        info!(user_id = %user_id, "User logged in");

        Ok(TokenPair {
            token,
            refresh_token: refresh.token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiry_seconds,
        })
    }

    /// Resolve the user behind `Authorization: Bearer <session token>`
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<UserId> {
        let token = bearer_token(headers)?;
        jwt::validate_session_token(token, &self.jwt.secret)
    }

    /// Exchange `Authorization: Bearer <refresh token>` for a new session token
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String> {
        let token = bearer_token(headers)?;
        self.refresh_tokens
            .refresh_session(token, &self.jwt.secret, self.jwt.ttl()?)
            .await
    }

    /// Revoke the refresh token in `Authorization: Bearer <refresh token>`
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<()> {
        let token = bearer_token(headers)?;
        self.refresh_tokens.revoke(token).await
    }

    /// Produce a replacement PasswordHash for a password change
    pub fn rehash_password(&self, new_password: &str) -> Result<String> {
        password::hash_password(new_password)
    }
}
