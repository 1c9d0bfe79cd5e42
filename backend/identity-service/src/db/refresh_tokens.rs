/// Refresh token persistence
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::error::Result;
use crate::models::RefreshToken;

/// Narrow store interface the refresh token manager depends on
///
/// Implementations must make `revoke` a single atomic conditional update so
/// that a concurrent `find_by_token` sees the row either before or after
/// revocation, never in between.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Look up a record by exact token value
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Persist a newly issued record
    async fn insert(&self, token: &RefreshToken) -> Result<RefreshToken>;

    /// Set `revoked_at` if it is still unset
    ///
    /// Returns `true` if this call revoked the token, `false` if the token
    /// was already revoked or does not exist.
    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool>;
}

/// PostgreSQL-backed store over the `refresh_tokens` table
#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    #[instrument(skip_all)]
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[instrument(skip_all, fields(user_id = %token.user_id))]
    async fn insert(&self, token: &RefreshToken) -> Result<RefreshToken> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, revoked_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING token, user_id, expires_at, revoked_at, created_at
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    #[instrument(skip_all)]
    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2, updated_at = $2
            WHERE token = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token)
        .bind(revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
