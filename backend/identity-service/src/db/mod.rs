/// Database operations for identity service
pub mod memory;
pub mod refresh_tokens;

use crate::error::{IdentityError, Result};
use sqlx::PgPool;

// Re-export commonly used types
pub use memory::InMemoryRefreshTokenStore;
pub use refresh_tokens::{PgRefreshTokenStore, RefreshTokenStore};

/// Apply the schema in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| IdentityError::Internal(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database migrations completed");
    Ok(())
}
