/// Chirpy Identity Library
///
/// Credential and session-token handling for the Chirpy HTTP service.
///
/// ## Modules
///
/// - `config`: Process-wide settings
/// - `db`: Refresh token store interface and implementations
/// - `error`: Error types
/// - `models`: Data models
/// - `security`: Password hashing, session tokens, refresh tokens, header parsing
/// - `services`: Login, authenticate, refresh and revoke flows
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;

// Re-export commonly used types
pub use error::{IdentityError, Result};
pub use services::{AuthService, TokenPair};
