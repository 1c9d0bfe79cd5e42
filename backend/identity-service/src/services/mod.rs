/// Service layer for identity-service
///
/// - Authentication flows (login, authenticate, refresh, revoke)
pub mod auth;

pub use auth::{AuthService, TokenPair};
