/// Data models for identity and authentication
pub mod refresh_token;

pub use refresh_token::RefreshToken;

/// Principal identifier, assigned by the user store
pub type UserId = uuid::Uuid;
