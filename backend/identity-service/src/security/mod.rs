/// Security module for authentication
///
/// Provides the credential primitives for the identity layer:
/// - Password hashing and verification (Argon2id)
/// - Session token minting and validation (HS256 JWT)
/// - Refresh token issue, check and revocation
/// - `Authorization` header credential extraction
pub mod credentials;
pub mod jwt;
pub mod password;
pub mod refresh_token;

pub use credentials::{bearer_token, extract_credential, verify_api_key};
pub use jwt::{generate_session_token, validate_session_token, Claims};
pub use password::{hash_password, verify_password};
pub use refresh_token::{generate_refresh_token, RefreshTokenManager};
