/// Session token minting and validation
///
/// Session tokens are compact JWTs signed with HS256 using a shared
/// symmetric secret. The secret is passed on every call rather than held
/// in global state; see `config::JwtSettings`.
///
/// Session tokens cannot be revoked. They stay valid for their whole stated
/// lifetime, so keep the TTL short next to the refresh token lifetime.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IdentityError, Result};
use crate::models::UserId;

// ============================================================================
// Constants
// ============================================================================

/// Issuer written into every session token
pub const ISSUER: &str = "chirpy";

pub const SESSION_TOKEN_EXPIRY_HOURS: i64 = 1;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT registered claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    fn new(user_id: UserId, expires_in: Duration) -> Result<Self> {
        let now = Utc::now();
        let expiry = now.checked_add_signed(expires_in).ok_or_else(|| {
            IdentityError::Internal(format!("Session token lifetime out of range: {expires_in}"))
        })?;

        Ok(Self {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        })
    }
}

// ============================================================================
// Token Generation
// ============================================================================

/// Mint a session token for `user_id`
///
/// `expires_in` may be negative, which yields a token that is already
/// expired. `secret` may be empty; such a token only validates against the
/// empty secret. A lifetime that overflows the calendar is `Internal`.
pub fn generate_session_token(
    user_id: UserId,
    secret: &str,
    expires_in: Duration,
) -> Result<String> {
    let claims = Claims::new(user_id, expires_in)?;
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(JWT_ALGORITHM), &claims, &encoding_key).map_err(|e| {
        tracing::error!("Failed to generate session token: {}", e);
        IdentityError::Internal(format!("Failed to generate session token: {}", e))
    })
}

// ============================================================================
// Token Validation
// ============================================================================

fn validation() -> Validation {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

/// Verify the signature and expiry of `token` and return its claims
///
/// The signature is checked before any claim, so a token signed with a
/// different secret is `Unauthenticated` even when it has also expired.
///
/// ## Errors
///
/// - `Unauthenticated` - signature does not match `secret`
/// - `Malformed` - token structure or claims cannot be parsed
/// - `Expired` - `exp` has passed
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let token_data = decode::<Claims>(token, &decoding_key, &validation()).map_err(|e| {
        tracing::debug!("Session token validation failed: {}", e);
        IdentityError::from(e)
    })?;

    Ok(token_data.claims)
}

/// Validate a session token and return the subject's user ID
///
/// Validation is purely cryptographic; it does not check that the user
/// still exists.
pub fn validate_session_token(token: &str, secret: &str) -> Result<UserId> {
    let claims = decode_claims(token, secret)?;

    Uuid::parse_str(&claims.sub)
        .map_err(|e| IdentityError::Malformed(format!("Invalid user ID format in token: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
