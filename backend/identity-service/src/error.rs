use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Failure kinds shared by every credential operation.
///
/// Callers branch on the variant; the attached strings are diagnostics and
/// are not meant to be shown to end users.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Input could not be parsed (header shape, hash encoding, token claims)
    #[error("Malformed credential: {0}")]
    Malformed(String),

    /// The expected credential was not supplied at all
    #[error("Credential not present: {0}")]
    NotPresent(String),

    /// Signature, password or API key mismatch
    #[error("Invalid credentials")]
    Unauthenticated,

    #[error("Token expired")]
    Expired,

    #[error("Token revoked")]
    Revoked,

    #[error("Token not found")]
    NotFound,

    /// Random source or store failure unrelated to the caller's input
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// True when the system, not the presented credential, is at fault
    pub fn is_internal(&self) -> bool {
        matches!(self, IdentityError::Internal(_))
    }

    pub fn is_client_error(&self) -> bool {
        !self.is_internal()
    }
}

// Conversions from external error types
impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        IdentityError::Internal(format!("database: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::InvalidSignature
            | JwtErrorKind::InvalidAlgorithm
            | JwtErrorKind::ImmatureSignature
            | JwtErrorKind::InvalidIssuer
            | JwtErrorKind::InvalidAudience
            | JwtErrorKind::InvalidSubject => IdentityError::Unauthenticated,
            JwtErrorKind::ExpiredSignature => IdentityError::Expired,
            JwtErrorKind::InvalidToken
            | JwtErrorKind::InvalidAlgorithmName
            | JwtErrorKind::MissingAlgorithm
            | JwtErrorKind::MissingRequiredClaim(_)
            | JwtErrorKind::Base64(_)
            | JwtErrorKind::Json(_)
            | JwtErrorKind::Utf8(_) => IdentityError::Malformed(err.to_string()),
            _ => {
                tracing::error!("JWT error: {}", err);
                IdentityError::Internal(format!("jwt: {}", err))
            }
        }
    }
}
