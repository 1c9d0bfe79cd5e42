//! Credential extraction from the `Authorization` header
//!
//! Header values have the shape `<scheme> <credential>`. Both bearer tokens
//! (session and refresh) and the static service API key share one parsing
//! routine, parameterized by the expected scheme.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use tracing::debug;

use crate::config::ApiKeySettings;
use crate::error::{IdentityError, Result};

/// Scheme for session and refresh tokens
pub const BEARER_SCHEME: &str = "Bearer";

/// Default scheme for the service API key
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Split `header_value` into scheme and credential and return the credential
///
/// The value is split on single ASCII spaces and must yield exactly two
/// parts, so credentials containing spaces are not supported. The scheme
/// comparison is case-sensitive. The credential is returned verbatim.
///
/// ## Errors
///
/// - `NotPresent` - header missing or empty
/// - `Malformed` - wrong number of parts or unexpected scheme
pub fn extract_credential<'a>(
    header_value: Option<&'a str>,
    expected_scheme: &str,
) -> Result<&'a str> {
    let value = match header_value {
        Some(value) if !value.is_empty() => value,
        _ => {
            return Err(IdentityError::NotPresent(format!(
                "no {} credentials supplied",
                expected_scheme
            )))
        }
    };

    let parts: Vec<&str> = value.split(' ').collect();
    let [scheme, credential] = parts.as_slice() else {
        return Err(IdentityError::Malformed(format!(
            "expected '{} <credential>', got {} space-separated parts",
            expected_scheme,
            parts.len()
        )));
    };

    if *scheme != expected_scheme {
        return Err(IdentityError::Malformed(format!(
            "expected {} scheme",
            expected_scheme
        )));
    }

    Ok(*credential)
}

/// Read the `Authorization` header with `scheme` and return the credential
pub fn authorization_credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str> {
    let header_value = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str())
        .transpose()
        .map_err(|e| IdentityError::Malformed(format!("Invalid authorization header: {}", e)))?;

    extract_credential(header_value, scheme)
}

/// Bearer token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    authorization_credential(headers, BEARER_SCHEME)
}

/// API key from `Authorization: <scheme> <key>`
pub fn api_key<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str> {
    authorization_credential(headers, scheme)
}

/// Check the request's API key against the configured static key
///
/// The key is not a per-user credential; a mismatch is `Unauthenticated`.
pub fn verify_api_key(headers: &HeaderMap, settings: &ApiKeySettings) -> Result<()> {
    let presented = api_key(headers, &settings.scheme)?;

    if !constant_time_compare(presented.as_bytes(), settings.key.as_bytes()) {
        debug!("API key mismatch");
        return Err(IdentityError::Unauthenticated);
    }

    Ok(())
}

/// Byte comparison whose running time does not depend on where inputs differ
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
