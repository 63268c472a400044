//! Inbound bearer authentication against a single shared secret.

use http::HeaderMap;

use crate::error::RelayError;

/// Expected `Authorization` header value for `secret`.
pub fn expected_header(secret: &str) -> String {
    format!("Bearer {secret}")
}

/// Check a raw `Authorization` header value against the shared secret.
///
/// The whole header must match `Bearer <secret>` byte for byte: no trimming, no
/// case folding of the scheme.
pub fn verify_bearer(secret: &str, authorization: Option<&str>) -> Result<(), RelayError> {
    let Some(presented) = authorization else {
        return Err(RelayError::Unauthorized);
    };
    let expected = expected_header(secret);
    if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(RelayError::Unauthorized)
    }
}

/// Same as [`verify_bearer`], reading the header from a request header map.
/// A header that is not valid visible ASCII counts as absent.
pub fn verify_headers(secret: &str, headers: &HeaderMap) -> Result<(), RelayError> {
    let auth = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    verify_bearer(secret, auth)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
