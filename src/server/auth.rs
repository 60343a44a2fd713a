//! Bearer authentication for the cron endpoints.
//!
//! Both sides are hashed with SHA-256 before comparison so the constant-time
//! compare always runs over equal-length digests.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Extract the token from `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Timing-safe comparison of two byte strings.
pub fn timing_safe_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Check the request against the configured secret.
///
/// With no secret configured every request is allowed.
pub fn authorize(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    extract_bearer_token(headers)
        .is_some_and(|token| timing_safe_equal(&digest(token), &digest(secret)))
}

/// Short, non-reversible identifier for a secret, safe to log.
pub fn fingerprint(secret: &str) -> String {
    hex::encode(&digest(secret)[..6])
}
