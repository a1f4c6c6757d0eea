//! Bearer-token authentication against the shared credential.

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::error::ApiError;

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Any other scheme, or an empty token, counts as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Static-credential gate.
pub struct AuthGate {
    credential: String,
}

impl AuthGate {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
        }
    }

    pub fn check(&self, provided: Option<&str>) -> Result<(), ApiError> {
        let provided = provided.ok_or(ApiError::Unauthorized)?;
        let matches = bool::from(provided.as_bytes().ct_eq(self.credential.as_bytes()));
        if matches && !self.credential.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
