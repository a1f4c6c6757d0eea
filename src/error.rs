//! Request-level error taxonomy.
//!
//! Every gate stage and handler reports failures as an [`ApiError`]. The
//! error maps to a machine-readable code and an HTTP status through
//! [`ErrorKind`], and renders itself as the JSON error body.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::security::plan::PlanTier;

/// Machine-readable error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    RateLimited,
    StaleRequest,
    BadRequest,
    ValidationError,
    PlanRequired,
    NotFound,
    InternalError,
}

impl ErrorKind {
    /// The `code` field of the error body.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::StaleRequest => "STALE_REQUEST",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::PlanRequired => "PLAN_REQUIRED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthorized | ErrorKind::StaleRequest => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::PlanRequired => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors surfaced to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token was supplied.
    #[error("Authorization required")]
    Unauthorized,

    /// Token supplied but does not match the configured credential.
    #[error("Invalid credentials")]
    Forbidden,

    /// Request signature did not match the expected HMAC.
    #[error("Request signature mismatch")]
    IntegrityFailure,

    /// Signing is mandatory and the request carried no signature.
    #[error("Request signature required")]
    SignatureRequired,

    /// Sliding-window limit reached for this client.
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64, limit: u32 },

    /// Signed timestamp is outside the freshness window.
    #[error("Request timestamp is {skew_secs}s away from server time")]
    StaleRequest { skew_secs: u64 },

    /// Malformed request data (timestamp, filename, JSON body).
    #[error("{0}")]
    BadRequest(String),

    /// A parameter failed its allow-list check.
    #[error("{0}")]
    Validation(String),

    /// Caller's plan is below the variant's requirement.
    #[error("Plan '{required}' required, caller has '{current}'")]
    PlanRequired { required: PlanTier, current: PlanTier },

    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure; the detail is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized | ApiError::SignatureRequired => ErrorKind::Unauthorized,
            ApiError::Forbidden | ApiError::IntegrityFailure => ErrorKind::Forbidden,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::StaleRequest { .. } => ErrorKind::StaleRequest,
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::Validation(_) => ErrorKind::ValidationError,
            ApiError::PlanRequired { .. } => ErrorKind::PlanRequired,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    fn body(&self) -> serde_json::Value {
        let kind = self.kind();
        let message = match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let mut body = json!({
            "status": "error",
            "code": kind.code(),
            "message": message,
        });

        match self {
            ApiError::RateLimited { retry_after, limit } => {
                body["retry_after"] = json!(retry_after);
                body["limit"] = json!(limit);
                body["remaining"] = json!(0);
            }
            ApiError::PlanRequired { required, current } => {
                body["required_plan"] = json!(required.as_str());
                body["current_plan"] = json!(current.as_str());
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal error while handling request");
        }

        let mut response = (self.kind().status(), Json(self.body())).into_response();
        if let ApiError::RateLimited { retry_after, limit } = &self {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
            headers.insert("x-ratelimit-limit", HeaderValue::from(*limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_is_withheld() {
        let err = ApiError::Internal("disk on fire at /var/qr".into());
        let body = err.body();
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn plan_required_carries_tiers() {
        let err = ApiError::PlanRequired {
            required: PlanTier::Pro,
            current: PlanTier::Free,
        };
        let body = err.body();
        assert_eq!(body["code"], "PLAN_REQUIRED");
        assert_eq!(body["required_plan"], "pro");
        assert_eq!(body["current_plan"], "free");
    }

    #[test]
    fn rate_limited_sets_headers() {
        let response = ApiError::RateLimited { retry_after: 60, limit: 30 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    }

    #[test]
    fn signature_mismatch_is_forbidden() {
        assert_eq!(ApiError::IntegrityFailure.kind(), ErrorKind::Forbidden);
        assert_eq!(ApiError::IntegrityFailure.kind().status(), StatusCode::FORBIDDEN);
    }
}
