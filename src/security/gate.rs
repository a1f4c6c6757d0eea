//! Ordered gate pipeline run in front of every render request.
//!
//! Stages run in a fixed order and the first failure ends the request:
//! rate limit, bearer auth, signature, plan. Only the rate limiter holds
//! mutable state; everything else is immutable after construction.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;

use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::security::auth::AuthGate;
use crate::security::plan::{PlanGate, PlanTier};
use crate::security::rate_limit::{RateDecision, RateLimiter};
use crate::security::signature::SignatureVerifier;

/// Derive the rate-limit key: first `X-Forwarded-For` hop, then the peer IP.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// The gate stage that produced a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RateLimit,
    Auth,
    Signature,
    Plan,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::RateLimit => "rate_limit",
            Stage::Auth => "auth",
            Stage::Signature => "signature",
            Stage::Plan => "plan",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the gates need to know about one request.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub identity: &'a str,
    pub token: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub body: &'a [u8],
    pub variant: &'a str,
    pub plan: Option<&'a str>,
}

/// A request that passed every stage.
#[derive(Debug, Clone, Copy)]
pub struct Admission {
    pub rate: RateDecision,
    pub plan: PlanTier,
}

/// A request stopped at `stage`.
#[derive(Debug)]
pub struct Denial {
    pub stage: Stage,
    pub error: ApiError,
}

pub struct Gatekeeper {
    rate_limiter: Arc<RateLimiter>,
    auth: AuthGate,
    signatures: SignatureVerifier,
    plans: PlanGate,
}

impl Gatekeeper {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        auth: AuthGate,
        signatures: SignatureVerifier,
        plans: PlanGate,
    ) -> Self {
        Self {
            rate_limiter,
            auth,
            signatures,
            plans,
        }
    }

    /// Build every stage from configuration.
    ///
    /// Secrets are expected to be filled in already. A missing token or
    /// signing secret becomes empty, and both stages reject anything
    /// presented against an empty value.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let credential = config.auth.api_token.clone().unwrap_or_default();
        let secret = config.signing.secret.clone().unwrap_or_default();
        Self::new(
            Arc::new(RateLimiter::new(&config.rate_limit)),
            AuthGate::new(credential),
            SignatureVerifier::new(secret.into_bytes(), &config.signing),
            PlanGate::new(&config.plans),
        )
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn plans(&self) -> &PlanGate {
        &self.plans
    }

    pub fn admit(&self, request: &GateRequest<'_>) -> Result<Admission, Denial> {
        let rate = self.rate_limiter.check(request.identity);
        if !rate.allowed {
            return Err(Denial {
                stage: Stage::RateLimit,
                error: ApiError::RateLimited {
                    retry_after: self.rate_limiter.window().as_secs(),
                    limit: rate.limit,
                },
            });
        }

        self.auth.check(request.token).map_err(|error| Denial {
            stage: Stage::Auth,
            error,
        })?;

        self.signatures
            .verify(request.signature, request.timestamp, request.body)
            .map_err(|error| Denial {
                stage: Stage::Signature,
                error,
            })?;

        let plan = self
            .plans
            .check(request.variant, request.plan)
            .into_result()
            .map_err(|error| Denial {
                stage: Stage::Plan,
                error,
            })?;

        Ok(Admission { rate, plan })
    }
}
