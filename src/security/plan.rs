//! Plan tiers and per-variant feature requirements.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::PlanConfig;
use crate::error::ApiError;

/// Header carrying the caller's plan name.
pub const PLAN_HEADER: &str = "x-user-plan";

/// Subscription tier. Ordering follows the ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free = 0,
    Pro = 1,
    Business = 2,
    Enterprise = 3,
}

impl PlanTier {
    /// All tiers, lowest first.
    pub const ORDER: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Pro,
        PlanTier::Business,
        PlanTier::Enterprise,
    ];

    /// Requirement applied to variants missing from the table.
    pub const UNKNOWN_VARIANT: PlanTier = PlanTier::Business;

    /// Strict lookup by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Caller-supplied plan; anything unrecognized is the lowest tier.
    pub fn from_caller(name: Option<&str>) -> Self {
        name.and_then(Self::from_name).unwrap_or(PlanTier::Free)
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Business => "business",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a plan check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDecision {
    pub allowed: bool,
    pub required: PlanTier,
    pub caller: PlanTier,
}

impl PlanDecision {
    pub fn into_result(self) -> Result<PlanTier, ApiError> {
        if self.allowed {
            Ok(self.caller)
        } else {
            Err(ApiError::PlanRequired {
                required: self.required,
                current: self.caller,
            })
        }
    }
}

/// Immutable variant → minimum tier table.
#[derive(Debug, Clone)]
pub struct PlanGate {
    requirements: HashMap<String, PlanTier>,
}

impl PlanGate {
    /// Build from configuration. Names were validated at load time; any that
    /// slip through are treated as the unknown-variant requirement.
    pub fn new(config: &PlanConfig) -> Self {
        let requirements = config
            .requirements
            .iter()
            .map(|(variant, plan)| {
                let tier = PlanTier::from_name(plan).unwrap_or(PlanTier::UNKNOWN_VARIANT);
                (variant.to_ascii_lowercase(), tier)
            })
            .collect();
        Self { requirements }
    }

    pub fn required_for(&self, variant: &str) -> PlanTier {
        self.requirements
            .get(&variant.to_ascii_lowercase())
            .copied()
            .unwrap_or(PlanTier::UNKNOWN_VARIANT)
    }

    pub fn check(&self, variant: &str, caller_plan: Option<&str>) -> PlanDecision {
        let required = self.required_for(variant);
        let caller = PlanTier::from_caller(caller_plan);
        PlanDecision {
            allowed: caller.ordinal() >= required.ordinal(),
            required,
            caller,
        }
    }
}
