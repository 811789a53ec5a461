//! Access requests, verdicts and reason codes
//!
//! The reason code is the machine-readable explanation of a verdict. The
//! decision and the human message are both derived from it, so the three
//! can never disagree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Outcome of an access request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessDecision {
    Allow,
    Deny,
}

impl AccessDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessDecision::Allow => "ALLOW",
            AccessDecision::Deny => "DENY",
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessDecision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(AccessDecision::Allow),
            "DENY" => Ok(AccessDecision::Deny),
            _ => Err(DomainError::UnknownVariant {
                kind: "access decision",
                value: s.to_string(),
            }),
        }
    }
}

/// Closed set of reasons explaining a verdict
///
/// Variants are listed in evaluation order: when several preconditions
/// fail at once, the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Request is missing a badge id, resource id or timestamp
    InvalidRequest,
    /// No badge with the presented id
    BadgeNotFound,
    /// Badge exists but is disabled or lost
    BadgeInactive,
    /// Badge is unbound, or its employee record is missing
    EmployeeNotFound,
    /// No resource with the requested id
    ResourceNotFound,
    /// Resource is locked
    ResourceLocked,
    /// Resource is occupied or offline
    ResourceOccupied,
    /// None of the employee's groups grants the resource
    NoPermission,
    /// Internal fault during evaluation or auditing
    SystemError,
    /// Access granted
    Allow,
}

impl ReasonCode {
    /// All reason codes, in evaluation order
    pub const ALL: [ReasonCode; 10] = [
        ReasonCode::InvalidRequest,
        ReasonCode::BadgeNotFound,
        ReasonCode::BadgeInactive,
        ReasonCode::EmployeeNotFound,
        ReasonCode::ResourceNotFound,
        ReasonCode::ResourceLocked,
        ReasonCode::ResourceOccupied,
        ReasonCode::NoPermission,
        ReasonCode::SystemError,
        ReasonCode::Allow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::InvalidRequest => "INVALID_REQUEST",
            ReasonCode::BadgeNotFound => "BADGE_NOT_FOUND",
            ReasonCode::BadgeInactive => "BADGE_INACTIVE",
            ReasonCode::EmployeeNotFound => "EMPLOYEE_NOT_FOUND",
            ReasonCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ReasonCode::ResourceLocked => "RESOURCE_LOCKED",
            ReasonCode::ResourceOccupied => "RESOURCE_OCCUPIED",
            ReasonCode::NoPermission => "NO_PERMISSION",
            ReasonCode::SystemError => "SYSTEM_ERROR",
            ReasonCode::Allow => "ALLOW",
        }
    }

    /// The decision implied by this reason
    ///
    /// `Allow` is the only code that implies `AccessDecision::Allow`.
    pub fn decision(&self) -> AccessDecision {
        match self {
            ReasonCode::Allow => AccessDecision::Allow,
            _ => AccessDecision::Deny,
        }
    }

    /// Short human-readable message for display
    pub fn message(&self) -> &'static str {
        match self {
            ReasonCode::InvalidRequest => "Invalid request: missing or empty parameters",
            ReasonCode::BadgeNotFound => "Badge not found",
            ReasonCode::BadgeInactive => "Badge is not active (disabled or lost)",
            ReasonCode::EmployeeNotFound => "No employee is bound to this badge",
            ReasonCode::ResourceNotFound => "Resource not found",
            ReasonCode::ResourceLocked => "Resource is locked",
            ReasonCode::ResourceOccupied => "Resource is unavailable (occupied or offline)",
            ReasonCode::NoPermission => "No group grants access to this resource",
            ReasonCode::SystemError => "Internal system error",
            ReasonCode::Allow => "Access granted",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReasonCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownVariant {
                kind: "reason code",
                value: s.to_string(),
            })
    }
}

/// An access request as received from the request-handling layer
///
/// Fields are raw, unvalidated input; validation is the first step of
/// evaluation and failures are reported as `ReasonCode::InvalidRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub badge_id: String,
    pub resource_id: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl AccessRequest {
    pub fn new(
        badge_id: impl Into<String>,
        resource_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            badge_id: badge_id.into(),
            resource_id: resource_id.into(),
            timestamp: Some(timestamp),
        }
    }
}

/// Verdict returned for every access request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAccessResult")]
pub struct AccessResult {
    decision: AccessDecision,
    reason_code: ReasonCode,
    message: String,
}

impl AccessResult {
    /// Builds the result for a reason code with its canonical message
    pub fn from_reason(reason_code: ReasonCode) -> Self {
        Self {
            decision: reason_code.decision(),
            reason_code,
            message: reason_code.message().to_string(),
        }
    }

    /// Builds a `SystemError` result carrying a fault description
    pub fn system_error(detail: impl fmt::Display) -> Self {
        Self {
            decision: AccessDecision::Deny,
            reason_code: ReasonCode::SystemError,
            message: format!("{}: {}", ReasonCode::SystemError.message(), detail),
        }
    }

    pub fn decision(&self) -> AccessDecision {
        self.decision
    }

    pub fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_allowed(&self) -> bool {
        self.decision.is_allow()
    }
}

/// Wire shape of a result before its fields are checked against each other
#[derive(Deserialize)]
struct RawAccessResult {
    decision: AccessDecision,
    reason_code: ReasonCode,
    message: String,
}

impl TryFrom<RawAccessResult> for AccessResult {
    type Error = DomainError;

    fn try_from(raw: RawAccessResult) -> Result<Self, Self::Error> {
        if raw.decision != raw.reason_code.decision() {
            return Err(DomainError::ValidationFailed(format!(
                "decision {} contradicts reason code {}",
                raw.decision, raw.reason_code
            )));
        }
        // SystemError appends the fault detail to its canonical message
        let consistent = match raw.reason_code {
            ReasonCode::SystemError => raw.message.starts_with(raw.reason_code.message()),
            code => raw.message == code.message(),
        };
        if !consistent {
            return Err(DomainError::ValidationFailed(format!(
                "message '{}' does not match reason code {}",
                raw.message, raw.reason_code
            )));
        }
        Ok(Self {
            decision: raw.decision,
            reason_code: raw.reason_code,
            message: raw.message,
        })
    }
}
