//! Badge domain entity
//!
//! A badge is the credential presented at a resource. It is bound to at
//! most one employee at a time and is never physically deleted: lost or
//! revoked badges are soft-disabled through their status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{BadgeId, EmployeeId};

/// Lifecycle status of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeStatus {
    /// Badge may be used to request access
    Active,
    /// Badge was administratively disabled
    Disabled,
    /// Badge was reported lost
    Lost,
}

impl BadgeStatus {
    /// Returns the stored string form of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeStatus::Active => "ACTIVE",
            BadgeStatus::Disabled => "DISABLED",
            BadgeStatus::Lost => "LOST",
        }
    }

    /// Returns true if the badge may be used for access
    pub fn is_active(&self) -> bool {
        matches!(self, BadgeStatus::Active)
    }
}

impl fmt::Display for BadgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(BadgeStatus::Active),
            "DISABLED" => Ok(BadgeStatus::Disabled),
            "LOST" => Ok(BadgeStatus::Lost),
            _ => Err(DomainError::UnknownVariant {
                kind: "badge status",
                value: s.to_string(),
            }),
        }
    }
}

/// A credential record
///
/// `employee_id` is a back-reference only; the badge does not own the
/// employee. The admin layer keeps it consistent with `Employee::badge_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    id: BadgeId,
    status: BadgeStatus,
    employee_id: Option<EmployeeId>,
}

impl Badge {
    /// Creates a new, unbound badge with the given status
    pub fn new(id: BadgeId, status: BadgeStatus) -> Self {
        Self {
            id,
            status,
            employee_id: None,
        }
    }

    /// Binds the badge to an employee
    pub fn with_employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    /// Returns the badge ID
    pub fn id(&self) -> &BadgeId {
        &self.id
    }

    /// Returns the badge status
    pub fn status(&self) -> BadgeStatus {
        self.status
    }

    /// Returns the bound employee, if any
    pub fn employee_id(&self) -> Option<&EmployeeId> {
        self.employee_id.as_ref()
    }

    /// Updates the badge status
    pub fn set_status(&mut self, status: BadgeStatus) {
        self.status = status;
    }

    /// Binds or unbinds the badge
    pub fn set_employee(&mut self, employee_id: Option<EmployeeId>) {
        self.employee_id = employee_id;
    }
}
