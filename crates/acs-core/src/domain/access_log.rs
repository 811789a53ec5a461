//! Access log entry domain entity
//!
//! One entry is produced for every access decision, allowed or denied.
//! Entries are immutable once created; the only lifecycle event is
//! retention-driven deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::{AccessDecision, ReasonCode};
use super::errors::DomainError;
use super::newtypes::{EmployeeId, LogId};

/// An audit record of one access decision
///
/// Badge and resource ids are kept as the raw requested strings because a
/// denied request may reference ids that do not resolve (or are empty, for
/// invalid requests). The employee id is present only if it was resolved
/// before the decision was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAccessLogEntry")]
pub struct AccessLogEntry {
    /// Assigned by the entity store when the entry is persisted
    id: Option<LogId>,
    timestamp: DateTime<Utc>,
    badge_id: String,
    employee_id: Option<EmployeeId>,
    resource_id: String,
    decision: AccessDecision,
    reason_code: ReasonCode,
}

impl AccessLogEntry {
    /// Creates a new, unpersisted log entry
    ///
    /// The decision is derived from the reason code, so an entry can never
    /// carry `ReasonCode::Allow` with a `Deny` decision or vice versa.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Utc;
    /// use acs_core::domain::{AccessDecision, AccessLogEntry, ReasonCode};
    ///
    /// let entry = AccessLogEntry::new(Utc::now(), "B1", None, "R1", ReasonCode::BadgeNotFound);
    /// assert_eq!(entry.decision(), AccessDecision::Deny);
    /// assert!(entry.id().is_none()); // ID assigned on persist
    /// ```
    pub fn new(
        timestamp: DateTime<Utc>,
        badge_id: impl Into<String>,
        employee_id: Option<EmployeeId>,
        resource_id: impl Into<String>,
        reason_code: ReasonCode,
    ) -> Self {
        Self {
            id: None,
            timestamp,
            badge_id: badge_id.into(),
            employee_id,
            resource_id: resource_id.into(),
            decision: reason_code.decision(),
            reason_code,
        }
    }

    /// Sets the ID for this entry (typically called after the store insert)
    pub fn with_id(mut self, id: LogId) -> Self {
        self.id = Some(id);
        self
    }

    /// Returns the entry ID (None if not yet persisted)
    pub fn id(&self) -> Option<LogId> {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn badge_id(&self) -> &str {
        &self.badge_id
    }

    pub fn employee_id(&self) -> Option<&EmployeeId> {
        self.employee_id.as_ref()
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn decision(&self) -> AccessDecision {
        self.decision
    }

    pub fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }

    /// Returns true if the entry is strictly older than `cutoff`
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.timestamp < cutoff
    }
}

/// Wire shape of an entry before the decision is checked against the reason
#[derive(Deserialize)]
struct RawAccessLogEntry {
    id: Option<LogId>,
    timestamp: DateTime<Utc>,
    badge_id: String,
    employee_id: Option<EmployeeId>,
    resource_id: String,
    decision: AccessDecision,
    reason_code: ReasonCode,
}

impl TryFrom<RawAccessLogEntry> for AccessLogEntry {
    type Error = DomainError;

    fn try_from(raw: RawAccessLogEntry) -> Result<Self, Self::Error> {
        if raw.decision != raw.reason_code.decision() {
            return Err(DomainError::ValidationFailed(format!(
                "decision {} contradicts reason code {}",
                raw.decision, raw.reason_code
            )));
        }
        Ok(Self {
            id: raw.id,
            timestamp: raw.timestamp,
            badge_id: raw.badge_id,
            employee_id: raw.employee_id,
            resource_id: raw.resource_id,
            decision: raw.decision,
            reason_code: raw.reason_code,
        })
    }
}
