//! Access log queries
//!
//! Queries run against the cache's log buffer, so they see exactly the
//! entries that survived the last purge, in timestamp order.

use acs_cache::LocalEntityCache;
use acs_core::domain::{newtypes::EmployeeId, AccessLogEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which entries a query selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LogFilter {
    /// Every entry
    All,
    /// Entries for a presented badge id
    Badge(String),
    /// Entries whose decision resolved this employee
    Employee(EmployeeId),
    /// Entries for a requested resource id
    Resource(String),
    /// Denied entries only
    Denied,
}

impl LogFilter {
    pub fn matches(&self, entry: &AccessLogEntry) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Badge(id) => entry.badge_id() == id,
            LogFilter::Employee(id) => entry.employee_id() == Some(id),
            LogFilter::Resource(id) => entry.resource_id() == id,
            LogFilter::Denied => !entry.decision().is_allow(),
        }
    }
}

/// Rejected query parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid time range: from {from} is after to {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

/// A filtered, time-bounded access log query
///
/// Both bounds are inclusive; a missing bound leaves that side open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    pub filter: LogFilter,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl LogQuery {
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            from: None,
            to: None,
        }
    }

    /// Restricts the query to `[from, to]`
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Checks the range before the query is run on behalf of a caller
    ///
    /// [`query_audit_log`] itself does not validate; an inverted range
    /// simply matches nothing.
    pub fn validate(&self) -> Result<(), QueryError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(QueryError::InvalidRange { from, to }),
            _ => Ok(()),
        }
    }

    fn in_range(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }

    pub fn matches(&self, entry: &AccessLogEntry) -> bool {
        self.in_range(entry.timestamp()) && self.filter.matches(entry)
    }
}

/// Returns the cached entries selected by `query`, oldest first
pub fn query_audit_log(cache: &LocalEntityCache, query: &LogQuery) -> Vec<AccessLogEntry> {
    cache
        .list_logs()
        .into_iter()
        .filter(|entry| query.matches(entry))
        .collect()
}
