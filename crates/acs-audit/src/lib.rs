//! ACS Audit - Access log recording and retention
//!
//! Provides:
//! - `AuditSink`: Persists one record per access decision and mirrors it
//!   into the local cache; applies the retention policy to both
//! - `LogQuery`: Filtered, time-bounded reads over the cached access log

pub mod query;
pub mod sink;

pub use query::{query_audit_log, LogFilter, LogQuery, QueryError};
pub use sink::{AuditError, AuditSink};
