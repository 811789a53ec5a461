//! AuditSink - durable access log with retention
//!
//! Every write goes to the entity store first; the local cache is updated
//! only once the store has accepted the record. Purges remove the same
//! range from both, under one cutoff.

use std::sync::Arc;

use acs_cache::LocalEntityCache;
use acs_core::{
    config::DEFAULT_RETENTION_DAYS, domain::AccessLogEntry, ports::IEntityStore,
};
use chrono::{DateTime, Duration, Utc};

use crate::query::{query_audit_log, LogQuery};

/// Errors raised while persisting or purging access log records
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to persist access log record: {0}")]
    Persist(anyhow::Error),

    #[error("Failed to purge access log records: {0}")]
    Purge(anyhow::Error),
}

/// Records access decisions and enforces log retention.
///
/// `record` calls run concurrently with each other. A purge waits for
/// in-flight records to finish and holds new ones back until both the
/// store and the cache have been trimmed, so the two always agree on
/// which entries are below the cutoff.
pub struct AuditSink {
    store: Arc<dyn IEntityStore>,
    cache: Arc<LocalEntityCache>,
    retention: Duration,
    purge_gate: tokio::sync::RwLock<()>,
}

impl AuditSink {
    /// Creates a sink with the default 7-day retention window
    pub fn new(store: Arc<dyn IEntityStore>, cache: Arc<LocalEntityCache>) -> Self {
        Self {
            store,
            cache,
            retention: Duration::days(i64::from(DEFAULT_RETENTION_DAYS)),
            purge_gate: tokio::sync::RwLock::new(()),
        }
    }

    /// Overrides the retention window used by [`purge_expired`](Self::purge_expired)
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Persists `entry` and mirrors it into the cache.
    ///
    /// Returns the entry carrying its store-assigned id. If the store
    /// rejects the write the cache is left untouched.
    pub async fn record(&self, entry: AccessLogEntry) -> Result<AccessLogEntry, AuditError> {
        let _gate = self.purge_gate.read().await;

        let id = match self.store.append_audit_record(&entry).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    badge_id = entry.badge_id(),
                    resource_id = entry.resource_id(),
                    reason = %entry.reason_code(),
                    "Failed to persist access log record"
                );
                return Err(AuditError::Persist(e));
            }
        };

        let persisted = entry.with_id(id);
        self.cache.append_log(persisted.clone()).await;

        tracing::trace!(log_id = %id, reason = %persisted.reason_code(), "Recorded access decision");
        Ok(persisted)
    }

    /// Deletes every record with `timestamp < cutoff` from the store, then
    /// expires the same range from the cache.
    ///
    /// Returns the number of records the store removed. Calling it again
    /// with the same cutoff returns zero.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditError> {
        let _gate = self.purge_gate.write().await;

        let deleted = self
            .store
            .delete_audit_records_older_than(cutoff)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, %cutoff, "Access log purge failed");
                AuditError::Purge(e)
            })?;

        let expired = self.cache.expire_logs_older_than(cutoff).await;
        if expired as u64 != deleted {
            tracing::debug!(deleted, expired, "Cache and store purge counts differ");
        }

        tracing::info!(%cutoff, deleted, "Purged access log");
        Ok(deleted)
    }

    /// Applies the configured retention window relative to `now`
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuditError> {
        self.purge_older_than(now - self.retention).await
    }

    /// Filtered read over the cached access log
    pub fn query(&self, query: &LogQuery) -> Vec<AccessLogEntry> {
        query_audit_log(&self.cache, query)
    }
}
