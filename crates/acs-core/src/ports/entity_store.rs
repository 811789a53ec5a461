//! Entity store port (driven/secondary port)
//!
//! This module defines the interface to the durable source of truth for
//! every entity the access control core reads, plus the append-only
//! access log.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, in-memory, etc.) and don't need domain-level classification.
//! - Write operations take references to domain entities, allowing the
//!   caller to retain ownership and mirror the same value into the cache.
//! - A successful return means the write is durable; callers update the
//!   in-memory cache only after that.

use chrono::{DateTime, Utc};

use crate::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, LogId, ResourceId},
    AccessLogEntry, Badge, Employee, Group, Resource,
};

/// Port trait for durable entity storage
///
/// ## Implementation Notes
///
/// - `save_*` operations are upserts keyed by the entity id.
/// - `delete_*` operations are idempotent; deleting an unknown id succeeds.
/// - `append_audit_record` ignores any id already on the entry and returns
///   a freshly assigned, monotonically increasing id.
/// - `load_all_audit_records` returns entries ordered by timestamp
///   (oldest first), ties broken by id.
#[async_trait::async_trait]
pub trait IEntityStore: Send + Sync {
    // --- Badge operations ---

    /// Loads every badge
    async fn load_all_badges(&self) -> anyhow::Result<Vec<Badge>>;

    /// Retrieves a badge by its ID
    async fn get_badge(&self, id: &BadgeId) -> anyhow::Result<Option<Badge>>;

    /// Saves a badge (insert or update)
    async fn save_badge(&self, badge: &Badge) -> anyhow::Result<()>;

    /// Binds `badge` to `employee` in one atomic write.
    ///
    /// `previous` is the employee's former badge, already unbound. Either
    /// every row is written or none is.
    async fn bind_badge(
        &self,
        previous: Option<&Badge>,
        badge: &Badge,
        employee: &Employee,
    ) -> anyhow::Result<()>;

    /// Deletes a badge by its ID
    async fn delete_badge(&self, id: &BadgeId) -> anyhow::Result<()>;

    // --- Employee operations ---

    async fn load_all_employees(&self) -> anyhow::Result<Vec<Employee>>;

    async fn get_employee(&self, id: &EmployeeId) -> anyhow::Result<Option<Employee>>;

    async fn save_employee(&self, employee: &Employee) -> anyhow::Result<()>;

    async fn delete_employee(&self, id: &EmployeeId) -> anyhow::Result<()>;

    // --- Group operations ---

    async fn load_all_groups(&self) -> anyhow::Result<Vec<Group>>;

    async fn get_group(&self, id: &GroupId) -> anyhow::Result<Option<Group>>;

    async fn save_group(&self, group: &Group) -> anyhow::Result<()>;

    /// Deletes a group and every employee's membership in it
    async fn delete_group(&self, id: &GroupId) -> anyhow::Result<()>;

    // --- Resource operations ---

    async fn load_all_resources(&self) -> anyhow::Result<Vec<Resource>>;

    async fn get_resource(&self, id: &ResourceId) -> anyhow::Result<Option<Resource>>;

    async fn save_resource(&self, resource: &Resource) -> anyhow::Result<()>;

    /// Deletes a resource and every group's grant for it
    async fn delete_resource(&self, id: &ResourceId) -> anyhow::Result<()>;

    // --- Audit operations ---

    /// Appends an access log entry and returns its assigned ID
    async fn append_audit_record(&self, entry: &AccessLogEntry) -> anyhow::Result<LogId>;

    /// Loads every access log entry, oldest first
    async fn load_all_audit_records(&self) -> anyhow::Result<Vec<AccessLogEntry>>;

    /// Deletes entries with `timestamp < cutoff` and returns how many were removed
    async fn delete_audit_records_older_than(&self, cutoff: DateTime<Utc>)
        -> anyhow::Result<u64>;
}
