//! One self-consistent snapshot of cached state.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, LogId, ResourceId},
    AccessLogEntry, Badge, Employee, Group, Resource,
};
use acs_core::ports::IEntityLookup;

/// Entity buckets plus the log buffer.
///
/// A generation is mutated in place by the cache hooks and replaced
/// wholesale by a reload.
#[derive(Default)]
pub(crate) struct Generation {
    pub(crate) badges: DashMap<BadgeId, Badge>,
    pub(crate) employees: DashMap<EmployeeId, Employee>,
    pub(crate) groups: DashMap<GroupId, Group>,
    pub(crate) resources: DashMap<ResourceId, Resource>,
    logs: LogBuffer,
}

impl Generation {
    pub(crate) fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub(crate) fn set_logs(&mut self, logs: LogBuffer) {
        self.logs = logs;
    }

    /// Evicts a group and drops it from every member's group set.
    pub(crate) fn remove_group(&self, id: &GroupId) {
        self.groups.remove(id);
        for mut employee in self.employees.iter_mut() {
            employee.leave_group(id);
        }
    }

    /// Evicts a resource and drops it from every group's grants.
    pub(crate) fn remove_resource(&self, id: &ResourceId) {
        self.resources.remove(id);
        for mut group in self.groups.iter_mut() {
            group.revoke(id);
        }
    }
}

impl IEntityLookup for Generation {
    fn badge(&self, id: &BadgeId) -> Option<Badge> {
        self.badges.get(id).map(|r| r.value().clone())
    }

    fn employee(&self, id: &EmployeeId) -> Option<Employee> {
        self.employees.get(id).map(|r| r.value().clone())
    }

    fn group(&self, id: &GroupId) -> Option<Group> {
        self.groups.get(id).map(|r| r.value().clone())
    }

    fn resource(&self, id: &ResourceId) -> Option<Resource> {
        self.resources.get(id).map(|r| r.value().clone())
    }

    fn snapshot(self: Arc<Self>) -> Arc<dyn IEntityLookup> {
        self
    }
}

/// Access log entries kept in non-decreasing timestamp order.
///
/// All writes go through the exclusive lock, so concurrent appends are
/// linearized. Poisoning is ignored: every write leaves the `Vec` sorted.
#[derive(Default)]
pub(crate) struct LogBuffer {
    entries: RwLock<Vec<AccessLogEntry>>,
}

impl LogBuffer {
    /// Builds a buffer from already-loaded entries.
    pub(crate) fn from_entries(mut entries: Vec<AccessLogEntry>) -> Self {
        // Stable sort keeps store order (id) among equal timestamps
        entries.sort_by_key(|e| e.timestamp());
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Inserts `entry` after every entry with an equal or earlier timestamp,
    /// replacing any previous entry carrying the same id.
    pub(crate) fn insert(&self, entry: AccessLogEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = entry.id() {
            entries.retain(|e| e.id() != Some(id));
        }
        let ts = entry.timestamp();
        let at = entries.partition_point(|e| e.timestamp() <= ts);
        entries.insert(at, entry);
    }

    pub(crate) fn snapshot(&self) -> Vec<AccessLogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops every entry with `timestamp < cutoff`; returns how many went.
    pub(crate) fn expire_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Sorted, so expired entries form a prefix
        let expired = entries.partition_point(|e| e.is_older_than(cutoff));
        entries.drain(..expired);
        expired
    }

    /// Drops the entry carrying `id`; returns whether one was buffered.
    pub(crate) fn remove(&self, id: LogId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.id() != Some(id));
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
