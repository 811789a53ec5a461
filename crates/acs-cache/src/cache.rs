//! The shared local entity cache.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, LogId, ResourceId},
    AccessLogEntry, Badge, Employee, Group, Resource,
};
use acs_core::ports::{IEntityLookup, IEntityStore};

use crate::generation::{Generation, LogBuffer};

/// Entry counts per bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub badges: usize,
    pub employees: usize,
    pub groups: usize,
    pub resources: usize,
    pub logs: usize,
}

/// In-memory mirror of the entity store.
///
/// Reads are synchronous, lock-free on the hot path, and never fail: a
/// missing entity is `None`. Mutation hooks are called by the layer that
/// owns the store, and only after the corresponding store write returned
/// successfully.
///
/// Mutations and [`reload_all`](Self::reload_all) are coordinated through
/// a gate: mutations share it, a reload holds it exclusively from the
/// first store read until the new generation is published. A mutation
/// therefore lands either in the generation being replaced before the
/// reload starts reading, or in the freshly published one.
pub struct LocalEntityCache {
    current: RwLock<Arc<Generation>>,
    gate: tokio::sync::RwLock<()>,
}

impl Default for LocalEntityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEntityCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::default())),
            gate: tokio::sync::RwLock::new(()),
        }
    }

    /// Creates a cache populated from `store`
    pub async fn load(store: &dyn IEntityStore) -> anyhow::Result<Self> {
        let cache = Self::new();
        cache.reload_all(store).await?;
        Ok(cache)
    }

    fn generation(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    // --- Reads ---

    pub fn get_badge(&self, id: &BadgeId) -> Option<Badge> {
        self.generation().badge(id)
    }

    pub fn get_employee(&self, id: &EmployeeId) -> Option<Employee> {
        self.generation().employee(id)
    }

    pub fn get_group(&self, id: &GroupId) -> Option<Group> {
        self.generation().group(id)
    }

    pub fn get_resource(&self, id: &ResourceId) -> Option<Resource> {
        self.generation().resource(id)
    }

    /// Point-in-time copy of the log buffer, oldest first
    pub fn list_logs(&self) -> Vec<AccessLogEntry> {
        self.generation().logs().snapshot()
    }

    pub fn log_count(&self) -> usize {
        self.generation().logs().len()
    }

    pub fn stats(&self) -> CacheStats {
        let generation = self.generation();
        CacheStats {
            badges: generation.badges.len(),
            employees: generation.employees.len(),
            groups: generation.groups.len(),
            resources: generation.resources.len(),
            logs: generation.logs().len(),
        }
    }

    // --- Mutation hooks ---

    pub async fn put_badge(&self, badge: Badge) {
        let _gate = self.gate.read().await;
        self.generation().badges.insert(badge.id().clone(), badge);
    }

    pub async fn put_employee(&self, employee: Employee) {
        let _gate = self.gate.read().await;
        self.generation()
            .employees
            .insert(employee.id().clone(), employee);
    }

    pub async fn put_group(&self, group: Group) {
        let _gate = self.gate.read().await;
        self.generation().groups.insert(group.id().clone(), group);
    }

    pub async fn put_resource(&self, resource: Resource) {
        let _gate = self.gate.read().await;
        self.generation()
            .resources
            .insert(resource.id().clone(), resource);
    }

    pub async fn remove_badge(&self, id: &BadgeId) {
        let _gate = self.gate.read().await;
        self.generation().badges.remove(id);
    }

    pub async fn remove_employee(&self, id: &EmployeeId) {
        let _gate = self.gate.read().await;
        self.generation().employees.remove(id);
    }

    /// Evicts a group; employees that belonged to it lose the membership.
    pub async fn remove_group(&self, id: &GroupId) {
        let _gate = self.gate.read().await;
        self.generation().remove_group(id);
    }

    /// Evicts a resource; groups that granted it lose the grant.
    pub async fn remove_resource(&self, id: &ResourceId) {
        let _gate = self.gate.read().await;
        self.generation().remove_resource(id);
    }

    /// Adds a persisted log entry to the buffer.
    ///
    /// Any buffered entry with the same id is replaced. Entries that were
    /// never persisted (no id) are ignored.
    pub async fn append_log(&self, entry: AccessLogEntry) {
        if entry.id().is_none() {
            tracing::warn!(
                badge_id = entry.badge_id(),
                resource_id = entry.resource_id(),
                "Ignoring log entry without a store-assigned id"
            );
            return;
        }

        let _gate = self.gate.read().await;
        self.generation().logs().insert(entry);
    }

    /// Drops the buffered entry with `id`, if any
    pub async fn remove_log(&self, id: LogId) -> bool {
        let _gate = self.gate.read().await;
        self.generation().logs().remove(id)
    }

    /// Drops buffered entries with `timestamp < cutoff`
    pub async fn expire_logs_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let _gate = self.gate.read().await;
        let removed = self.generation().logs().expire_older_than(cutoff);
        tracing::debug!(%cutoff, removed, "Expired cached log entries");
        removed
    }

    // --- Reload ---

    /// Replaces the whole cache with the current store content.
    ///
    /// On error the previous generation stays in place untouched.
    pub async fn reload_all(&self, store: &dyn IEntityStore) -> anyhow::Result<()> {
        let _gate = self.gate.write().await;

        let fresh = Self::build_generation(store).await?;
        let stats = CacheStats {
            badges: fresh.badges.len(),
            employees: fresh.employees.len(),
            groups: fresh.groups.len(),
            resources: fresh.resources.len(),
            logs: fresh.logs().len(),
        };

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);

        tracing::info!(
            badges = stats.badges,
            employees = stats.employees,
            groups = stats.groups,
            resources = stats.resources,
            logs = stats.logs,
            "Entity cache reloaded"
        );
        Ok(())
    }

    async fn build_generation(store: &dyn IEntityStore) -> anyhow::Result<Generation> {
        let badges = store.load_all_badges().await?;
        let employees = store.load_all_employees().await?;
        let groups = store.load_all_groups().await?;
        let resources = store.load_all_resources().await?;
        let logs = store.load_all_audit_records().await?;

        let mut generation = Generation::default();
        for badge in badges {
            generation.badges.insert(badge.id().clone(), badge);
        }
        for employee in employees {
            generation.employees.insert(employee.id().clone(), employee);
        }
        for group in groups {
            generation.groups.insert(group.id().clone(), group);
        }
        for resource in resources {
            generation.resources.insert(resource.id().clone(), resource);
        }
        generation.set_logs(LogBuffer::from_entries(logs));

        Ok(generation)
    }
}

impl IEntityLookup for LocalEntityCache {
    fn badge(&self, id: &BadgeId) -> Option<Badge> {
        self.get_badge(id)
    }

    fn employee(&self, id: &EmployeeId) -> Option<Employee> {
        self.get_employee(id)
    }

    fn group(&self, id: &GroupId) -> Option<Group> {
        self.get_group(id)
    }

    fn resource(&self, id: &ResourceId) -> Option<Resource> {
        self.get_resource(id)
    }

    /// Pins the current generation; a concurrent reload does not affect it.
    fn snapshot(self: Arc<Self>) -> Arc<dyn IEntityLookup> {
        self.generation()
    }
}

#[cfg(test)]
mod tests {
    use acs_core::domain::{newtypes::LogId, BadgeStatus, ReasonCode, ResourceState, ResourceType};
    use chrono::Duration;

    use super::*;

    fn badge(id: &str, status: BadgeStatus) -> Badge {
        Badge::new(BadgeId::new(id).unwrap(), status)
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let cache = LocalEntityCache::new();
        assert!(cache.get_badge(&BadgeId::new("B1").unwrap()).is_none());
        assert!(cache.get_resource(&ResourceId::new("R1").unwrap()).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_put_is_last_writer_wins() {
        let cache = LocalEntityCache::new();
        cache.put_badge(badge("B1", BadgeStatus::Active)).await;
        cache.put_badge(badge("B1", BadgeStatus::Lost)).await;

        let id = BadgeId::new("B1").unwrap();
        assert_eq!(cache.get_badge(&id).unwrap().status(), BadgeStatus::Lost);
        assert_eq!(cache.stats().badges, 1);
    }

    #[tokio::test]
    async fn test_remove_evicts() {
        let cache = LocalEntityCache::new();
        let id = ResourceId::new("R1").unwrap();
        let resource = Resource::new(id.clone(), "Lab", ResourceType::Room)
            .with_state(ResourceState::Locked);
        cache.put_resource(resource).await;
        assert!(cache.get_resource(&id).is_some());

        cache.remove_resource(&id).await;
        assert!(cache.get_resource(&id).is_none());
        // Removing again is harmless
        cache.remove_resource(&id).await;
    }

    #[tokio::test]
    async fn test_remove_resource_drops_grants() {
        let cache = LocalEntityCache::new();
        let r1 = ResourceId::new("R1").unwrap();
        let group_id = GroupId::new("G1").unwrap();
        cache
            .put_resource(Resource::new(r1.clone(), "Door", ResourceType::Door))
            .await;
        cache
            .put_group(Group::new(group_id.clone(), "Staff").with_resource(r1.clone()))
            .await;

        cache.remove_resource(&r1).await;

        assert!(!cache.get_group(&group_id).unwrap().grants(&r1));

        // Registering the id again does not revive the old grant
        cache
            .put_resource(Resource::new(r1.clone(), "Door", ResourceType::Door))
            .await;
        assert!(!cache.get_group(&group_id).unwrap().grants(&r1));
    }

    #[tokio::test]
    async fn test_remove_group_drops_memberships() {
        let cache = LocalEntityCache::new();
        let group_id = GroupId::new("G1").unwrap();
        let employee_id = EmployeeId::new("E1").unwrap();
        cache.put_group(Group::new(group_id.clone(), "Staff")).await;
        cache
            .put_employee(Employee::new(employee_id.clone(), "Ada").with_group(group_id.clone()))
            .await;

        cache.remove_group(&group_id).await;

        assert!(cache.get_group(&group_id).is_none());
        assert!(!cache.get_employee(&employee_id).unwrap().is_member_of(&group_id));
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let cache = Arc::new(LocalEntityCache::new());
        cache.put_badge(badge("B1", BadgeStatus::Active)).await;

        let pinned = Arc::clone(&cache).snapshot();
        let empty = acs_store::InMemoryEntityStore::new();
        cache.reload_all(&empty).await.unwrap();

        let id = BadgeId::new("B1").unwrap();
        assert!(cache.get_badge(&id).is_none());
        assert!(pinned.badge(&id).is_some());
    }

    #[tokio::test]
    async fn test_append_log_without_id_is_ignored() {
        let cache = LocalEntityCache::new();
        let entry = AccessLogEntry::new(Utc::now(), "B1", None, "R1", ReasonCode::BadgeNotFound);
        cache.append_log(entry).await;
        assert_eq!(cache.log_count(), 0);
    }

    #[tokio::test]
    async fn test_list_logs_is_a_snapshot() {
        let cache = LocalEntityCache::new();
        let now = Utc::now();
        let entry = AccessLogEntry::new(now, "B1", None, "R1", ReasonCode::NoPermission)
            .with_id(LogId::new(1));
        cache.append_log(entry).await;

        let snapshot = cache.list_logs();
        cache.expire_logs_older_than(now + Duration::seconds(1)).await;

        assert_eq!(snapshot.len(), 1);
        assert!(cache.list_logs().is_empty());
    }

    #[tokio::test]
    async fn test_remove_log_keeps_others() {
        let cache = LocalEntityCache::new();
        let now = Utc::now();
        for id in 1..=3 {
            let entry = AccessLogEntry::new(now, "B1", None, "R1", ReasonCode::NoPermission)
                .with_id(LogId::new(id));
            cache.append_log(entry).await;
        }

        assert!(cache.remove_log(LogId::new(2)).await);
        assert!(!cache.remove_log(LogId::new(2)).await);

        let left: Vec<_> = cache.list_logs().iter().filter_map(|e| e.id()).collect();
        assert_eq!(left, vec![LogId::new(1), LogId::new(3)]);
    }
}
