//! In-memory implementation of IEntityStore
//!
//! Keeps every entity in process memory. Nothing survives a restart, which
//! makes it suitable for tests, demos and the `memory` store backend.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};

use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, LogId, ResourceId},
    AccessLogEntry, Badge, Employee, Group, Resource,
};
use acs_core::ports::IEntityStore;

use crate::StoreError;

#[derive(Default)]
struct AuditTable {
    next_id: i64,
    entries: Vec<AccessLogEntry>,
}

/// Ephemeral entity store backed by hash maps
#[derive(Default)]
pub struct InMemoryEntityStore {
    badges: RwLock<HashMap<BadgeId, Badge>>,
    employees: RwLock<HashMap<EmployeeId, Employee>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    resources: RwLock<HashMap<ResourceId, Resource>>,
    audit: Mutex<AuditTable>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(table: &'static str) -> impl FnOnce(T) -> StoreError {
    move |_| StoreError::LockPoisoned(table)
}

/// Sorted snapshot of a table, ordered by entity id
fn sorted_values<K: Ord, V: Clone>(map: &HashMap<K, V>) -> Vec<V> {
    let mut pairs: Vec<_> = map.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs.into_iter().map(|(_, v)| v.clone()).collect()
}

#[async_trait::async_trait]
impl IEntityStore for InMemoryEntityStore {
    // --- Badge operations ---

    async fn load_all_badges(&self) -> anyhow::Result<Vec<Badge>> {
        let badges = self.badges.read().map_err(poisoned("badges"))?;
        Ok(sorted_values(&badges))
    }

    async fn get_badge(&self, id: &BadgeId) -> anyhow::Result<Option<Badge>> {
        let badges = self.badges.read().map_err(poisoned("badges"))?;
        Ok(badges.get(id).cloned())
    }

    async fn save_badge(&self, badge: &Badge) -> anyhow::Result<()> {
        let mut badges = self.badges.write().map_err(poisoned("badges"))?;
        badges.insert(badge.id().clone(), badge.clone());
        Ok(())
    }

    async fn bind_badge(
        &self,
        previous: Option<&Badge>,
        badge: &Badge,
        employee: &Employee,
    ) -> anyhow::Result<()> {
        let mut badges = self.badges.write().map_err(poisoned("badges"))?;
        let mut employees = self.employees.write().map_err(poisoned("employees"))?;

        if let Some(old) = previous {
            badges.insert(old.id().clone(), old.clone());
        }
        badges.insert(badge.id().clone(), badge.clone());
        employees.insert(employee.id().clone(), employee.clone());
        Ok(())
    }

    async fn delete_badge(&self, id: &BadgeId) -> anyhow::Result<()> {
        let mut badges = self.badges.write().map_err(poisoned("badges"))?;
        badges.remove(id);
        Ok(())
    }

    // --- Employee operations ---

    async fn load_all_employees(&self) -> anyhow::Result<Vec<Employee>> {
        let employees = self.employees.read().map_err(poisoned("employees"))?;
        Ok(sorted_values(&employees))
    }

    async fn get_employee(&self, id: &EmployeeId) -> anyhow::Result<Option<Employee>> {
        let employees = self.employees.read().map_err(poisoned("employees"))?;
        Ok(employees.get(id).cloned())
    }

    async fn save_employee(&self, employee: &Employee) -> anyhow::Result<()> {
        let mut employees = self.employees.write().map_err(poisoned("employees"))?;
        employees.insert(employee.id().clone(), employee.clone());
        Ok(())
    }

    async fn delete_employee(&self, id: &EmployeeId) -> anyhow::Result<()> {
        let mut employees = self.employees.write().map_err(poisoned("employees"))?;
        employees.remove(id);
        Ok(())
    }

    // --- Group operations ---

    async fn load_all_groups(&self) -> anyhow::Result<Vec<Group>> {
        let groups = self.groups.read().map_err(poisoned("groups"))?;
        Ok(sorted_values(&groups))
    }

    async fn get_group(&self, id: &GroupId) -> anyhow::Result<Option<Group>> {
        let groups = self.groups.read().map_err(poisoned("groups"))?;
        Ok(groups.get(id).cloned())
    }

    async fn save_group(&self, group: &Group) -> anyhow::Result<()> {
        let mut groups = self.groups.write().map_err(poisoned("groups"))?;
        groups.insert(group.id().clone(), group.clone());
        Ok(())
    }

    async fn delete_group(&self, id: &GroupId) -> anyhow::Result<()> {
        let mut groups = self.groups.write().map_err(poisoned("groups"))?;
        let mut employees = self.employees.write().map_err(poisoned("employees"))?;
        groups.remove(id);
        for employee in employees.values_mut() {
            employee.leave_group(id);
        }
        Ok(())
    }

    // --- Resource operations ---

    async fn load_all_resources(&self) -> anyhow::Result<Vec<Resource>> {
        let resources = self.resources.read().map_err(poisoned("resources"))?;
        Ok(sorted_values(&resources))
    }

    async fn get_resource(&self, id: &ResourceId) -> anyhow::Result<Option<Resource>> {
        let resources = self.resources.read().map_err(poisoned("resources"))?;
        Ok(resources.get(id).cloned())
    }

    async fn save_resource(&self, resource: &Resource) -> anyhow::Result<()> {
        let mut resources = self.resources.write().map_err(poisoned("resources"))?;
        resources.insert(resource.id().clone(), resource.clone());
        Ok(())
    }

    async fn delete_resource(&self, id: &ResourceId) -> anyhow::Result<()> {
        let mut groups = self.groups.write().map_err(poisoned("groups"))?;
        let mut resources = self.resources.write().map_err(poisoned("resources"))?;
        resources.remove(id);
        for group in groups.values_mut() {
            group.revoke(id);
        }
        Ok(())
    }

    // --- Audit operations ---

    async fn append_audit_record(&self, entry: &AccessLogEntry) -> anyhow::Result<LogId> {
        let mut audit = self.audit.lock().map_err(poisoned("access_log"))?;
        audit.next_id += 1;
        let id = LogId::new(audit.next_id);
        audit.entries.push(entry.clone().with_id(id));

        tracing::trace!(log_id = %id, reason = %entry.reason_code(), "Appended audit record");
        Ok(id)
    }

    async fn load_all_audit_records(&self) -> anyhow::Result<Vec<AccessLogEntry>> {
        let audit = self.audit.lock().map_err(poisoned("access_log"))?;
        let mut entries = audit.entries.clone();
        entries.sort_by_key(|e| (e.timestamp(), e.id()));
        Ok(entries)
    }

    async fn delete_audit_records_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let mut audit = self.audit.lock().map_err(poisoned("access_log"))?;
        let before = audit.entries.len();
        audit.entries.retain(|e| !e.is_older_than(cutoff));
        let deleted = (before - audit.entries.len()) as u64;

        tracing::debug!(%cutoff, deleted, "Deleted expired audit records");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use acs_core::domain::{BadgeStatus, ReasonCode, ResourceType};
    use chrono::Duration;

    use super::*;

    fn badge(id: &str) -> Badge {
        Badge::new(BadgeId::new(id).unwrap(), BadgeStatus::Active)
    }

    #[tokio::test]
    async fn test_save_and_get_badge() {
        let store = InMemoryEntityStore::new();
        let b = badge("B1").with_employee(EmployeeId::new("E1").unwrap());
        store.save_badge(&b).await.unwrap();

        let loaded = store.get_badge(b.id()).await.unwrap().unwrap();
        assert_eq!(loaded, b);
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let store = InMemoryEntityStore::new();
        let mut b = badge("B1");
        store.save_badge(&b).await.unwrap();
        b.set_status(BadgeStatus::Lost);
        store.save_badge(&b).await.unwrap();

        let all = store.load_all_badges().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status(), BadgeStatus::Lost);
    }

    #[tokio::test]
    async fn test_delete_resource_drops_grants() {
        let store = InMemoryEntityStore::new();
        let r1 = ResourceId::new("R1").unwrap();
        let r2 = ResourceId::new("R2").unwrap();
        let group = Group::new(GroupId::new("G1").unwrap(), "Staff")
            .with_resource(r1.clone())
            .with_resource(r2.clone());
        store
            .save_resource(&Resource::new(r1.clone(), "Door", ResourceType::Door))
            .await
            .unwrap();
        store.save_group(&group).await.unwrap();

        store.delete_resource(&r1).await.unwrap();

        let group = store.get_group(group.id()).await.unwrap().unwrap();
        assert!(!group.grants(&r1));
        assert!(group.grants(&r2));
    }

    #[tokio::test]
    async fn test_delete_group_drops_memberships() {
        let store = InMemoryEntityStore::new();
        let g1 = GroupId::new("G1").unwrap();
        let employee = Employee::new(EmployeeId::new("E1").unwrap(), "Ada").with_group(g1.clone());
        store.save_group(&Group::new(g1.clone(), "Staff")).await.unwrap();
        store.save_employee(&employee).await.unwrap();

        store.delete_group(&g1).await.unwrap();

        let employee = store.get_employee(employee.id()).await.unwrap().unwrap();
        assert!(employee.group_ids().is_empty());
    }

    #[tokio::test]
    async fn test_bind_badge_writes_both_sides() {
        let store = InMemoryEntityStore::new();
        let old = badge("B1");
        let new = badge("B2").with_employee(EmployeeId::new("E1").unwrap());
        let employee =
            Employee::new(EmployeeId::new("E1").unwrap(), "Ada").with_badge(new.id().clone());

        store.bind_badge(Some(&old), &new, &employee).await.unwrap();

        assert_eq!(store.load_all_badges().await.unwrap(), vec![old, new]);
        assert_eq!(store.get_employee(employee.id()).await.unwrap(), Some(employee));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_ok() {
        let store = InMemoryEntityStore::new();
        let id = ResourceId::new("R404").unwrap();
        store.delete_resource(&id).await.unwrap();
        assert!(store.get_resource(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_all_sorted_by_id() {
        let store = InMemoryEntityStore::new();
        for id in ["R3", "R1", "R2"] {
            let r = Resource::new(ResourceId::new(id).unwrap(), id, ResourceType::Door);
            store.save_resource(&r).await.unwrap();
        }
        let ids: Vec<_> = store
            .load_all_resources()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
    }

    #[tokio::test]
    async fn test_audit_ids_increase_and_load_is_ordered() {
        let store = InMemoryEntityStore::new();
        let now = Utc::now();

        let late = AccessLogEntry::new(now, "B1", None, "R1", ReasonCode::BadgeNotFound);
        let early = AccessLogEntry::new(
            now - Duration::hours(1),
            "B2",
            None,
            "R1",
            ReasonCode::BadgeNotFound,
        );
        let id1 = store.append_audit_record(&late).await.unwrap();
        let id2 = store.append_audit_record(&early).await.unwrap();
        assert!(id2 > id1);

        let all = store.load_all_audit_records().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].badge_id(), "B2");
        assert_eq!(all[0].id(), Some(id2));
        assert_eq!(all[1].id(), Some(id1));
    }

    #[tokio::test]
    async fn test_delete_audit_records_older_than() {
        let store = InMemoryEntityStore::new();
        let now = Utc::now();
        for days in 0..5 {
            let entry = AccessLogEntry::new(
                now - Duration::days(days),
                "B1",
                None,
                "R1",
                ReasonCode::NoPermission,
            );
            store.append_audit_record(&entry).await.unwrap();
        }

        let deleted = store
            .delete_audit_records_older_than(now - Duration::days(2))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.load_all_audit_records().await.unwrap().len(), 3);

        let again = store
            .delete_audit_records_older_than(now - Duration::days(2))
            .await
            .unwrap();
        assert_eq!(again, 0);
    }
}
