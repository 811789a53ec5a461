//! Integration tests for LocalEntityCache
//!
//! Cover loading from a store, concurrent log appends and the
//! interaction between mutation hooks and full reloads.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use acs_cache::LocalEntityCache;
use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, ResourceId},
    AccessLogEntry, Badge, BadgeStatus, Employee, Group, ReasonCode, Resource, ResourceState,
    ResourceType,
};
use acs_core::ports::IEntityStore;
use acs_store::{DatabasePool, InMemoryEntityStore, SqliteEntityStore};

// ============================================================================
// Test helpers
// ============================================================================

async fn seeded_store() -> Arc<InMemoryEntityStore> {
    let store = Arc::new(InMemoryEntityStore::new());

    let badge = Badge::new(BadgeId::new("B001").unwrap(), BadgeStatus::Active)
        .with_employee(EmployeeId::new("E001").unwrap());
    let employee = Employee::new(EmployeeId::new("E001").unwrap(), "Ada")
        .with_badge(BadgeId::new("B001").unwrap())
        .with_group(GroupId::new("G-ENG").unwrap());
    let group = Group::new(GroupId::new("G-ENG").unwrap(), "Engineering")
        .with_resource(ResourceId::new("R-LAB").unwrap());
    let resource = Resource::new(ResourceId::new("R-LAB").unwrap(), "Lab", ResourceType::Room);

    store.save_badge(&badge).await.unwrap();
    store.save_employee(&employee).await.unwrap();
    store.save_group(&group).await.unwrap();
    store.save_resource(&resource).await.unwrap();

    let now = Utc::now();
    for minutes in [3, 1, 2] {
        let entry = AccessLogEntry::new(
            now - Duration::minutes(minutes),
            "B001",
            None,
            "R-LAB",
            ReasonCode::NoPermission,
        );
        store.append_audit_record(&entry).await.unwrap();
    }

    store
}

fn assert_sorted(entries: &[AccessLogEntry]) {
    for pair in entries.windows(2) {
        assert!(
            pair[0].timestamp() <= pair[1].timestamp(),
            "log buffer out of order: {:?} after {:?}",
            pair[1].timestamp(),
            pair[0].timestamp()
        );
    }
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_load_mirrors_store() {
    let store = seeded_store().await;
    let cache = LocalEntityCache::load(store.as_ref()).await.unwrap();

    let stats = cache.stats();
    assert_eq!(stats.badges, 1);
    assert_eq!(stats.employees, 1);
    assert_eq!(stats.groups, 1);
    assert_eq!(stats.resources, 1);
    assert_eq!(stats.logs, 3);

    let employee = cache.get_employee(&EmployeeId::new("E001").unwrap()).unwrap();
    assert!(employee.is_member_of(&GroupId::new("G-ENG").unwrap()));
    assert_sorted(&cache.list_logs());
}

#[tokio::test]
async fn test_reload_replaces_everything() {
    let store = seeded_store().await;
    let cache = LocalEntityCache::load(store.as_ref()).await.unwrap();

    // Cache-only entity, never written to the store
    let ghost = Badge::new(BadgeId::new("B-GHOST").unwrap(), BadgeStatus::Active);
    cache.put_badge(ghost).await;
    assert!(cache.get_badge(&BadgeId::new("B-GHOST").unwrap()).is_some());

    store
        .delete_resource(&ResourceId::new("R-LAB").unwrap())
        .await
        .unwrap();
    cache.reload_all(store.as_ref()).await.unwrap();

    assert!(cache.get_badge(&BadgeId::new("B-GHOST").unwrap()).is_none());
    assert!(cache.get_resource(&ResourceId::new("R-LAB").unwrap()).is_none());
    assert!(cache.get_badge(&BadgeId::new("B001").unwrap()).is_some());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_stay_sorted() {
    let store = Arc::new(InMemoryEntityStore::new());
    let cache = Arc::new(LocalEntityCache::new());
    let base = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();

    let mut handles = Vec::new();
    for task in 0..8i64 {
        let store = Arc::clone(&store);
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..50i64 {
                // Scatter timestamps so tasks interleave out of order
                let offset = (i * 37 + task * 11) % 500;
                let entry = AccessLogEntry::new(
                    base + Duration::seconds(offset),
                    format!("B{task}"),
                    None,
                    "R1",
                    ReasonCode::BadgeNotFound,
                );
                let id = store.append_audit_record(&entry).await.unwrap();
                cache.append_log(entry.with_id(id)).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let logs = cache.list_logs();
    assert_eq!(logs.len(), 400);
    assert_sorted(&logs);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_block_on_writers() {
    let store = seeded_store().await;
    let cache = Arc::new(LocalEntityCache::load(store.as_ref()).await.unwrap());
    let badge_id = BadgeId::new("B001").unwrap();

    let writer = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            for i in 0..200 {
                let status = if i % 2 == 0 {
                    BadgeStatus::Disabled
                } else {
                    BadgeStatus::Active
                };
                cache
                    .put_badge(Badge::new(BadgeId::new("B001").unwrap(), status))
                    .await;
            }
        })
    };

    for _ in 0..200 {
        // Always present: a put replaces, it never removes
        assert!(cache.get_badge(&badge_id).is_some());
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
}

/// Writers follow the store-then-cache protocol while reloads run
/// concurrently. Once everything settles, the cache must equal the store.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reload_interleaved_with_mutations_stays_coherent() {
    let store = seeded_store().await;
    let cache = Arc::new(LocalEntityCache::load(store.as_ref()).await.unwrap());

    let mut handles = Vec::new();
    for task in 0..4 {
        let store = Arc::clone(&store);
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..40 {
                let id = ResourceId::new(format!("R-{task}-{}", i % 5)).unwrap();
                if i % 3 == 2 {
                    store.delete_resource(&id).await.unwrap();
                    cache.remove_resource(&id).await;
                } else {
                    let state = if i % 2 == 0 {
                        ResourceState::Available
                    } else {
                        ResourceState::Locked
                    };
                    let resource =
                        Resource::new(id, "Door", ResourceType::Door).with_state(state);
                    store.save_resource(&resource).await.unwrap();
                    cache.put_resource(resource).await;
                }
            }
        }));
    }

    let reloader = {
        let store = Arc::clone(&store);
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            for _ in 0..20 {
                cache.reload_all(store.as_ref()).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    reloader.await.unwrap();

    let stored = store.load_all_resources().await.unwrap();
    assert_eq!(cache.stats().resources, stored.len());
    for resource in &stored {
        assert_eq!(cache.get_resource(resource.id()).as_ref(), Some(resource));
    }
}

/// Same protocol with groups, employees and hard deletes, checked against
/// SQLite and the in-memory store side by side.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deletes_keep_groups_and_employees_coherent() {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let stores = vec![
        Arc::new(SqliteEntityStore::new(pool.pool().clone())) as Arc<dyn IEntityStore>,
        seeded_store().await as Arc<dyn IEntityStore>,
    ];

    for store in stores {
        let group_id = GroupId::new("G-ENG").unwrap();
        let lab = ResourceId::new("R-LAB").unwrap();
        let employee_id = EmployeeId::new("E001").unwrap();

        let group = Group::new(group_id.clone(), "Engineering").with_resource(lab.clone());
        let employee = Employee::new(employee_id.clone(), "Ada").with_group(group_id.clone());
        store
            .save_resource(&Resource::new(lab.clone(), "Lab", ResourceType::Room))
            .await
            .unwrap();
        store.save_group(&group).await.unwrap();
        store.save_employee(&employee).await.unwrap();

        let cache = Arc::new(LocalEntityCache::load(store.as_ref()).await.unwrap());

        // Each task owns one group, so its read-modify-write never races
        let mut handles = Vec::new();
        for task in 0..4 {
            let store = Arc::clone(&store);
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let own_group = GroupId::new(format!("G-{task}")).unwrap();
                let fresh = Group::new(own_group.clone(), "Task");
                store.save_group(&fresh).await.unwrap();
                cache.put_group(fresh).await;

                for i in 0..30 {
                    let id = ResourceId::new(format!("R-{task}-{}", i % 3)).unwrap();
                    match i % 3 {
                        0 => {
                            let resource = Resource::new(id, "Door", ResourceType::Door);
                            store.save_resource(&resource).await.unwrap();
                            cache.put_resource(resource).await;
                        }
                        1 => {
                            let mut group = store.get_group(&own_group).await.unwrap().unwrap();
                            group.grant(id);
                            store.save_group(&group).await.unwrap();
                            cache.put_group(group).await;
                        }
                        _ => {
                            store.delete_resource(&id).await.unwrap();
                            cache.remove_resource(&id).await;
                        }
                    }
                }
            }));
        }

        let reloader = {
            let store = Arc::clone(&store);
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for _ in 0..10 {
                    cache.reload_all(store.as_ref()).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for handle in handles {
            handle.await.unwrap();
        }
        reloader.await.unwrap();

        // Hard deletes of a granted resource and of a populated group
        store.delete_resource(&lab).await.unwrap();
        cache.remove_resource(&lab).await;
        assert_eq!(
            cache.get_group(&group_id),
            store.get_group(&group_id).await.unwrap()
        );
        assert!(!cache.get_group(&group_id).unwrap().grants(&lab));

        store.delete_group(&group_id).await.unwrap();
        cache.remove_group(&group_id).await;
        assert_eq!(
            cache.get_employee(&employee_id),
            store.get_employee(&employee_id).await.unwrap()
        );

        // Re-registering the resource does not resurrect the old grant
        let again = Resource::new(lab.clone(), "Lab", ResourceType::Room);
        store.save_resource(&again).await.unwrap();
        cache.put_resource(again).await;

        for stored in store.load_all_groups().await.unwrap() {
            assert_eq!(cache.get_group(stored.id()).as_ref(), Some(&stored));
        }
        for stored in store.load_all_employees().await.unwrap() {
            assert_eq!(cache.get_employee(stored.id()).as_ref(), Some(&stored));
        }
        let resources = store.load_all_resources().await.unwrap();
        assert_eq!(cache.stats().resources, resources.len());
        assert_eq!(cache.stats().groups, store.load_all_groups().await.unwrap().len());
    }
}
