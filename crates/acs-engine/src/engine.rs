//! Access decision engine
//!
//! Evaluates a request against the cached entities with a fixed order of
//! checks. The first failing check determines the reason code, so a
//! request that would fail several checks always reports the earliest.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use acs_audit::AuditSink;
use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, ResourceId},
    AccessLogEntry, AccessRequest, AccessResult, ReasonCode, ResourceState,
};
use acs_core::ports::IEntityLookup;
use chrono::Utc;

/// Converts access requests into verdicts
///
/// `evaluate` never fails and never panics to its caller. Every call
/// produces exactly one audit record, including invalid requests and
/// internal faults.
pub struct DecisionEngine {
    entities: Arc<dyn IEntityLookup>,
    audit: Arc<AuditSink>,
}

impl DecisionEngine {
    /// Creates an engine reading from `entities` and recording to `audit`
    pub fn new(entities: Arc<dyn IEntityLookup>, audit: Arc<AuditSink>) -> Self {
        Self { entities, audit }
    }

    /// Evaluates `request` and records the outcome
    ///
    /// Every lookup of one evaluation goes through a single cache snapshot.
    /// A fault inside evaluation yields `SYSTEM_ERROR`, with the employee
    /// id recorded if it was known before the fault. If the audit record
    /// cannot be persisted, one `SYSTEM_ERROR` record is attempted in its
    /// place and the caller receives a `SYSTEM_ERROR` verdict.
    pub async fn evaluate(&self, request: &AccessRequest) -> AccessResult {
        let mut employee_id = None;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let view = Arc::clone(&self.entities).snapshot();
            decide(view.as_ref(), request, &mut employee_id)
        }));

        let result = match outcome {
            Ok(reason) => AccessResult::from_reason(reason),
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(
                    badge_id = %request.badge_id,
                    resource_id = %request.resource_id,
                    error = %detail,
                    "Access evaluation failed"
                );
                AccessResult::system_error(detail)
            }
        };

        let timestamp = request.timestamp.unwrap_or_else(Utc::now);
        let entry = AccessLogEntry::new(
            timestamp,
            request.badge_id.as_str(),
            employee_id.clone(),
            request.resource_id.as_str(),
            result.reason_code(),
        );

        match self.audit.record(entry).await {
            Ok(_) => {
                tracing::debug!(
                    badge_id = %request.badge_id,
                    resource_id = %request.resource_id,
                    decision = %result.decision(),
                    reason = %result.reason_code(),
                    "Access evaluated"
                );
                result
            }
            Err(e) => {
                let fallback = AccessLogEntry::new(
                    timestamp,
                    request.badge_id.as_str(),
                    employee_id,
                    request.resource_id.as_str(),
                    ReasonCode::SystemError,
                );
                if let Err(retry) = self.audit.record(fallback).await {
                    tracing::error!(
                        badge_id = %request.badge_id,
                        resource_id = %request.resource_id,
                        error = %retry,
                        "Access decision left unaudited"
                    );
                }
                AccessResult::system_error(e)
            }
        }
    }
}

/// Runs the ordered checks; `employee_id` is filled in as soon as the
/// badge's owner is known.
fn decide(
    entities: &dyn IEntityLookup,
    request: &AccessRequest,
    employee_id: &mut Option<EmployeeId>,
) -> ReasonCode {
    // 1. Request validity
    let (Ok(badge_id), Ok(resource_id), Some(_)) = (
        BadgeId::new(request.badge_id.as_str()),
        ResourceId::new(request.resource_id.as_str()),
        request.timestamp,
    ) else {
        return ReasonCode::InvalidRequest;
    };

    // 2. Badge existence
    let Some(badge) = entities.badge(&badge_id) else {
        return ReasonCode::BadgeNotFound;
    };
    *employee_id = badge.employee_id().cloned();

    // 3. Badge status
    if !badge.status().is_active() {
        return ReasonCode::BadgeInactive;
    }

    // 4. Employee linkage
    let Some(employee) = employee_id.as_ref().and_then(|id| entities.employee(id)) else {
        return ReasonCode::EmployeeNotFound;
    };

    // 5. Resource existence
    let Some(resource) = entities.resource(&resource_id) else {
        return ReasonCode::ResourceNotFound;
    };

    // 6. Resource availability
    match resource.state() {
        ResourceState::Available => {}
        ResourceState::Locked => return ReasonCode::ResourceLocked,
        ResourceState::Occupied | ResourceState::Offline => return ReasonCode::ResourceOccupied,
    }

    // 7. Authorization
    let granted = employee
        .group_ids()
        .iter()
        .filter_map(|group_id| entities.group(group_id))
        .any(|group| group.grants(&resource_id));

    if granted {
        ReasonCode::Allow
    } else {
        ReasonCode::NoPermission
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acs_core::domain::{
        newtypes::GroupId, Badge, BadgeStatus, Employee, Group, Resource, ResourceType,
    };
    use chrono::TimeZone;
    use std::collections::HashMap;

    /// Plain map-backed lookup for exercising `decide` in isolation
    #[derive(Default)]
    struct Fixture {
        badges: HashMap<BadgeId, Badge>,
        employees: HashMap<EmployeeId, Employee>,
        groups: HashMap<GroupId, Group>,
        resources: HashMap<ResourceId, Resource>,
    }

    impl IEntityLookup for Fixture {
        fn badge(&self, id: &BadgeId) -> Option<Badge> {
            self.badges.get(id).cloned()
        }
        fn employee(&self, id: &EmployeeId) -> Option<Employee> {
            self.employees.get(id).cloned()
        }
        fn group(&self, id: &GroupId) -> Option<Group> {
            self.groups.get(id).cloned()
        }
        fn resource(&self, id: &ResourceId) -> Option<Resource> {
            self.resources.get(id).cloned()
        }
        fn snapshot(self: Arc<Self>) -> Arc<dyn IEntityLookup> {
            self
        }
    }

    /// Live view that only answers through its pinned snapshot
    struct Pinned(Arc<Fixture>);

    impl IEntityLookup for Pinned {
        fn badge(&self, _: &BadgeId) -> Option<Badge> {
            panic!("badge read outside the snapshot")
        }
        fn employee(&self, _: &EmployeeId) -> Option<Employee> {
            panic!("employee read outside the snapshot")
        }
        fn group(&self, _: &GroupId) -> Option<Group> {
            panic!("group read outside the snapshot")
        }
        fn resource(&self, _: &ResourceId) -> Option<Resource> {
            panic!("resource read outside the snapshot")
        }
        fn snapshot(self: Arc<Self>) -> Arc<dyn IEntityLookup> {
            Arc::clone(&self.0) as Arc<dyn IEntityLookup>
        }
    }

    fn fixture() -> Fixture {
        let mut f = Fixture::default();
        let badge = Badge::new(BadgeId::new("B1").unwrap(), BadgeStatus::Active)
            .with_employee(EmployeeId::new("E1").unwrap());
        let employee = Employee::new(EmployeeId::new("E1").unwrap(), "Ada")
            .with_badge(BadgeId::new("B1").unwrap())
            .with_group(GroupId::new("G1").unwrap());
        let group = Group::new(GroupId::new("G1").unwrap(), "Staff")
            .with_resource(ResourceId::new("R1").unwrap());
        let resource = Resource::new(ResourceId::new("R1").unwrap(), "Door", ResourceType::Door);

        f.badges.insert(badge.id().clone(), badge);
        f.employees.insert(employee.id().clone(), employee);
        f.groups.insert(group.id().clone(), group);
        f.resources.insert(resource.id().clone(), resource);
        f
    }

    fn request(badge: &str, resource: &str) -> AccessRequest {
        AccessRequest::new(
            badge,
            resource,
            Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_allow() {
        let f = fixture();
        let mut employee = None;
        assert_eq!(decide(&f, &request("B1", "R1"), &mut employee), ReasonCode::Allow);
        assert_eq!(employee, Some(EmployeeId::new("E1").unwrap()));
    }

    #[test]
    fn test_invalid_requests() {
        let f = fixture();
        let mut employee = None;
        assert_eq!(
            decide(&f, &request("", "R1"), &mut employee),
            ReasonCode::InvalidRequest
        );
        assert_eq!(
            decide(&f, &request("B1", "   "), &mut employee),
            ReasonCode::InvalidRequest
        );

        let mut missing_ts = request("B1", "R1");
        missing_ts.timestamp = None;
        assert_eq!(
            decide(&f, &missing_ts, &mut employee),
            ReasonCode::InvalidRequest
        );
        assert!(employee.is_none());
    }

    #[test]
    fn test_inactive_badge_keeps_employee() {
        let mut f = fixture();
        if let Some(badge) = f.badges.get_mut(&BadgeId::new("B1").unwrap()) {
            badge.set_status(BadgeStatus::Disabled);
        }
        let mut employee = None;
        assert_eq!(
            decide(&f, &request("B1", "R1"), &mut employee),
            ReasonCode::BadgeInactive
        );
        assert_eq!(employee, Some(EmployeeId::new("E1").unwrap()));
    }

    #[test]
    fn test_unbound_badge_and_dangling_employee() {
        let mut f = fixture();
        f.badges.insert(
            BadgeId::new("B2").unwrap(),
            Badge::new(BadgeId::new("B2").unwrap(), BadgeStatus::Active),
        );
        f.badges.insert(
            BadgeId::new("B3").unwrap(),
            Badge::new(BadgeId::new("B3").unwrap(), BadgeStatus::Active)
                .with_employee(EmployeeId::new("E-GONE").unwrap()),
        );

        let mut employee = None;
        assert_eq!(
            decide(&f, &request("B2", "R1"), &mut employee),
            ReasonCode::EmployeeNotFound
        );
        assert!(employee.is_none());

        assert_eq!(
            decide(&f, &request("B3", "R1"), &mut employee),
            ReasonCode::EmployeeNotFound
        );
        assert_eq!(employee, Some(EmployeeId::new("E-GONE").unwrap()));
    }

    #[test]
    fn test_resource_states() {
        let cases = [
            (ResourceState::Locked, ReasonCode::ResourceLocked),
            (ResourceState::Occupied, ReasonCode::ResourceOccupied),
            (ResourceState::Offline, ReasonCode::ResourceOccupied),
            (ResourceState::Available, ReasonCode::Allow),
        ];
        for (state, expected) in cases {
            let mut f = fixture();
            if let Some(resource) = f.resources.get_mut(&ResourceId::new("R1").unwrap()) {
                resource.set_state(state);
            }
            let mut employee = None;
            assert_eq!(
                decide(&f, &request("B1", "R1"), &mut employee),
                expected,
                "{state}"
            );
        }
    }

    #[test]
    fn test_missing_group_grants_nothing() {
        let mut f = fixture();
        f.groups.clear();
        let mut employee = None;
        assert_eq!(
            decide(&f, &request("B1", "R1"), &mut employee),
            ReasonCode::NoPermission
        );
    }

    #[tokio::test]
    async fn test_evaluate_reads_one_snapshot() {
        let store = Arc::new(acs_store::InMemoryEntityStore::new());
        let cache = Arc::new(acs_cache::LocalEntityCache::new());
        let audit = Arc::new(AuditSink::new(store, cache));
        let engine = DecisionEngine::new(Arc::new(Pinned(Arc::new(fixture()))), audit);

        let result = engine.evaluate(&request("B1", "R1")).await;
        assert_eq!(result.reason_code(), ReasonCode::Allow);
    }

    #[test]
    fn test_panic_detail() {
        let payload = panic::catch_unwind(|| panic!("bucket corrupted")).unwrap_err();
        assert_eq!(panic_detail(payload.as_ref()), "bucket corrupted");

        let payload = panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_detail(payload.as_ref()), "code 7");
    }
}
